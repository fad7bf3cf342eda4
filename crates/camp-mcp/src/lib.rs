//! camp-bridge MCP Server
//!
//! Exposes Basecamp projects, card tables, todos and a local project index to
//! AI assistants via the Model Context Protocol (MCP) over stdio.

pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;

pub use handler::Router;
pub use server::McpServer;
