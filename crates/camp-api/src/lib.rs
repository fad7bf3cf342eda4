//! Basecamp API client
//!
//! Thin async wrapper over the Basecamp 3 REST API. Every call resolves to an
//! [`ApiResponse`] instead of an `Err`, so callers can branch on transport
//! failures and HTTP status alike.

pub mod client;
pub mod endpoints;
pub mod response;
pub mod url;

pub use client::{BasecampClient, API_BASE, DEFAULT_USER_AGENT};
pub use endpoints::{CardUpdate, NewCard, NewTodo, ProjectStatus, TodoUpdate};
pub use response::{ApiError, ApiResponse};
pub use url::{parse_url, ParsedUrl, UrlKind};
