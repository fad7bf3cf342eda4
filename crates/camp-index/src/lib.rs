//! Project structure index
//!
//! Local mirror of Basecamp projects → card tables → columns so column lookups
//! don't need an API round-trip. The index is owned by an [`IndexManager`],
//! loaded lazily from a single JSON file and rewritten in full after every
//! rebuild or per-project refresh.
//!
//! The file is assumed to have a single writer. Two processes sharing one
//! index path will race on save and the last writer wins.

pub mod error;
pub mod manager;
pub mod model;
pub mod remote;
pub mod report;
pub mod source;
pub mod store;

pub use error::IndexError;
pub use manager::{IndexManager, PAGE_SIZE};
pub use model::{CardTable, Column, Index, IndexStats, ProjectEntry, INDEX_VERSION};
pub use report::{ProjectOutcome, RebuildReport, RefreshOutcome, Skip};
pub use source::ProjectSource;
