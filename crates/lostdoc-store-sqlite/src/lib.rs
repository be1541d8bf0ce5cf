//! SQLite backend for the lost-document registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod resident;
mod schema;
mod sequence;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
