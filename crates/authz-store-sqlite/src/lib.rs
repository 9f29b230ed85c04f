//! SQLite backend for the authorization-record service.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The live-identity uniqueness invariant
//! is enforced by a partial unique index, not by application code.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
