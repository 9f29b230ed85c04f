//! Error types for `authz-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The inbound payload could not be decoded into a record input.
  #[error("malformed input: {0}")]
  Decode(String),

  /// The input decoded, but its populated fields do not form a resolvable
  /// query (e.g. `user_id` without `resource_type`).
  #[error("invalid query: {0}")]
  InvalidQuery(String),

  #[error("authorization record not found")]
  NotFound,

  #[error("a live authorization record already exists for this identity")]
  Conflict,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
