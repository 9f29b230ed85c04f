//! Reply framing: success bodies and the classified error envelope.
//!
//! Failures are encoded as `{"_error": "<message>", "_kind": "<kind>"}`.
//! Storage errors are never echoed to the caller; they are logged and
//! replaced by a generic `unexpected` envelope.

use authz_core::Error;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body sent after a successful `del`.
pub const DELETED: &[u8] = br#"{"status":"deleted"}"#;

/// Body sent after a successful `purge`.
pub const PURGED: &[u8] = br#"{"status":"purged"}"#;

/// Last-resort envelope if the envelope itself cannot be serialised.
const UNEXPECTED: &[u8] = br#"{"_error":"unexpected error","_kind":"unexpected"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  /// Malformed payload, or fields that do not form a valid query.
  Decode,
  NotFound,
  Conflict,
  /// Storage or transport failure not otherwise classified.
  Unexpected,
}

impl ErrorKind {
  pub fn of(e: &Error) -> Self {
    match e {
      Error::Decode(_) | Error::InvalidQuery(_) => Self::Decode,
      Error::NotFound => Self::NotFound,
      Error::Conflict => Self::Conflict,
      Error::Store(_) => Self::Unexpected,
    }
  }
}

/// The failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
  #[serde(rename = "_error")]
  pub error: String,
  #[serde(rename = "_kind")]
  pub kind:  ErrorKind,
}

impl ErrorReply {
  pub fn new(e: &Error) -> Self {
    let kind = ErrorKind::of(e);
    let error = match kind {
      ErrorKind::Unexpected => "unexpected error".to_owned(),
      _ => e.to_string(),
    };
    Self { error, kind }
  }

  /// Parse a reply body as an error envelope. `None` for success bodies.
  pub fn parse(body: &[u8]) -> Option<Self> { serde_json::from_slice(body).ok() }

  pub fn encode(&self) -> Bytes {
    serde_json::to_vec(self)
      .map(Bytes::from)
      .unwrap_or_else(|_| Bytes::from_static(UNEXPECTED))
  }
}

/// Encode a failure reply.
pub fn failure(e: &Error) -> Bytes { ErrorReply::new(e).encode() }

/// Encode a success reply; a serialisation failure becomes an `unexpected`
/// envelope so the request is still answered.
pub fn success<T: Serialize>(value: &T) -> Bytes {
  match serde_json::to_vec(value) {
    Ok(body) => Bytes::from(body),
    Err(e) => {
      error!(error = %e, "failed to serialise reply");
      Bytes::from_static(UNEXPECTED)
    }
  }
}
