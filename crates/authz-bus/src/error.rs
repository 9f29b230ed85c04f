//! Transport errors for the in-process bus.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
  #[error("invalid subject: {0:?}")]
  InvalidSubject(String),

  #[error("subject {0:?} already has a subscriber")]
  AlreadySubscribed(String),

  #[error("no responders for subject {0:?}")]
  NoResponders(String),

  #[error("request on {0:?} timed out")]
  Timeout(String),

  /// The subscriber dropped the message without replying.
  #[error("request on {0:?} was dropped without a reply")]
  Dropped(String),
}

pub type Result<T, E = BusError> = std::result::Result<T, E>;
