//! Bridge error type and axum `IntoResponse` implementation.
//!
//! These are transport-level failures only. Record-level failures (not found,
//! conflict, ...) travel inside a `200` reply as the bus error envelope.

use authz_bus::BusError;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown subject: {0}")]
  UnknownSubject(String),

  #[error("bus error: {0}")]
  Bus(#[from] BusError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::UnknownSubject(_) => StatusCode::NOT_FOUND,
      Error::Bus(BusError::NoResponders(_)) => StatusCode::NOT_FOUND,
      Error::Bus(BusError::InvalidSubject(_)) => StatusCode::BAD_REQUEST,
      Error::Bus(BusError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
      Error::Bus(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
