//! HTTP bridge for the authorization bus.
//!
//! Exposes an axum [`Router`] that forwards `POST /bus/{subject}` bodies to
//! the in-process [`Bus`] and returns the subscriber's reply verbatim.

pub mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc, time::Duration};

use authz_bus::{Bus, Operation, subjects::DEFAULT_PREFIX};
use axum::{
  Json, Router,
  extract::{Path, State},
  http::header,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AUTHZ_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default = "default_prefix")]
  pub subject_prefix:     String,
  #[serde(default = "default_timeout_ms")]
  pub request_timeout_ms: u64,
  /// Also serve the `restore` and `purge` subjects.
  #[serde(default)]
  pub admin_subjects:     bool,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 4780 }
fn default_store_path() -> PathBuf { PathBuf::from("authorizations.db") }
fn default_prefix() -> String { DEFAULT_PREFIX.to_owned() }
fn default_timeout_ms() -> u64 { 5_000 }

impl ServerConfig {
  /// The operations this server registers subjects for.
  pub fn operations(&self) -> &'static [Operation] {
    if self.admin_subjects { Operation::ALL } else { Operation::STANDARD }
  }

  pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub bus:    Bus,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the bridge.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/bus/{subject}", post(forward))
    .route("/subjects",      get(subjects))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Forward the body to `subject` and relay the reply.
async fn forward(
  State(state): State<AppState>,
  Path(subject): Path<String>,
  body: Bytes,
) -> Result<Response> {
  let Some(op) = Operation::from_subject(&state.config.subject_prefix, &subject) else {
    return Err(Error::UnknownSubject(subject));
  };
  debug!(%op, bytes = body.len(), "forwarding request");

  let reply = state
    .bus
    .request(&subject, body, state.config.request_timeout())
    .await?;
  Ok(([(header::CONTENT_TYPE, "application/json")], reply).into_response())
}

async fn subjects(State(state): State<AppState>) -> Json<Vec<String>> {
  Json(state.bus.subjects())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
