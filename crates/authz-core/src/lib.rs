//! Core types and the record engine for the authorization-record service.
//!
//! This crate has no transport or database dependencies.
//! Storage backends implement [`store::AuthorizationStore`]; the dispatcher
//! drives a [`engine::RecordEngine`] built over one of them.

// Store implementations use `async fn`; the trait itself spells out `Send`.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod input;
pub mod patch;
pub mod record;
pub mod resolve;
pub mod store;

pub use engine::RecordEngine;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
