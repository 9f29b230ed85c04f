//! The authorization record: the only entity this service stores.
//!
//! A record states that a user holds a role on a resource. The triple
//! `(user_id, resource_id, resource_type)` is unique among live records;
//! `role` is the only field a normal update may change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned record identifier. Never reused.
pub type RecordId = u64;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The composite uniqueness key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
  pub user_id:       String,
  pub resource_id:   String,
  pub resource_type: String,
}

impl IdentityKey {
  pub fn new(
    user_id: impl Into<String>,
    resource_id: impl Into<String>,
    resource_type: impl Into<String>,
  ) -> Self {
    Self {
      user_id:       user_id.into(),
      resource_id:   resource_id.into(),
      resource_type: resource_type.into(),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted authorization fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
  pub id:            RecordId,
  pub user_id:       String,
  pub resource_id:   String,
  pub resource_type: String,
  pub role:          String,
  /// Set once, on first persist.
  pub created_at:    DateTime<Utc>,
  /// Refreshed by the store on every persist.
  pub updated_at:    DateTime<Utc>,
  /// `None` while the record is live.
  pub deleted_at:    Option<DateTime<Utc>>,
}

impl AuthorizationRecord {
  pub fn is_live(&self) -> bool { self.deleted_at.is_none() }

  pub fn key(&self) -> IdentityKey {
    IdentityKey::new(&self.user_id, &self.resource_id, &self.resource_type)
  }
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::AuthorizationStore::insert`].
/// `id` and all timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
  pub key:  IdentityKey,
  pub role: String,
}
