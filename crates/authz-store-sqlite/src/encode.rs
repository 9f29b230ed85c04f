//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Ids are SQLite `INTEGER`s,
//! which are signed; the domain uses unsigned ids.

use authz_core::record::{AuthorizationRecord, RecordId};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── RecordId ────────────────────────────────────────────────────────────────

pub fn encode_id(id: RecordId) -> Result<i64> {
  i64::try_from(id).map_err(|_| Error::IdRange(id.to_string()))
}

pub fn decode_id(raw: i64) -> Result<RecordId> {
  RecordId::try_from(raw).map_err(|_| Error::IdRange(raw.to_string()))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "id, user_id, resource_id, resource_type, role, \
                                  created_at, updated_at, deleted_at";

/// Raw values read directly from an `authorizations` row.
pub struct RawRecord {
  pub id:            i64,
  pub user_id:       String,
  pub resource_id:   String,
  pub resource_type: String,
  pub role:          String,
  pub created_at:    String,
  pub updated_at:    String,
  pub deleted_at:    Option<String>,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      user_id:       row.get(1)?,
      resource_id:   row.get(2)?,
      resource_type: row.get(3)?,
      role:          row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
      deleted_at:    row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<AuthorizationRecord> {
    Ok(AuthorizationRecord {
      id:            decode_id(self.id)?,
      user_id:       self.user_id,
      resource_id:   self.resource_id,
      resource_type: self.resource_type,
      role:          self.role,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      deleted_at:    self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
