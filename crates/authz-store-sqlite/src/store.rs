//! [`SqliteStore`]: the SQLite implementation of [`AuthorizationStore`].

use std::path::Path;

use authz_core::{
  record::{AuthorizationRecord, NewRecord, RecordId},
  resolve::RecordFilter,
  store::AuthorizationStore,
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawRecord, decode_id, encode_dt, encode_id},
  schema::SCHEMA,
};

/// Read one row by id, live or not.
fn read_record(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawRecord>> {
  conn
    .query_row(
      &format!("SELECT {RECORD_COLUMNS} FROM authorizations WHERE id = ?1"),
      rusqlite::params![id],
      RawRecord::from_row,
    )
    .optional()
}

/// The column value for `id`, or `None` if no row can carry it.
fn stored_id(id: RecordId) -> Option<i64> { encode_id(id).ok() }

// ─── Store ───────────────────────────────────────────────────────────────────

/// An authorization store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row `UPDATE` and read the row back if it matched.
  async fn update_returning(
    &self,
    sql: &'static str,
    id: RecordId,
  ) -> Result<Option<AuthorizationRecord>> {
    let Some(id_raw) = stored_id(id) else {
      return Ok(None);
    };
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(sql, rusqlite::params![id_raw, at_str])?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(read_record(conn, id_raw)?)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }
}

// ─── AuthorizationStore impl ─────────────────────────────────────────────────

impl AuthorizationStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, input: NewRecord) -> Result<AuthorizationRecord> {
    let now = Utc::now();
    let at_str = encode_dt(now);

    let NewRecord { key, role } = input;
    let (user_id, resource_id, resource_type) =
      (key.user_id.clone(), key.resource_id.clone(), key.resource_type.clone());
    let role_str = role.clone();

    let id_raw: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO authorizations (
             user_id, resource_id, resource_type, role, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![user_id, resource_id, resource_type, role_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AuthorizationRecord {
      id: decode_id(id_raw)?,
      user_id: key.user_id,
      resource_id: key.resource_id,
      resource_type: key.resource_type,
      role,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    })
  }

  async fn update(&self, record: AuthorizationRecord) -> Result<Option<AuthorizationRecord>> {
    let Some(id_raw) = stored_id(record.id) else {
      return Ok(None);
    };
    let at_str   = encode_dt(Utc::now());
    let role_str = record.role;

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE authorizations SET role = ?2, updated_at = ?3
           WHERE id = ?1 AND deleted_at IS NULL",
          rusqlite::params![id_raw, role_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(read_record(conn, id_raw)?)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn soft_delete(&self, id: RecordId) -> Result<Option<AuthorizationRecord>> {
    self
      .update_returning(
        "UPDATE authorizations SET deleted_at = ?2, updated_at = ?2
         WHERE id = ?1 AND deleted_at IS NULL",
        id,
      )
      .await
  }

  async fn restore(&self, id: RecordId) -> Result<Option<AuthorizationRecord>> {
    // Fails on the live-identity index if the tuple was re-granted meanwhile.
    self
      .update_returning(
        "UPDATE authorizations SET deleted_at = NULL, updated_at = ?2
         WHERE id = ?1 AND deleted_at IS NOT NULL",
        id,
      )
      .await
  }

  async fn purge(&self, id: RecordId) -> Result<bool> {
    let Some(id_raw) = stored_id(id) else {
      return Ok(false);
    };

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM authorizations WHERE id = ?1",
          rusqlite::params![id_raw],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(
    &self,
    id: RecordId,
    include_deleted: bool,
  ) -> Result<Option<AuthorizationRecord>> {
    let Some(id_raw) = stored_id(id) else {
      return Ok(None);
    };

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| Ok(read_record(conn, id_raw)?))
      .await?;

    let record = raw.map(RawRecord::into_record).transpose()?;
    Ok(record.filter(|r| include_deleted || r.is_live()))
  }

  async fn select<'a>(
    &'a self,
    filter: &'a RecordFilter,
  ) -> Result<Vec<AuthorizationRecord>> {
    // Build WHERE clause dynamically; only live rows are ever matched.
    let mut conds: Vec<String> = vec!["deleted_at IS NULL".to_owned()];
    let mut values: Vec<String> = vec![];
    for (column, value) in [
      ("user_id", &filter.user_id),
      ("resource_id", &filter.resource_id),
      ("resource_type", &filter.resource_type),
      ("role", &filter.role),
    ] {
      if let Some(v) = value {
        values.push(v.clone());
        conds.push(format!("{column} = ?{}", values.len()));
      }
    }

    let sql = format!(
      "SELECT {RECORD_COLUMNS} FROM authorizations WHERE {} ORDER BY id",
      conds.join(" AND ")
    );

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}
