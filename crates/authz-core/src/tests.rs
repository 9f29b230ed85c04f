//! Engine tests against an in-memory [`AuthorizationStore`] double.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicUsize, Ordering},
};

use chrono::Utc;
use thiserror::Error;

use crate::{
  Error, RecordEngine,
  input::RecordInput,
  record::{AuthorizationRecord, NewRecord, RecordId},
  resolve::RecordFilter,
  store::{AuthorizationStore, StoreError},
};

// ─── Test double ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum MemoryError {
  #[error("unique constraint violated")]
  Conflict,
  #[error("backend offline")]
  Offline,
}

impl StoreError for MemoryError {
  fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }
}

#[derive(Default)]
struct Rows {
  next_id: RecordId,
  rows:    Vec<AuthorizationRecord>,
}

/// Vec-backed store enforcing live-tuple uniqueness like a real backend.
#[derive(Clone, Default)]
struct MemoryStore {
  rows:           Arc<Mutex<Rows>>,
  /// Number of upcoming `select` calls that should return nothing, used to
  /// simulate a create race the caller cannot see.
  blind_selects:  Arc<AtomicUsize>,
  /// Number of upcoming `update` calls whose target is soft-deleted just
  /// before the write, simulating a `del` landing mid-`set`.
  racing_deletes: Arc<AtomicUsize>,
  offline:        bool,
}

impl MemoryStore {
  fn live_row_count(&self) -> usize {
    self.rows.lock().unwrap().rows.iter().filter(|r| r.is_live()).count()
  }

  fn seed(&self, record: NewRecord) -> AuthorizationRecord {
    let mut rows = self.rows.lock().unwrap();
    rows.next_id += 1;
    let now = Utc::now();
    let record = AuthorizationRecord {
      id:            rows.next_id,
      user_id:       record.key.user_id,
      resource_id:   record.key.resource_id,
      resource_type: record.key.resource_type,
      role:          record.role,
      created_at:    now,
      updated_at:    now,
      deleted_at:    None,
    };
    rows.rows.push(record.clone());
    record
  }

  fn check(&self) -> Result<(), MemoryError> {
    if self.offline { Err(MemoryError::Offline) } else { Ok(()) }
  }
}

fn filter_matches(filter: &RecordFilter, record: &AuthorizationRecord) -> bool {
  let eq = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);
  record.is_live()
    && eq(&filter.user_id, &record.user_id)
    && eq(&filter.resource_id, &record.resource_id)
    && eq(&filter.resource_type, &record.resource_type)
    && eq(&filter.role, &record.role)
}

impl AuthorizationStore for MemoryStore {
  type Error = MemoryError;

  async fn insert(&self, input: NewRecord) -> Result<AuthorizationRecord, MemoryError> {
    self.check()?;
    let taken = self
      .rows
      .lock()
      .unwrap()
      .rows
      .iter()
      .any(|r| r.is_live() && r.key() == input.key);
    if taken {
      return Err(MemoryError::Conflict);
    }
    Ok(self.seed(input))
  }

  async fn update(
    &self,
    record: AuthorizationRecord,
  ) -> Result<Option<AuthorizationRecord>, MemoryError> {
    self.check()?;
    let racing = self
      .racing_deletes
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if racing {
      self.soft_delete(record.id).await?;
    }

    let mut rows = self.rows.lock().unwrap();
    Ok(rows.rows.iter_mut().find(|r| r.id == record.id && r.is_live()).map(|row| {
      row.role = record.role;
      row.updated_at = Utc::now();
      row.clone()
    }))
  }

  async fn soft_delete(
    &self,
    id: RecordId,
  ) -> Result<Option<AuthorizationRecord>, MemoryError> {
    self.check()?;
    let mut rows = self.rows.lock().unwrap();
    Ok(rows.rows.iter_mut().find(|r| r.id == id && r.is_live()).map(|row| {
      let now = Utc::now();
      row.deleted_at = Some(now);
      row.updated_at = now;
      row.clone()
    }))
  }

  async fn restore(
    &self,
    id: RecordId,
  ) -> Result<Option<AuthorizationRecord>, MemoryError> {
    self.check()?;
    let mut rows = self.rows.lock().unwrap();
    let Some(pos) = rows.rows.iter().position(|r| r.id == id && !r.is_live()) else {
      return Ok(None);
    };
    let key = rows.rows[pos].key();
    if rows.rows.iter().any(|r| r.is_live() && r.key() == key) {
      return Err(MemoryError::Conflict);
    }
    let row = &mut rows.rows[pos];
    row.deleted_at = None;
    row.updated_at = Utc::now();
    Ok(Some(row.clone()))
  }

  async fn purge(&self, id: RecordId) -> Result<bool, MemoryError> {
    self.check()?;
    let mut rows = self.rows.lock().unwrap();
    let before = rows.rows.len();
    rows.rows.retain(|r| r.id != id);
    Ok(rows.rows.len() != before)
  }

  async fn get(
    &self,
    id: RecordId,
    include_deleted: bool,
  ) -> Result<Option<AuthorizationRecord>, MemoryError> {
    self.check()?;
    let rows = self.rows.lock().unwrap();
    Ok(
      rows
        .rows
        .iter()
        .find(|r| r.id == id && (include_deleted || r.is_live()))
        .cloned(),
    )
  }

  async fn select<'a>(
    &'a self,
    filter: &'a RecordFilter,
  ) -> Result<Vec<AuthorizationRecord>, MemoryError> {
    self.check()?;
    let blind = self
      .blind_selects
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if blind {
      return Ok(Vec::new());
    }
    let rows = self.rows.lock().unwrap();
    Ok(rows.rows.iter().filter(|r| filter_matches(filter, r)).cloned().collect())
  }
}

fn engine() -> RecordEngine<MemoryStore> { RecordEngine::new(MemoryStore::default()) }

fn grant(user_id: &str, resource_id: &str, resource_type: &str, role: &str) -> RecordInput {
  RecordInput::tuple(user_id, resource_id, resource_type, role)
}

// ─── Set ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_creates_then_updates_role_only() {
  let e = engine();

  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  assert_eq!(created.id, 1);
  assert_eq!(created.role, "editor");

  tokio::time::sleep(std::time::Duration::from_millis(5)).await;

  let updated = e.set(&grant("u1", "r1", "doc", "viewer")).await.unwrap();
  assert_eq!(updated.id, 1);
  assert_eq!(updated.role, "viewer");
  assert_eq!(updated.created_at, created.created_at);
  assert!(updated.updated_at > created.updated_at);
  assert_eq!(e.store().live_row_count(), 1);
}

#[tokio::test]
async fn set_by_id_keeps_stored_identity_fields() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();

  let mut input = grant("someone-else", "r9", "sheet", "owner");
  input.id = Some(created.id);
  let updated = e.set(&input).await.unwrap();

  assert_eq!(updated.id, created.id);
  assert_eq!(updated.role, "owner");
  assert_eq!(updated.key(), created.key());
}

#[tokio::test]
async fn set_with_unknown_id_is_not_found() {
  let e = engine();
  let mut input = grant("u1", "r1", "doc", "editor");
  input.id = Some(42);
  assert!(matches!(e.set(&input).await.unwrap_err(), Error::NotFound));
  assert_eq!(e.store().live_row_count(), 0);
}

#[tokio::test]
async fn set_with_incomplete_tuple_is_rejected() {
  let e = engine();
  let err = e.set(&grant("u1", "", "doc", "editor")).await.unwrap_err();
  assert!(matches!(err, Error::InvalidQuery(_)));
}

#[tokio::test]
async fn set_retries_lost_create_race_as_update() {
  let e = engine();
  e.store().seed(NewRecord {
    key:  crate::record::IdentityKey::new("u1", "r1", "doc"),
    role: "editor".into(),
  });
  // The engine's first lookup misses the row, so its insert collides.
  e.store().blind_selects.store(1, Ordering::SeqCst);

  let record = e.set(&grant("u1", "r1", "doc", "viewer")).await.unwrap();
  assert_eq!(record.id, 1);
  assert_eq!(record.role, "viewer");
  assert_eq!(e.store().live_row_count(), 1);
}

#[tokio::test]
async fn set_surfaces_conflict_when_winner_is_invisible() {
  let e = engine();
  e.store().seed(NewRecord {
    key:  crate::record::IdentityKey::new("u1", "r1", "doc"),
    role: "editor".into(),
  });
  e.store().blind_selects.store(2, Ordering::SeqCst);

  let err = e.set(&grant("u1", "r1", "doc", "viewer")).await.unwrap_err();
  assert!(matches!(err, Error::Conflict));
}

#[tokio::test]
async fn set_after_delete_creates_new_id() {
  let e = engine();
  let first = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  e.delete(&grant("u1", "r1", "doc", "")).await.unwrap();

  let second = e.set(&grant("u1", "r1", "doc", "viewer")).await.unwrap();
  assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn set_racing_delete_by_tuple_creates_a_fresh_live_record() {
  let e = engine();
  let first = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  e.store().racing_deletes.store(1, Ordering::SeqCst);

  let record = e.set(&grant("u1", "r1", "doc", "viewer")).await.unwrap();
  assert!(record.is_live());
  assert_ne!(record.id, first.id);
  assert_eq!(record.role, "viewer");
  assert_eq!(e.store().live_row_count(), 1);

  let old = e.store().get(first.id, true).await.unwrap().unwrap();
  assert_eq!(old.role, "editor");
  assert!(old.deleted_at.is_some());
}

#[tokio::test]
async fn set_racing_delete_by_id_is_not_found() {
  let e = engine();
  let first = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  e.store().racing_deletes.store(1, Ordering::SeqCst);

  let mut input = RecordInput::with_id(first.id);
  input.role = "viewer".into();
  assert!(matches!(e.set(&input).await.unwrap_err(), Error::NotFound));
  assert_eq!(e.store().live_row_count(), 0);
}

// ─── Get ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_by_tuple_ignores_role() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  let got = e.get(&grant("u1", "r1", "doc", "something-else")).await.unwrap();
  assert_eq!(got, created);
}

#[tokio::test]
async fn get_deleted_record_only_for_id_audit_lookup() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  e.delete(&RecordInput::with_id(created.id)).await.unwrap();

  assert!(matches!(
    e.get(&RecordInput::with_id(created.id)).await.unwrap_err(),
    Error::NotFound
  ));

  let mut audit = RecordInput::with_id(created.id);
  audit.include_deleted = true;
  let got = e.get(&audit).await.unwrap();
  assert!(got.deleted_at.is_some());

  // The flag has no effect on tuple lookups.
  let mut by_tuple = grant("u1", "r1", "doc", "");
  by_tuple.include_deleted = true;
  assert!(matches!(e.get(&by_tuple).await.unwrap_err(), Error::NotFound));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_is_soft_and_second_delete_is_not_found() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();

  let deleted = e.delete(&grant("u1", "r1", "doc", "")).await.unwrap();
  assert_eq!(deleted.id, created.id);
  assert!(deleted.deleted_at.is_some());

  assert!(e.find(&grant("u1", "r1", "doc", "")).await.unwrap().is_empty());
  assert!(matches!(
    e.delete(&grant("u1", "r1", "doc", "")).await.unwrap_err(),
    Error::NotFound
  ));
  assert!(matches!(
    e.delete(&RecordInput::with_id(created.id)).await.unwrap_err(),
    Error::NotFound
  ));
}

#[tokio::test]
async fn delete_without_key_is_rejected() {
  let e = engine();
  let err = e.delete(&RecordInput::default()).await.unwrap_err();
  assert!(matches!(err, Error::InvalidQuery(_)));
}

// ─── Find ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_follows_resolution_shapes() {
  let e = engine();
  e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  e.set(&grant("u2", "r1", "doc", "viewer")).await.unwrap();
  e.set(&grant("u1", "r2", "doc", "viewer")).await.unwrap();
  e.set(&grant("u1", "r3", "sheet", "owner")).await.unwrap();

  assert_eq!(e.find(&grant("", "r1", "doc", "")).await.unwrap().len(), 2);
  assert_eq!(e.find(&grant("u1", "", "doc", "")).await.unwrap().len(), 2);
  assert_eq!(e.find(&grant("u1", "r1", "doc", "")).await.unwrap().len(), 1);
  assert_eq!(e.find(&grant("u1", "r1", "doc", "viewer")).await.unwrap().len(), 0);
  assert_eq!(e.find(&grant("", "", "doc", "")).await.unwrap().len(), 3);
  assert_eq!(e.find(&RecordInput::default()).await.unwrap().len(), 4);
}

#[tokio::test]
async fn find_results_are_in_id_order() {
  let e = engine();
  for user in ["c", "a", "b"] {
    e.set(&grant(user, "r1", "doc", "viewer")).await.unwrap();
  }
  let ids: Vec<_> = e
    .find(&grant("", "r1", "doc", ""))
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.id)
    .collect();
  assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn find_by_id_skips_deleted() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  assert_eq!(e.find(&RecordInput::with_id(created.id)).await.unwrap().len(), 1);
  e.delete(&RecordInput::with_id(created.id)).await.unwrap();
  assert!(e.find(&RecordInput::with_id(created.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn find_underspecified_is_rejected() {
  let e = engine();
  e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  let err = e.find(&grant("u1", "r1", "", "")).await.unwrap_err();
  assert!(matches!(err, Error::InvalidQuery(_)));
}

// ─── Administrative ──────────────────────────────────────────────────────────

#[tokio::test]
async fn restore_revives_and_conflicts_with_replacement() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();
  e.delete(&RecordInput::with_id(created.id)).await.unwrap();

  let restored = e.restore(&RecordInput::with_id(created.id)).await.unwrap();
  assert_eq!(restored.id, created.id);
  assert!(restored.is_live());

  // Restoring a live record is not-found.
  assert!(matches!(
    e.restore(&RecordInput::with_id(created.id)).await.unwrap_err(),
    Error::NotFound
  ));

  e.delete(&RecordInput::with_id(created.id)).await.unwrap();
  e.set(&grant("u1", "r1", "doc", "viewer")).await.unwrap();
  assert!(matches!(
    e.restore(&RecordInput::with_id(created.id)).await.unwrap_err(),
    Error::Conflict
  ));
}

#[tokio::test]
async fn purge_removes_row_and_requires_id() {
  let e = engine();
  let created = e.set(&grant("u1", "r1", "doc", "editor")).await.unwrap();

  assert!(matches!(
    e.purge(&grant("u1", "r1", "doc", "")).await.unwrap_err(),
    Error::InvalidQuery(_)
  ));

  e.purge(&RecordInput::with_id(created.id)).await.unwrap();
  let mut audit = RecordInput::with_id(created.id);
  audit.include_deleted = true;
  assert!(matches!(e.get(&audit).await.unwrap_err(), Error::NotFound));
  assert!(matches!(
    e.purge(&RecordInput::with_id(created.id)).await.unwrap_err(),
    Error::NotFound
  ));
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn backend_failures_are_wrapped() {
  let e = RecordEngine::new(MemoryStore { offline: true, ..MemoryStore::default() });
  let err = e.find(&RecordInput::default()).await.unwrap_err();
  assert!(matches!(err, Error::Store(_)));
}
