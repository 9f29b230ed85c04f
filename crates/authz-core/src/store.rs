//! The `AuthorizationStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `authz-store-sqlite`).
//! The [`RecordEngine`](crate::RecordEngine) owns one and never touches a
//! database directly, so tests can hand it any backend.

use std::future::Future;

use crate::{
  record::{AuthorizationRecord, NewRecord, RecordId},
  resolve::RecordFilter,
};

/// Classification the engine needs from a backend error.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the write was rejected by the live-identity uniqueness
  /// constraint.
  fn is_conflict(&self) -> bool;
}

/// Abstraction over a uniquely-constrained authorization record store.
///
/// Backends must enforce that `(user_id, resource_id, resource_type)` is
/// unique among live records themselves; the engine relies on that to settle
/// concurrent creates.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait AuthorizationStore: Send + Sync {
  type Error: StoreError;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new live record. The store assigns `id`, `created_at` and
  /// `updated_at`.
  fn insert(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<AuthorizationRecord, Self::Error>> + Send + '_;

  /// Write the mutable columns of a live record and refresh its
  /// `updated_at`. Returns the record as stored, or `None` if no live record
  /// has this id; a soft-deleted record is never modified.
  fn update(
    &self,
    record: AuthorizationRecord,
  ) -> impl Future<Output = Result<Option<AuthorizationRecord>, Self::Error>> + Send + '_;

  /// Stamp `deleted_at` on a live record. Returns `None` if no live record
  /// has this id; an already-deleted record is never stamped twice.
  fn soft_delete(
    &self,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<AuthorizationRecord>, Self::Error>> + Send + '_;

  /// Clear `deleted_at` on a soft-deleted record. Returns `None` if no
  /// soft-deleted record has this id.
  fn restore(
    &self,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<AuthorizationRecord>, Self::Error>> + Send + '_;

  /// Remove the row entirely, live or not. Returns whether a row existed.
  fn purge(
    &self,
    id: RecordId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a record by id. Soft-deleted records are returned only when
  /// `include_deleted` is set.
  fn get(
    &self,
    id: RecordId,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Option<AuthorizationRecord>, Self::Error>> + Send + '_;

  /// All live records matching `filter`, in id order.
  fn select<'a>(
    &'a self,
    filter: &'a RecordFilter,
  ) -> impl Future<Output = Result<Vec<AuthorizationRecord>, Self::Error>> + Send + 'a;
}
