//! [`RecordEngine`]: resolution, merge and lifecycle rules over an injected
//! [`AuthorizationStore`].
//!
//! The engine holds no lock of its own. Read-modify-write sequences are not
//! atomic; correctness under concurrency comes from the store's uniqueness
//! constraint on live identity tuples.

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  input::RecordInput,
  patch,
  record::{AuthorizationRecord, IdentityKey, NewRecord},
  resolve::{KeyResolution, RecordFilter, Resolution},
  store::{AuthorizationStore, StoreError},
};

/// Map a backend error into the engine's error kinds.
fn store_error<E: StoreError>(e: E) -> Error {
  if e.is_conflict() {
    Error::Conflict
  } else {
    Error::Store(Box::new(e))
  }
}

pub struct RecordEngine<S> {
  store: S,
}

impl<S: AuthorizationStore> RecordEngine<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  // ── Resolution ────────────────────────────────────────────────────────

  /// Every live record the input refers to under the generic field-presence
  /// rules.
  pub async fn resolve(&self, input: &RecordInput) -> Result<Vec<AuthorizationRecord>> {
    let resolution = input.resolution();
    debug!(shape = resolution.name(), "resolving authorization records");

    if let Resolution::Id(id) = resolution {
      let found = self.store.get(id, false).await.map_err(store_error)?;
      return Ok(found.into_iter().collect());
    }

    let Some(filter) = resolution.filter() else {
      return Err(Error::InvalidQuery(
        "resource_type is required when user_id, resource_id or role is given"
          .to_owned(),
      ));
    };
    self.store.select(&filter).await.map_err(store_error)
  }

  /// Load the single record addressed by the id-first, else full-tuple key.
  async fn load(
    &self,
    key: &KeyResolution,
    include_deleted: bool,
  ) -> Result<Option<AuthorizationRecord>> {
    match key {
      KeyResolution::Id(id) => {
        self.store.get(*id, include_deleted).await.map_err(store_error)
      }
      KeyResolution::Tuple(identity) => self.load_live(identity).await,
      KeyResolution::Incomplete => Err(Error::InvalidQuery(
        "an id or the full user_id, resource_id, resource_type tuple is required"
          .to_owned(),
      )),
    }
  }

  async fn load_live(&self, identity: &IdentityKey) -> Result<Option<AuthorizationRecord>> {
    let filter = RecordFilter::identity(identity);
    let matches = self.store.select(&filter).await.map_err(store_error)?;
    Ok(matches.into_iter().next())
  }

  // ── Operations ────────────────────────────────────────────────────────

  /// All live matches; an empty result is not an error.
  pub async fn find(&self, input: &RecordInput) -> Result<Vec<AuthorizationRecord>> {
    let found = self.resolve(input).await?;
    debug!(count = found.len(), "find complete");
    Ok(found)
  }

  /// Exactly one record, or [`Error::NotFound`]. Soft-deleted records are
  /// visible only to an id lookup that asks for them.
  pub async fn get(&self, input: &RecordInput) -> Result<AuthorizationRecord> {
    let key = input.key();
    let include_deleted = input.include_deleted && matches!(key, KeyResolution::Id(_));
    self.load(&key, include_deleted).await?.ok_or(Error::NotFound)
  }

  /// Create the record, or merge the patchable fields into the live record
  /// it already resolves to.
  pub async fn set(&self, input: &RecordInput) -> Result<AuthorizationRecord> {
    let key = input.key();
    if let Some(stored) = self.load(&key, false).await? {
      if let Some(updated) = self.merge_into(stored, input).await? {
        return Ok(updated);
      }
      // Deleted between load and write: the tuple has no live record now.
      debug!("record deleted before update, treating as absent");
    }

    let KeyResolution::Tuple(identity) = key else {
      // An id that resolves to nothing: never invent a record for it.
      return Err(Error::NotFound);
    };

    let new = NewRecord { key: identity.clone(), role: input.role.clone() };
    match self.store.insert(new).await {
      Ok(created) => {
        info!(id = created.id, "created authorization record");
        Ok(created)
      }
      Err(e) if e.is_conflict() => {
        // Lost a create race; the winner is now the record to update.
        warn!(
          user_id = %identity.user_id,
          resource_id = %identity.resource_id,
          resource_type = %identity.resource_type,
          "concurrent create detected, retrying as update"
        );
        let Some(stored) = self.load_live(&identity).await? else {
          return Err(Error::Conflict);
        };
        self.merge_into(stored, input).await?.ok_or(Error::Conflict)
      }
      Err(e) => Err(store_error(e)),
    }
  }

  /// `None` if the record stopped being live before the write landed.
  async fn merge_into(
    &self,
    mut stored: AuthorizationRecord,
    input: &RecordInput,
  ) -> Result<Option<AuthorizationRecord>> {
    let changed = patch::merge(&mut stored, input);
    debug!(id = stored.id, ?changed, "merging into stored record");
    let updated = self.store.update(stored).await.map_err(store_error)?;
    if let Some(record) = &updated {
      info!(id = record.id, "updated authorization record");
    }
    Ok(updated)
  }

  /// Soft-delete the live record the input resolves to.
  pub async fn delete(&self, input: &RecordInput) -> Result<AuthorizationRecord> {
    let stored = self.load(&input.key(), false).await?.ok_or(Error::NotFound)?;
    // A concurrent delete between load and stamp surfaces as not-found.
    let deleted = self
      .store
      .soft_delete(stored.id)
      .await
      .map_err(store_error)?
      .ok_or(Error::NotFound)?;
    info!(id = deleted.id, "soft-deleted authorization record");
    Ok(deleted)
  }

  // ── Administrative ────────────────────────────────────────────────────

  /// Bring a soft-deleted record back to life under its original id.
  pub async fn restore(&self, input: &RecordInput) -> Result<AuthorizationRecord> {
    let id = input
      .id
      .ok_or_else(|| Error::InvalidQuery("restore requires an id".to_owned()))?;
    let restored = self
      .store
      .restore(id)
      .await
      .map_err(store_error)?
      .ok_or(Error::NotFound)?;
    info!(id, "restored authorization record");
    Ok(restored)
  }

  /// Hard-delete a record by id, whatever its state.
  pub async fn purge(&self, input: &RecordInput) -> Result<()> {
    let id = input
      .id
      .ok_or_else(|| Error::InvalidQuery("purge requires an id".to_owned()))?;
    if !self.store.purge(id).await.map_err(store_error)? {
      return Err(Error::NotFound);
    }
    warn!(id, "purged authorization record");
    Ok(())
  }
}
