//! Merge-on-update: the whitelist of fields a `set` may change on a stored
//! record. Everything else is taken from the stored record.

use crate::{input::RecordInput, record::AuthorizationRecord};

/// A field that an update request is allowed to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PatchableField {
  Role,
}

/// Fields applied, in order, when a `set` resolves to an existing record.
pub const PATCHABLE_FIELDS: &[PatchableField] = &[PatchableField::Role];

impl PatchableField {
  /// Copy this field from `input` onto `stored` if the input supplies it.
  /// Returns whether the stored value changed.
  fn apply(self, stored: &mut AuthorizationRecord, input: &RecordInput) -> bool {
    match self {
      Self::Role => match input.role() {
        Some(role) if role != stored.role => {
          stored.role = role.to_owned();
          true
        }
        _ => false,
      },
    }
  }
}

/// Apply every whitelisted field of `input` to `stored`; returns the fields
/// whose value changed.
pub fn merge(stored: &mut AuthorizationRecord, input: &RecordInput) -> Vec<PatchableField> {
  PATCHABLE_FIELDS
    .iter()
    .copied()
    .filter(|field| field.apply(stored, input))
    .collect()
}
