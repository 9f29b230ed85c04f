//! Subject names served by the dispatcher.
//!
//! | Subject | Request | Reply |
//! |---------|---------|-------|
//! | `<prefix>.get` | `{id}` or identity fields | one record |
//! | `<prefix>.find` | partial identity fields | array of records |
//! | `<prefix>.set` | full or partial record | the stored record |
//! | `<prefix>.del` | identity fields | `{"status":"deleted"}` |
//! | `<prefix>.restore` | `{id}` | the restored record |
//! | `<prefix>.purge` | `{id}` | `{"status":"purged"}` |

use strum::{Display, EnumString};

/// Default subject prefix.
pub const DEFAULT_PREFIX: &str = "authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  Get,
  Find,
  Set,
  Del,
  /// Administrative: undo a soft delete.
  Restore,
  /// Administrative: hard delete.
  Purge,
}

impl Operation {
  /// The standard protocol.
  pub const STANDARD: &'static [Operation] =
    &[Operation::Get, Operation::Find, Operation::Set, Operation::Del];

  /// Standard plus administrative operations.
  pub const ALL: &'static [Operation] = &[
    Operation::Get,
    Operation::Find,
    Operation::Set,
    Operation::Del,
    Operation::Restore,
    Operation::Purge,
  ];

  pub fn is_admin(self) -> bool { matches!(self, Self::Restore | Self::Purge) }

  /// Full subject under `prefix`, e.g. `authorization.get`.
  pub fn subject(self, prefix: &str) -> String { format!("{prefix}.{self}") }

  /// Inverse of [`Operation::subject`].
  pub fn from_subject(prefix: &str, subject: &str) -> Option<Self> {
    subject
      .strip_prefix(prefix)?
      .strip_prefix('.')?
      .parse()
      .ok()
  }
}
