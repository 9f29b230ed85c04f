//! Identity resolution: which stored records an input refers to.
//!
//! Two policies exist:
//!
//! - [`Resolution`] is the generic field-presence dispatch used by `find`.
//!   Each populated-field shape maps to exactly one variant; the one shape
//!   with no meaning (identity fields without a `resource_type`) is the named
//!   [`Resolution::Underspecified`] case.
//! - [`KeyResolution`] is the narrower id-first, else full-tuple policy used
//!   by `get`, `set` and `del`.

use crate::{
  input::RecordInput,
  record::{IdentityKey, RecordId},
};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Equality predicate over identity fields, handed to the store.
///
/// `None` leaves a column unconstrained. Stores only ever match live records
/// against a filter; soft-deleted rows are reachable by id alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
  pub user_id:       Option<String>,
  pub resource_id:   Option<String>,
  pub resource_type: Option<String>,
  pub role:          Option<String>,
}

impl RecordFilter {
  /// Filter matching exactly one identity tuple, any role.
  pub fn identity(key: &IdentityKey) -> Self {
    Self {
      user_id:       Some(key.user_id.clone()),
      resource_id:   Some(key.resource_id.clone()),
      resource_type: Some(key.resource_type.clone()),
      role:          None,
    }
  }

  pub fn is_unrestricted(&self) -> bool { *self == Self::default() }
}

// ─── Generic resolution ──────────────────────────────────────────────────────

/// The query shape of an input, decided purely by which fields are populated.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Resolution {
  /// A non-zero id was supplied; every other field is ignored.
  Id(RecordId),
  /// Every grant on one resource, any user.
  Resource {
    resource_id:   String,
    resource_type: String,
    role:          Option<String>,
  },
  /// Every grant a user holds on a resource type.
  UserOnType {
    user_id:       String,
    resource_type: String,
    role:          Option<String>,
  },
  /// Every role a user holds on one resource.
  UserOnResource(IdentityKey),
  /// The full tuple including role.
  Exact { key: IdentityKey, role: String },
  /// All live records, narrowed by type (and role) when given.
  Scan {
    resource_type: Option<String>,
    role:          Option<String>,
  },
  /// Identity fields were supplied without a `resource_type`.
  Underspecified,
}

impl Resolution {
  pub fn from_input(input: &RecordInput) -> Self {
    if let Some(id) = input.id {
      return Self::Id(id);
    }

    let owned = |s: &str| s.to_owned();
    match (
      input.user_id(),
      input.resource_id(),
      input.resource_type(),
      input.role(),
    ) {
      (None, Some(resource_id), Some(resource_type), role) => Self::Resource {
        resource_id:   resource_id.to_owned(),
        resource_type: resource_type.to_owned(),
        role:          role.map(owned),
      },
      (Some(user_id), None, Some(resource_type), role) => Self::UserOnType {
        user_id:       user_id.to_owned(),
        resource_type: resource_type.to_owned(),
        role:          role.map(owned),
      },
      (Some(user_id), Some(resource_id), Some(resource_type), None) => {
        Self::UserOnResource(IdentityKey::new(user_id, resource_id, resource_type))
      }
      (Some(user_id), Some(resource_id), Some(resource_type), Some(role)) => {
        Self::Exact {
          key:  IdentityKey::new(user_id, resource_id, resource_type),
          role: role.to_owned(),
        }
      }
      (None, None, Some(resource_type), role) => Self::Scan {
        resource_type: Some(resource_type.to_owned()),
        role:          role.map(owned),
      },
      (None, None, None, None) => Self::Scan { resource_type: None, role: None },
      (_, _, None, _) => Self::Underspecified,
    }
  }

  /// Short name for logs.
  pub fn name(&self) -> &'static str { self.into() }

  /// The store filter for this shape. `None` for [`Resolution::Id`] and
  /// [`Resolution::Underspecified`], which are not filter queries.
  pub fn filter(&self) -> Option<RecordFilter> {
    let filter = match self {
      Self::Id(_) | Self::Underspecified => return None,
      Self::Resource { resource_id, resource_type, role } => RecordFilter {
        resource_id: Some(resource_id.clone()),
        resource_type: Some(resource_type.clone()),
        role: role.clone(),
        ..RecordFilter::default()
      },
      Self::UserOnType { user_id, resource_type, role } => RecordFilter {
        user_id: Some(user_id.clone()),
        resource_type: Some(resource_type.clone()),
        role: role.clone(),
        ..RecordFilter::default()
      },
      Self::UserOnResource(key) => RecordFilter::identity(key),
      Self::Exact { key, role } => RecordFilter {
        role: Some(role.clone()),
        ..RecordFilter::identity(key)
      },
      Self::Scan { resource_type, role } => RecordFilter {
        resource_type: resource_type.clone(),
        role: role.clone(),
        ..RecordFilter::default()
      },
    };
    Some(filter)
  }
}

// ─── Keyed resolution ────────────────────────────────────────────────────────

/// How `get`, `set` and `del` address a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
  Id(RecordId),
  Tuple(IdentityKey),
  /// No id and at least one of the three identity fields is empty.
  Incomplete,
}
