//! Decoding of wire payloads into [`RecordInput`].
//!
//! Every inbound request carries a (possibly partial) record. Absent, `null`
//! and empty string fields mean "unconstrained"; an `id` of `0` means "no id".
//! Anything that is not a JSON object is rejected instead of being treated as
//! an empty input, so a garbled payload can never match every record.

use serde::Deserialize;

use crate::{
  Error, Result,
  record::{IdentityKey, RecordId},
  resolve::{KeyResolution, Resolution},
};

/// The wire shape. Every field is optional; unknown fields (such as
/// timestamps echoed back from an earlier reply) are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawInput {
  id:              Option<RecordId>,
  user_id:         Option<String>,
  resource_id:     Option<String>,
  resource_type:   Option<String>,
  role:            Option<String>,
  #[serde(default)]
  include_deleted: bool,
}

/// A partially-populated record as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordInput {
  pub id:              Option<RecordId>,
  pub user_id:         String,
  pub resource_id:     String,
  pub resource_type:   String,
  pub role:            String,
  /// Only honoured by `get` together with an `id` (audit lookups).
  pub include_deleted: bool,
}

impl RecordInput {
  /// Decode a JSON payload. A zero-length or whitespace-only payload is the
  /// empty input.
  pub fn decode(payload: &[u8]) -> Result<Self> {
    if payload.iter().all(u8::is_ascii_whitespace) {
      return Ok(Self::default());
    }

    let value: serde_json::Value = serde_json::from_slice(payload)
      .map_err(|e| Error::Decode(e.to_string()))?;
    if !value.is_object() {
      return Err(Error::Decode(format!(
        "expected a JSON object, found {}",
        json_kind(&value)
      )));
    }

    let raw: RawInput =
      serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))?;

    Ok(Self {
      id:              raw.id.filter(|id| *id != 0),
      user_id:         raw.user_id.unwrap_or_default(),
      resource_id:     raw.resource_id.unwrap_or_default(),
      resource_type:   raw.resource_type.unwrap_or_default(),
      role:            raw.role.unwrap_or_default(),
      include_deleted: raw.include_deleted,
    })
  }

  /// Input addressing a record by id only.
  pub fn with_id(id: RecordId) -> Self {
    Self { id: Some(id), ..Self::default() }
  }

  /// Input carrying the full tuple plus a role.
  pub fn tuple(
    user_id: &str,
    resource_id: &str,
    resource_type: &str,
    role: &str,
  ) -> Self {
    Self {
      user_id: user_id.to_owned(),
      resource_id: resource_id.to_owned(),
      resource_type: resource_type.to_owned(),
      role: role.to_owned(),
      ..Self::default()
    }
  }

  pub fn user_id(&self) -> Option<&str> { non_empty(&self.user_id) }

  pub fn resource_id(&self) -> Option<&str> { non_empty(&self.resource_id) }

  pub fn resource_type(&self) -> Option<&str> { non_empty(&self.resource_type) }

  pub fn role(&self) -> Option<&str> { non_empty(&self.role) }

  /// The generic resolution used by `find`.
  pub fn resolution(&self) -> Resolution { Resolution::from_input(self) }

  /// The narrower id-first, else full-tuple key used by `get`, `set` and
  /// `del`. `role` is never part of it.
  pub fn key(&self) -> KeyResolution {
    if let Some(id) = self.id {
      return KeyResolution::Id(id);
    }
    match (self.user_id(), self.resource_id(), self.resource_type()) {
      (Some(user_id), Some(resource_id), Some(resource_type)) => {
        KeyResolution::Tuple(IdentityKey::new(user_id, resource_id, resource_type))
      }
      _ => KeyResolution::Incomplete,
    }
  }
}

fn non_empty(s: &str) -> Option<&str> { (!s.is_empty()).then_some(s) }

fn json_kind(value: &serde_json::Value) -> &'static str {
  match value {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "a boolean",
    serde_json::Value::Number(_) => "a number",
    serde_json::Value::String(_) => "a string",
    serde_json::Value::Array(_) => "an array",
    serde_json::Value::Object(_) => "an object",
  }
}
