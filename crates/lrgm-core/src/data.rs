//! The aggregate of all three collections, and its persisted envelope.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result, activity::Activity, campaign::Campaign, contact::Contact,
};

/// Namespace key the aggregate is persisted under.
pub const STORAGE_KEY: &str = "lrgm-data";

/// Version of the canonical schema. Persisted data with any other version is
/// refused rather than silently reinterpreted.
pub const SCHEMA_VERSION: u32 = 1;

// ─── LrgmData ────────────────────────────────────────────────────────────────

/// Every contact, campaign and activity; the unit of export and persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrgmData {
  #[serde(default)]
  pub contacts:   Vec<Contact>,
  #[serde(default)]
  pub campaigns:  Vec<Campaign>,
  #[serde(default)]
  pub activities: Vec<Activity>,
}

impl LrgmData {
  pub fn is_empty(&self) -> bool {
    self.contacts.is_empty()
      && self.campaigns.is_empty()
      && self.activities.is_empty()
  }
}

// ─── LrgmFragment ────────────────────────────────────────────────────────────

/// A partial aggregate, as produced by CSV import. A `None` collection means
/// "not provided"; a `Some(vec![])` collection was provided but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrgmFragment {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contacts:   Option<Vec<Contact>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub campaigns:  Option<Vec<Campaign>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub activities: Option<Vec<Activity>>,
}

impl LrgmFragment {
  /// Append contacts, creating the collection if it was not provided yet.
  pub fn extend_contacts(&mut self, contacts: Vec<Contact>) {
    self.contacts.get_or_insert_with(Vec::new).extend(contacts);
  }

  pub fn extend_campaigns(&mut self, campaigns: Vec<Campaign>) {
    self.campaigns.get_or_insert_with(Vec::new).extend(campaigns);
  }

  pub fn extend_activities(&mut self, activities: Vec<Activity>) {
    self.activities.get_or_insert_with(Vec::new).extend(activities);
  }

  /// Number of records across all provided collections.
  pub fn len(&self) -> usize {
    self.contacts.as_ref().map_or(0, Vec::len)
      + self.campaigns.as_ref().map_or(0, Vec::len)
      + self.activities.as_ref().map_or(0, Vec::len)
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl From<LrgmData> for LrgmFragment {
  fn from(data: LrgmData) -> Self {
    Self {
      contacts:   Some(data.contacts),
      campaigns:  Some(data.campaigns),
      activities: Some(data.activities),
    }
  }
}

/// How many records [`crate::store::LrgmStore::import_data`] appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
  pub contacts:   usize,
  pub campaigns:  usize,
  pub activities: usize,
}

// ─── Persisted envelope ──────────────────────────────────────────────────────

/// The JSON document written to storage: the aggregate tagged with the schema
/// version it was written under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
  pub version: u32,
  pub state:   LrgmData,
}

impl PersistedState {
  pub fn new(state: LrgmData) -> Self { Self { version: SCHEMA_VERSION, state } }

  pub fn encode(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  /// Parse a stored document, refusing any schema version but the current one.
  pub fn decode(raw: &str) -> Result<Self> {
    // Check the version before the payload, whose shape may differ.
    let probe: VersionProbe = serde_json::from_str(raw)?;
    if probe.version != SCHEMA_VERSION {
      return Err(Error::UnsupportedSchemaVersion {
        found:    probe.version,
        expected: SCHEMA_VERSION,
      });
    }
    Ok(serde_json::from_str(raw)?)
  }
}

#[derive(Deserialize)]
struct VersionProbe {
  version: u32,
}
