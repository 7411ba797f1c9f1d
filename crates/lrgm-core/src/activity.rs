//! Activities: logged interactions with a single contact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::timestamp;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ActivityType {
  Email,
  Call,
  Meeting,
  Event,
}

/// Import reads an empty optional cell as `None`, so optional text never
/// survives an export and re-import as `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  pub id:         String,
  /// May dangle after an import; readers treat that as an unknown contact.
  pub contact_id: String,
  #[serde(with = "crate::timestamp")]
  pub date:       DateTime<Utc>,
  #[serde(rename = "type")]
  pub kind:       ActivityType,
  pub summary:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details:    Option<String>,
}

impl Activity {
  pub fn apply(&mut self, patch: &ActivityPatch) {
    if let Some(contact_id) = &patch.contact_id {
      self.contact_id.clone_from(contact_id);
    }
    if let Some(date) = patch.date {
      self.date = timestamp::normalize(date);
    }
    if let Some(kind) = patch.kind {
      self.kind = kind;
    }
    if let Some(summary) = &patch.summary {
      self.summary.clone_from(summary);
    }
    if let Some(details) = &patch.details {
      self.details.clone_from(details);
    }
  }
}

/// Input to [`crate::store::LrgmStore::add_activity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
  pub contact_id: String,
  pub date:       DateTime<Utc>,
  pub kind:       ActivityType,
  pub summary:    String,
  pub details:    Option<String>,
}

impl NewActivity {
  pub fn new(
    contact_id: impl Into<String>,
    date: DateTime<Utc>,
    kind: ActivityType,
    summary: impl Into<String>,
  ) -> Self {
    Self {
      contact_id: contact_id.into(),
      date,
      kind,
      summary: summary.into(),
      details: None,
    }
  }

  pub fn with_id(self, id: String) -> Activity {
    Activity {
      id,
      contact_id: self.contact_id,
      date: timestamp::normalize(self.date),
      kind: self.kind,
      summary: self.summary,
      details: self.details,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPatch {
  pub contact_id: Option<String>,
  pub date:       Option<DateTime<Utc>>,
  pub kind:       Option<ActivityType>,
  pub summary:    Option<String>,
  pub details:    Option<Option<String>>,
}

impl ActivityPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn kind_serializes_as_type() {
    let activity = NewActivity::new(
      "a1",
      Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap(),
      ActivityType::Call,
      "Quarterly check-in",
    )
    .with_id("t1".into());

    let json = serde_json::to_value(&activity).unwrap();
    assert_eq!(json["type"], "CALL");
    assert_eq!(json["contactId"], "a1");

    let back: Activity = serde_json::from_value(json).unwrap();
    assert_eq!(back, activity);
  }
}
