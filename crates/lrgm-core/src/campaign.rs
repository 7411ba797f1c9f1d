//! Campaigns: planned outreach sent to an audience of contacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::timestamp;

// ─── Enums ───────────────────────────────────────────────────────────────────

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
pub enum CampaignChannel {
  Blog,
  Newsletter,
  Webinar,
  Dinner,
}

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
pub enum CampaignStatus {
  Live,
  Closed,
}

impl CampaignStatus {
  /// The other status; campaigns move freely between the two.
  pub fn toggled(self) -> Self {
    match self {
      Self::Live => Self::Closed,
      Self::Closed => Self::Live,
    }
  }
}

// ─── Campaign ────────────────────────────────────────────────────────────────

/// Import reads an empty optional cell as `None`, so optional text never
/// survives an export and re-import as `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
  pub id:           String,
  pub title:        String,
  pub channel:      CampaignChannel,
  #[serde(with = "crate::timestamp")]
  pub date_planned: DateTime<Utc>,
  pub status:       CampaignStatus,
  /// Contact ids, in the order they were added.
  #[serde(default)]
  pub audience_ids: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:        Option<String>,
}

impl Campaign {
  pub fn has_audience_member(&self, contact_id: &str) -> bool {
    self.audience_ids.iter().any(|id| id == contact_id)
  }

  /// Drop every occurrence of `contact_id` from the audience. Returns whether
  /// anything was removed.
  pub fn remove_audience_member(&mut self, contact_id: &str) -> bool {
    let before = self.audience_ids.len();
    self.audience_ids.retain(|id| id != contact_id);
    self.audience_ids.len() != before
  }

  pub fn apply(&mut self, patch: &CampaignPatch) {
    if let Some(title) = &patch.title {
      self.title.clone_from(title);
    }
    if let Some(channel) = patch.channel {
      self.channel = channel;
    }
    if let Some(date_planned) = patch.date_planned {
      self.date_planned = timestamp::normalize(date_planned);
    }
    if let Some(status) = patch.status {
      self.status = status;
    }
    if let Some(audience_ids) = &patch.audience_ids {
      self.audience_ids.clone_from(audience_ids);
    }
    if let Some(notes) = &patch.notes {
      self.notes.clone_from(notes);
    }
  }
}

// ─── NewCampaign ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::LrgmStore::add_campaign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
  pub title:        String,
  pub channel:      CampaignChannel,
  pub date_planned: DateTime<Utc>,
  pub status:       CampaignStatus,
  pub audience_ids: Vec<String>,
  pub notes:        Option<String>,
}

impl NewCampaign {
  /// A live campaign with an empty audience.
  pub fn new(
    title: impl Into<String>,
    channel: CampaignChannel,
    date_planned: DateTime<Utc>,
  ) -> Self {
    Self {
      title: title.into(),
      channel,
      date_planned,
      status: CampaignStatus::Live,
      audience_ids: Vec::new(),
      notes: None,
    }
  }

  pub fn with_id(self, id: String) -> Campaign {
    Campaign {
      id,
      title: self.title,
      channel: self.channel,
      date_planned: timestamp::normalize(self.date_planned),
      status: self.status,
      audience_ids: self.audience_ids,
      notes: self.notes,
    }
  }
}

// ─── CampaignPatch ───────────────────────────────────────────────────────────

/// A partial update. `audience_ids` replaces the whole audience when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignPatch {
  pub title:        Option<String>,
  pub channel:      Option<CampaignChannel>,
  pub date_planned: Option<DateTime<Utc>>,
  pub status:       Option<CampaignStatus>,
  pub audience_ids: Option<Vec<String>>,
  pub notes:        Option<Option<String>>,
}

impl CampaignPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}
