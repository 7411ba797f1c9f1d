//! Aggregate counts over the store, as printed by `lrgm summary`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use strum::IntoEnumIterator;

use crate::{
  activity::ActivityType,
  campaign::CampaignStatus,
  contact::ContactCategory,
  data::LrgmData,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSummary {
  pub contacts:             usize,
  pub campaigns:            usize,
  pub activities:           usize,
  /// Every category is present, including those with a count of zero.
  pub contacts_by_category: BTreeMap<ContactCategory, usize>,
  pub campaigns_by_status:  BTreeMap<CampaignStatus, usize>,
  pub activities_by_type:   BTreeMap<ActivityType, usize>,
}

impl DataSummary {
  pub fn compute(data: &LrgmData) -> Self {
    let mut contacts_by_category: BTreeMap<_, _> =
      ContactCategory::iter().map(|c| (c, 0)).collect();
    for contact in &data.contacts {
      *contacts_by_category.entry(contact.category).or_default() += 1;
    }

    let mut campaigns_by_status: BTreeMap<_, _> =
      CampaignStatus::iter().map(|s| (s, 0)).collect();
    for campaign in &data.campaigns {
      *campaigns_by_status.entry(campaign.status).or_default() += 1;
    }

    let mut activities_by_type: BTreeMap<_, _> =
      ActivityType::iter().map(|t| (t, 0)).collect();
    for activity in &data.activities {
      *activities_by_type.entry(activity.kind).or_default() += 1;
    }

    Self {
      contacts: data.contacts.len(),
      campaigns: data.campaigns.len(),
      activities: data.activities.len(),
      contacts_by_category,
      campaigns_by_status,
      activities_by_type,
    }
  }
}

/// Number of activities dated in the same calendar month (UTC) as `at`.
pub fn activities_in_month(data: &LrgmData, at: DateTime<Utc>) -> usize {
  data
    .activities
    .iter()
    .filter(|a| a.date.year() == at.year() && a.date.month() == at.month())
    .count()
}
