//! Store behaviour against [`MemoryStorage`].

use std::collections::HashSet;

use chrono::{TimeDelta, TimeZone, Utc};

use crate::{
  Error, LrgmStore, MemoryStorage,
  activity::{Activity, ActivityType, NewActivity},
  campaign::{Campaign, CampaignChannel, CampaignStatus, NewCampaign},
  contact::{Contact, ContactCategory, ContactPatch, NewContact},
  data::{LrgmData, LrgmFragment, PersistedState, STORAGE_KEY},
  summary::activities_in_month,
};

async fn store() -> (LrgmStore, MemoryStorage) {
  let storage = MemoryStorage::new();
  let store = LrgmStore::open(storage.clone()).await.expect("open store");
  (store, storage)
}

fn persisted(storage: &MemoryStorage) -> LrgmData {
  let raw = storage.get(STORAGE_KEY).expect("aggregate was written");
  PersistedState::decode(&raw).expect("decodable").state
}

fn contact(id: &str, first: &str, last: &str) -> Contact {
  NewContact::new(ContactCategory::Client, first, last).with_id(id.into())
}

fn campaign(id: &str, audience: &[&str]) -> Campaign {
  NewCampaign {
    audience_ids: audience.iter().map(|s| (*s).to_owned()).collect(),
    ..NewCampaign::new(
      "Launch webinar",
      CampaignChannel::Webinar,
      Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap(),
    )
  }
  .with_id(id.into())
}

fn activity(id: &str, contact_id: &str, day: u32) -> Activity {
  NewActivity::new(
    contact_id,
    Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
    ActivityType::Meeting,
    "Coffee",
  )
  .with_id(id.into())
}

fn seeded(contacts: Vec<Contact>, campaigns: Vec<Campaign>, activities: Vec<Activity>) -> LrgmFragment {
  LrgmFragment {
    contacts:   Some(contacts),
    campaigns:  Some(campaigns),
    activities: Some(activities),
  }
}

// ─── Adding ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_assigns_fresh_ids_in_insertion_order() {
  let (mut s, _) = store().await;

  let jane = s.add_contact(NewContact::new(ContactCategory::Client, "Jane", "Doe"));
  let john = s.add_contact(NewContact::new(ContactCategory::Partner, "John", "Roe"));

  assert_ne!(jane.id, john.id);
  assert!(!jane.id.contains(';'));
  let names: Vec<_> = s.contacts().iter().map(|c| c.first_name.as_str()).collect();
  assert_eq!(names, ["Jane", "John"]);
}

#[tokio::test]
async fn generated_ids_never_repeat() {
  let (mut s, _) = store().await;
  let mut ids = HashSet::new();

  for i in 0..50 {
    let c = s.add_contact(NewContact::new(ContactCategory::Prospect, format!("P{i}"), "X"));
    let camp = s.add_campaign(NewCampaign::new(
      "Newsletter",
      CampaignChannel::Newsletter,
      Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let a = s.add_activity(NewActivity::new(
      c.id.clone(),
      Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
      ActivityType::Email,
      "Intro",
    ));
    assert!(ids.insert(c.id));
    assert!(ids.insert(camp.id));
    assert!(ids.insert(a.id));
  }
  assert_eq!(ids.len(), 150);
}

// ─── Updating ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn partial_update_preserves_untouched_fields() {
  let (mut s, _) = store().await;
  let added = s.add_contact(NewContact {
    org: Some("Acme".into()),
    email: Some("jane@acme.test".into()),
    ..NewContact::new(ContactCategory::Client, "Jane", "Doe")
  });

  let updated = s.update_contact(&added.id, ContactPatch {
    phone: Some(Some("555".into())),
    ..Default::default()
  });

  assert!(updated);
  let c = s.contact(&added.id).unwrap();
  assert_eq!(c.phone.as_deref(), Some("555"));
  assert_eq!(c.first_name, "Jane");
  assert_eq!(c.last_name, "Doe");
  assert_eq!(c.org.as_deref(), Some("Acme"));
  assert_eq!(c.email.as_deref(), Some("jane@acme.test"));
  assert_eq!(c.category, ContactCategory::Client);
}

#[tokio::test]
async fn update_unknown_id_is_a_no_op() {
  let (mut s, storage) = store().await;

  let updated = s.update_contact("missing", ContactPatch {
    first_name: Some("Ghost".into()),
    ..Default::default()
  });

  assert!(!updated);
  s.flush().await.unwrap();
  assert_eq!(storage.write_count(), 0);
}

#[tokio::test]
async fn toggle_campaign_status_flips_both_ways() {
  let (mut s, _) = store().await;
  s.import_data(seeded(vec![], vec![campaign("c1", &[])], vec![]));

  assert_eq!(s.toggle_campaign_status("c1"), Some(CampaignStatus::Closed));
  assert_eq!(s.toggle_campaign_status("c1"), Some(CampaignStatus::Live));
  assert_eq!(s.toggle_campaign_status("nope"), None);
}

// ─── Cascade ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_contact_cascades_to_activities_and_audiences() {
  let (mut s, storage) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe")],
    vec![campaign("c1", &["a1", "b2"])],
    vec![activity("t1", "a1", 3)],
  ));

  let deletion = s.delete_contact("a1");

  assert_eq!(deletion.contacts_removed, 1);
  assert_eq!(deletion.activities_removed, 1);
  assert_eq!(deletion.campaigns_pruned, 1);
  assert!(s.contacts().is_empty());
  assert!(s.activities().is_empty());
  assert_eq!(s.campaign("c1").unwrap().audience_ids, vec!["b2"]);

  // The persisted aggregate carries the whole cascade too.
  s.flush().await.unwrap();
  let saved = persisted(&storage);
  assert!(saved.contacts.is_empty());
  assert!(saved.activities.is_empty());
  assert_eq!(saved.campaigns[0].audience_ids, vec!["b2"]);
}

#[tokio::test]
async fn cascade_leaves_other_contacts_alone() {
  let (mut s, _) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe"), contact("b2", "Bob", "Roe")],
    vec![campaign("c1", &["a1", "b2"]), campaign("c2", &["a1"])],
    vec![activity("t1", "a1", 1), activity("t2", "b2", 2), activity("t3", "a1", 3)],
  ));

  s.delete_contact("a1");

  assert!(s.activities().iter().all(|a| a.contact_id != "a1"));
  assert!(s.campaigns().iter().all(|c| !c.has_audience_member("a1")));
  assert_eq!(s.contacts().len(), 1);
  assert_eq!(s.activities().len(), 1);
  // Campaigns survive even when their audience empties.
  assert_eq!(s.campaigns().len(), 2);
  assert!(s.campaign("c2").unwrap().audience_ids.is_empty());
}

#[tokio::test]
async fn delete_campaign_and_activity() {
  let (mut s, _) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe")],
    vec![campaign("c1", &["a1"])],
    vec![activity("t1", "a1", 1)],
  ));

  assert!(s.delete_campaign("c1"));
  assert!(!s.delete_campaign("c1"));
  assert!(s.delete_activity("t1"));
  assert!(!s.delete_activity("t1"));
  assert_eq!(s.contacts().len(), 1);
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_appends_without_deduplicating() {
  let (mut s, _) = store().await;
  s.import_data(seeded(vec![contact("a1", "Jane", "Doe")], vec![], vec![]));

  let counts = s.import_data(LrgmFragment {
    contacts: Some(vec![contact("a1", "Jane", "Doe"), contact("b2", "Bob", "Roe")]),
    ..Default::default()
  });

  assert_eq!(counts.contacts, 2);
  let ids: Vec<_> = s.contacts().iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, ["a1", "a1", "b2"]);
}

#[tokio::test]
async fn import_leaves_absent_collections_untouched() {
  let (mut s, _) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe")],
    vec![campaign("c1", &[])],
    vec![activity("t1", "a1", 1)],
  ));

  s.import_data(LrgmFragment {
    activities: Some(vec![activity("t2", "a1", 2)]),
    ..Default::default()
  });

  assert_eq!(s.contacts().len(), 1);
  assert_eq!(s.campaigns().len(), 1);
  assert_eq!(s.activities().len(), 2);
}

#[tokio::test]
async fn clear_all_data_empties_everything() {
  let (mut s, storage) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe")],
    vec![campaign("c1", &["a1"])],
    vec![activity("t1", "a1", 1)],
  ));

  s.clear_all_data();
  s.flush().await.unwrap();

  assert!(s.snapshot().is_empty());
  assert!(persisted(&storage).is_empty());
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopen_hydrates_from_storage() {
  let (mut s, storage) = store().await;
  let jane = s.add_contact(NewContact::new(ContactCategory::Client, "Jane", "Doe"));
  s.add_activity(NewActivity::new(
    jane.id.clone(),
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    ActivityType::Call,
    "Intro call",
  ));
  s.flush().await.unwrap();
  let before = s.snapshot().clone();
  drop(s);

  let reopened = LrgmStore::open(storage).await.unwrap();
  assert_eq!(reopened.snapshot(), &before);
}

#[tokio::test]
async fn sub_millisecond_dates_match_after_reopen() {
  let (mut s, storage) = store().await;
  let date = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    + TimeDelta::microseconds(123_456);

  let added =
    s.add_activity(NewActivity::new("a1", date, ActivityType::Call, "Intro call"));
  let planned = s.add_campaign(NewCampaign::new("Launch", CampaignChannel::Blog, date));
  s.update_activity(&added.id, crate::activity::ActivityPatch {
    date: Some(date + TimeDelta::microseconds(1)),
    ..Default::default()
  });
  assert_eq!(planned.date_planned.timestamp_subsec_micros(), 123_000);
  assert_eq!(s.activity(&added.id).unwrap().date.timestamp_subsec_micros(), 123_000);

  s.flush().await.unwrap();
  let before = s.snapshot().clone();
  drop(s);

  let reopened = LrgmStore::open(storage).await.unwrap();
  assert_eq!(reopened.snapshot(), &before);
}

#[tokio::test]
async fn empty_storage_opens_empty() {
  let (s, _) = store().await;
  assert!(s.snapshot().is_empty());
}

#[tokio::test]
async fn failed_write_keeps_memory_and_surfaces_on_flush() {
  let (mut s, storage) = store().await;
  storage.set_fail_writes(true);

  s.add_contact(NewContact::new(ContactCategory::Client, "Jane", "Doe"));

  assert!(matches!(s.flush().await, Err(Error::Persist(_))));
  assert_eq!(s.contacts().len(), 1);

  // The failure is reported once; later writes go through again.
  storage.set_fail_writes(false);
  assert!(s.flush().await.is_ok());
  s.add_contact(NewContact::new(ContactCategory::Partner, "John", "Roe"));
  s.flush().await.unwrap();
  assert_eq!(persisted(&storage).contacts.len(), 2);
}

#[tokio::test]
async fn unsupported_schema_version_refuses_to_open() {
  let storage = MemoryStorage::new();
  storage.insert(STORAGE_KEY, r#"{"version":0,"state":{"contacts":[]}}"#);

  let result = LrgmStore::open(storage).await;
  assert!(matches!(
    result,
    Err(Error::UnsupportedSchemaVersion { found: 0, expected: 1 })
  ));
}

#[tokio::test]
async fn corrupt_document_refuses_to_open() {
  let storage = MemoryStorage::new();
  storage.insert(STORAGE_KEY, "not json");

  assert!(matches!(
    LrgmStore::open(storage).await,
    Err(Error::Serialization(_))
  ));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn campaign_audience_skips_dangling_ids() {
  let (mut s, _) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe"), contact("b2", "Bob", "Roe")],
    vec![campaign("c1", &["b2", "ghost", "a1"])],
    vec![],
  ));

  let names: Vec<_> = s
    .campaign_audience("c1")
    .iter()
    .map(|c| c.display_name())
    .collect();
  assert_eq!(names, ["Bob Roe", "Jane Doe"]);
  assert!(s.campaign_audience("missing").is_empty());
}

#[tokio::test]
async fn timeline_is_newest_first() {
  let (mut s, _) = store().await;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe")],
    vec![],
    vec![activity("t1", "a1", 2), activity("t2", "a1", 9), activity("t3", "a1", 5)],
  ));

  let ids: Vec<_> = s.timeline().iter().map(|a| a.id.as_str()).collect();
  assert_eq!(ids, ["t2", "t3", "t1"]);

  let from = Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap();
  let upcoming: Vec<_> = s.upcoming_activities(from).iter().map(|a| a.id.as_str()).collect();
  assert_eq!(upcoming, ["t3", "t2"]);
}

#[tokio::test]
async fn summary_counts_every_variant() {
  let (mut s, _) = store().await;
  let mut prospect = contact("b2", "Bob", "Roe");
  prospect.category = ContactCategory::Prospect;
  s.import_data(seeded(
    vec![contact("a1", "Jane", "Doe"), prospect],
    vec![campaign("c1", &[])],
    vec![activity("t1", "a1", 2), activity("t2", "a1", 9)],
  ));

  let summary = s.summary();
  assert_eq!(summary.contacts, 2);
  assert_eq!(summary.contacts_by_category[&ContactCategory::Client], 1);
  assert_eq!(summary.contacts_by_category[&ContactCategory::Partner], 0);
  assert_eq!(summary.contacts_by_category[&ContactCategory::Prospect], 1);
  assert_eq!(summary.campaigns_by_status[&CampaignStatus::Live], 1);
  assert_eq!(summary.activities_by_type[&ActivityType::Meeting], 2);
  assert_eq!(summary.activities_by_type[&ActivityType::Call], 0);

  let may = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
  assert_eq!(activities_in_month(s.snapshot(), may), 2);
}
