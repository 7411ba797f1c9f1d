//! [`LrgmStore`]: the single source of truth for contacts, campaigns and
//! activities.
//!
//! Mutators take `&mut self` and complete synchronously, so no caller can
//! observe a half-applied change (in particular, a contact deletion and its
//! cascade land together). After every mutation the store hands a snapshot
//! of the whole aggregate to a background writer task that owns the
//! [`Storage`] backend. Writes never block the next mutation, and a failed
//! write never rolls the in-memory state back; it is logged and reported by
//! the next [`LrgmStore::flush`].

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  activity::{Activity, ActivityPatch, NewActivity},
  campaign::{Campaign, CampaignPatch, CampaignStatus, NewCampaign},
  contact::{Contact, ContactPatch, NewContact},
  data::{ImportCounts, LrgmData, LrgmFragment, PersistedState, STORAGE_KEY},
  id::generate_id,
  storage::Storage,
  summary::DataSummary,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What [`LrgmStore::delete_contact`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactDeletion {
  pub contacts_removed:   usize,
  pub activities_removed: usize,
  /// Campaigns whose audience lost the contact.
  pub campaigns_pruned:   usize,
}

impl ContactDeletion {
  pub fn changed_anything(&self) -> bool {
    self.contacts_removed + self.activities_removed + self.campaigns_pruned > 0
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct LrgmStore {
  data:   LrgmData,
  writer: Writer,
}

impl LrgmStore {
  /// Open a store over `storage`, hydrating from it if it holds an aggregate.
  ///
  /// A storage read failure is logged and the store starts empty. A stored
  /// document that cannot be decoded (corrupt, or written under another schema
  /// version) is an error, so the next write cannot clobber it.
  ///
  /// Must be called within a tokio runtime; the writer task is spawned here.
  pub async fn open<S: Storage>(storage: S) -> Result<Self> {
    let data = match storage.load(STORAGE_KEY).await {
      Ok(Some(raw)) => PersistedState::decode(&raw)?.state,
      Ok(None) => LrgmData::default(),
      Err(e) => {
        warn!(error = %e, "failed to read persisted data; starting empty");
        LrgmData::default()
      }
    };

    debug!(
      contacts = data.contacts.len(),
      campaigns = data.campaigns.len(),
      activities = data.activities.len(),
      "opened store"
    );

    Ok(Self { data, writer: Writer::spawn(storage) })
  }

  /// Wait until every write scheduled so far has been attempted.
  ///
  /// Returns [`Error::Persist`] if any of those writes failed since the last
  /// flush. The in-memory state is authoritative either way.
  pub async fn flush(&self) -> Result<()> { self.writer.flush().await }

  fn persist(&self) { self.writer.schedule(self.data.clone()); }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn snapshot(&self) -> &LrgmData { &self.data }

  pub fn contacts(&self) -> &[Contact] { &self.data.contacts }

  pub fn campaigns(&self) -> &[Campaign] { &self.data.campaigns }

  pub fn activities(&self) -> &[Activity] { &self.data.activities }

  pub fn contact(&self, id: &str) -> Option<&Contact> {
    self.data.contacts.iter().find(|c| c.id == id)
  }

  pub fn campaign(&self, id: &str) -> Option<&Campaign> {
    self.data.campaigns.iter().find(|c| c.id == id)
  }

  pub fn activity(&self, id: &str) -> Option<&Activity> {
    self.data.activities.iter().find(|a| a.id == id)
  }

  /// The campaign's audience resolved to contacts, in audience order. Ids
  /// that no longer resolve are skipped.
  pub fn campaign_audience(&self, campaign_id: &str) -> Vec<&Contact> {
    self
      .campaign(campaign_id)
      .map(|campaign| {
        campaign
          .audience_ids
          .iter()
          .filter_map(|id| self.contact(id))
          .collect()
      })
      .unwrap_or_default()
  }

  pub fn activities_for_contact(&self, contact_id: &str) -> Vec<&Activity> {
    let mut activities: Vec<_> = self
      .data
      .activities
      .iter()
      .filter(|a| a.contact_id == contact_id)
      .collect();
    activities.sort_by(|a, b| b.date.cmp(&a.date));
    activities
  }

  /// All activities, newest first.
  pub fn timeline(&self) -> Vec<&Activity> {
    let mut activities: Vec<_> = self.data.activities.iter().collect();
    activities.sort_by(|a, b| b.date.cmp(&a.date));
    activities
  }

  /// Activities dated at or after `from`, soonest first.
  pub fn upcoming_activities(&self, from: DateTime<Utc>) -> Vec<&Activity> {
    let mut activities: Vec<_> = self
      .data
      .activities
      .iter()
      .filter(|a| a.date >= from)
      .collect();
    activities.sort_by(|a, b| a.date.cmp(&b.date));
    activities
  }

  pub fn summary(&self) -> DataSummary { DataSummary::compute(&self.data) }

  // ── Contacts ──────────────────────────────────────────────────────────────

  pub fn add_contact(&mut self, input: NewContact) -> Contact {
    let contact = input.with_id(generate_id());
    debug!(id = %contact.id, "adding contact");
    self.data.contacts.push(contact.clone());
    self.persist();
    contact
  }

  /// Merge `patch` into the contact with `id`. Returns `false` (and persists
  /// nothing) if there is no such contact.
  pub fn update_contact(&mut self, id: &str, patch: ContactPatch) -> bool {
    let mut matched = false;
    for contact in self.data.contacts.iter_mut().filter(|c| c.id == id) {
      contact.apply(&patch);
      matched = true;
    }
    if matched {
      debug!(id, "updated contact");
      self.persist();
    }
    matched
  }

  /// Delete a contact together with its activities and its audience
  /// memberships.
  pub fn delete_contact(&mut self, id: &str) -> ContactDeletion {
    let contacts_before = self.data.contacts.len();
    self.data.contacts.retain(|c| c.id != id);

    let activities_before = self.data.activities.len();
    self.data.activities.retain(|a| a.contact_id != id);

    let campaigns_pruned = self
      .data
      .campaigns
      .iter_mut()
      .map(|campaign| campaign.remove_audience_member(id))
      .filter(|pruned| *pruned)
      .count();

    let deletion = ContactDeletion {
      contacts_removed: contacts_before - self.data.contacts.len(),
      activities_removed: activities_before - self.data.activities.len(),
      campaigns_pruned,
    };

    if deletion.changed_anything() {
      debug!(
        id,
        activities = deletion.activities_removed,
        campaigns = deletion.campaigns_pruned,
        "deleted contact"
      );
      self.persist();
    }
    deletion
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  pub fn add_campaign(&mut self, input: NewCampaign) -> Campaign {
    let campaign = input.with_id(generate_id());
    debug!(id = %campaign.id, "adding campaign");
    self.data.campaigns.push(campaign.clone());
    self.persist();
    campaign
  }

  pub fn update_campaign(&mut self, id: &str, patch: CampaignPatch) -> bool {
    let mut matched = false;
    for campaign in self.data.campaigns.iter_mut().filter(|c| c.id == id) {
      campaign.apply(&patch);
      matched = true;
    }
    if matched {
      debug!(id, "updated campaign");
      self.persist();
    }
    matched
  }

  /// Flip a campaign between live and closed; returns the new status.
  pub fn toggle_campaign_status(&mut self, id: &str) -> Option<CampaignStatus> {
    let status = self.campaign(id)?.status.toggled();
    self.update_campaign(id, CampaignPatch {
      status: Some(status),
      ..Default::default()
    });
    Some(status)
  }

  pub fn delete_campaign(&mut self, id: &str) -> bool {
    let before = self.data.campaigns.len();
    self.data.campaigns.retain(|c| c.id != id);
    let removed = self.data.campaigns.len() != before;
    if removed {
      debug!(id, "deleted campaign");
      self.persist();
    }
    removed
  }

  // ── Activities ────────────────────────────────────────────────────────────

  pub fn add_activity(&mut self, input: NewActivity) -> Activity {
    let activity = input.with_id(generate_id());
    debug!(id = %activity.id, contact_id = %activity.contact_id, "adding activity");
    self.data.activities.push(activity.clone());
    self.persist();
    activity
  }

  pub fn update_activity(&mut self, id: &str, patch: ActivityPatch) -> bool {
    let mut matched = false;
    for activity in self.data.activities.iter_mut().filter(|a| a.id == id) {
      activity.apply(&patch);
      matched = true;
    }
    if matched {
      debug!(id, "updated activity");
      self.persist();
    }
    matched
  }

  pub fn delete_activity(&mut self, id: &str) -> bool {
    let before = self.data.activities.len();
    self.data.activities.retain(|a| a.id != id);
    let removed = self.data.activities.len() != before;
    if removed {
      debug!(id, "deleted activity");
      self.persist();
    }
    removed
  }

  // ── Bulk ──────────────────────────────────────────────────────────────────

  /// Append every provided collection to the existing one. Nothing is
  /// replaced, deduplicated, or checked for id collisions.
  pub fn import_data(&mut self, fragment: LrgmFragment) -> ImportCounts {
    let mut counts = ImportCounts::default();
    if let Some(contacts) = fragment.contacts {
      counts.contacts = contacts.len();
      self.data.contacts.extend(contacts);
    }
    if let Some(campaigns) = fragment.campaigns {
      counts.campaigns = campaigns.len();
      self.data.campaigns.extend(campaigns);
    }
    if let Some(activities) = fragment.activities {
      counts.activities = activities.len();
      self.data.activities.extend(activities);
    }
    debug!(
      contacts = counts.contacts,
      campaigns = counts.campaigns,
      activities = counts.activities,
      "imported data"
    );
    self.persist();
    counts
  }

  pub fn clear_all_data(&mut self) {
    debug!("clearing all data");
    self.data = LrgmData::default();
    self.persist();
  }
}

// ─── Background writer ───────────────────────────────────────────────────────

enum Command {
  Save(LrgmData),
  Flush(oneshot::Sender<Option<String>>),
}

struct Writer {
  tx: mpsc::UnboundedSender<Command>,
}

impl Writer {
  fn spawn<S: Storage>(storage: S) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_writer(storage, rx));
    Self { tx }
  }

  fn schedule(&self, snapshot: LrgmData) {
    if self.tx.send(Command::Save(snapshot)).is_err() {
      warn!("persistence writer has stopped; change kept in memory only");
    }
  }

  async fn flush(&self) -> Result<()> {
    let (reply_tx, reply_rx) = oneshot::channel();
    self
      .tx
      .send(Command::Flush(reply_tx))
      .map_err(|_| Error::Persist("persistence writer has stopped".into()))?;
    match reply_rx.await {
      Ok(None) => Ok(()),
      Ok(Some(failure)) => Err(Error::Persist(failure)),
      Err(_) => Err(Error::Persist("persistence writer has stopped".into())),
    }
  }
}

/// Owns the storage backend. Snapshots queued behind one another are
/// coalesced: only the newest is written.
async fn run_writer<S: Storage>(
  storage: S,
  mut rx: mpsc::UnboundedReceiver<Command>,
) {
  // First failure since the last flush.
  let mut failure: Option<String> = None;

  while let Some(command) = rx.recv().await {
    match command {
      Command::Save(mut snapshot) => {
        let mut pending_flush = None;
        while let Ok(next) = rx.try_recv() {
          match next {
            Command::Save(newer) => snapshot = newer,
            Command::Flush(reply) => {
              pending_flush = Some(reply);
              break;
            }
          }
        }

        if let Err(e) = write_snapshot(&storage, snapshot).await {
          warn!(error = %e, "failed to persist data");
          failure.get_or_insert_with(|| e.to_string());
        }

        if let Some(reply) = pending_flush {
          let _ = reply.send(failure.take());
        }
      }
      Command::Flush(reply) => {
        let _ = reply.send(failure.take());
      }
    }
  }
}

async fn write_snapshot<S: Storage>(storage: &S, snapshot: LrgmData) -> Result<()> {
  let raw = PersistedState::new(snapshot).encode()?;
  storage
    .save(STORAGE_KEY, raw)
    .await
    .map_err(|e| Error::Persist(e.to_string()))
}
