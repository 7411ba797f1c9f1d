//! Command dispatch and plain-text rendering.

use anyhow::{Context as _, bail};
use lrgm_core::{
  LrgmStore,
  activity::{Activity, ActivityPatch, NewActivity},
  campaign::{Campaign, CampaignPatch, NewCampaign},
  contact::{Contact, ContactPatch, NewContact},
  summary, timestamp,
};
use lrgm_csv::{FileOutcome, ImportReport};

use crate::{
  CliConfig,
  args::{
    ActivityCommand, ActivityUpdate, CampaignCommand, CampaignUpdate, Command,
    ContactCommand, ContactUpdate,
  },
};

const UNKNOWN_CONTACT: &str = "unknown contact";

pub async fn run(
  store: &mut LrgmStore,
  cfg: &CliConfig,
  command: Command,
) -> anyhow::Result<()> {
  match command {
    Command::Contact(cmd) => contact(store, cmd),
    Command::Campaign(cmd) => campaign(store, cmd),
    Command::Activity(cmd) => activity(store, cmd),
    Command::Timeline => {
      for a in store.timeline() {
        println!("{}", activity_line(store, a));
      }
      Ok(())
    }
    Command::Summary => {
      print_summary(store);
      Ok(())
    }
    Command::Export { out } => {
      let today = chrono::Local::now().date_naive();
      let archive = lrgm_csv::export_archive(store.snapshot(), &cfg.product, today)
        .context("failed to build export")?;
      let path = archive
        .write_to_dir(&out)
        .await
        .with_context(|| format!("failed to write export to {}", out.display()))?;
      println!("{}", path.display());
      Ok(())
    }
    Command::Import { files } => {
      let report = lrgm_csv::import_paths(&files).await;
      print_import_report(&report);
      let counts = store.import_data(report.fragment);
      println!(
        "imported {} contacts, {} campaigns, {} activities",
        counts.contacts, counts.campaigns, counts.activities
      );
      Ok(())
    }
    Command::Clear { yes } => {
      if !yes {
        bail!("refusing to delete all data without --yes");
      }
      store.clear_all_data();
      println!("all data cleared");
      Ok(())
    }
  }
}

// ─── Contacts ─────────────────────────────────────────────────────────────────

fn contact(store: &mut LrgmStore, cmd: ContactCommand) -> anyhow::Result<()> {
  match cmd {
    ContactCommand::Add(f) => {
      let contact = store.add_contact(NewContact {
        category:   f.category,
        first_name: f.first_name,
        last_name:  f.last_name,
        org:        f.org,
        email:      f.email,
        phone:      f.phone,
        notes:      f.notes,
      });
      println!("{}", contact.id);
    }
    ContactCommand::Update { id, fields } => {
      if !store.update_contact(&id, contact_patch(fields)) {
        bail!("no contact with id {id}");
      }
    }
    ContactCommand::Delete { id } => {
      let deletion = store.delete_contact(&id);
      if !deletion.changed_anything() {
        bail!("no contact with id {id}");
      }
      println!(
        "deleted {} contact(s), {} activities, pruned {} campaign audience(s)",
        deletion.contacts_removed,
        deletion.activities_removed,
        deletion.campaigns_pruned
      );
    }
    ContactCommand::List => {
      for c in store.contacts() {
        println!("{}", contact_line(c));
      }
    }
    ContactCommand::Show { id } => {
      let Some(c) = store.contact(&id) else {
        bail!("no contact with id {id}");
      };
      println!("{}", contact_line(c));
      for (label, value) in [("email", &c.email), ("phone", &c.phone), ("notes", &c.notes)]
      {
        if let Some(value) = value {
          println!("  {label}: {value}");
        }
      }
      for a in store.activities_for_contact(&id) {
        println!("  {}", activity_line(store, a));
      }
    }
  }
  Ok(())
}

fn contact_patch(f: ContactUpdate) -> ContactPatch {
  ContactPatch {
    category:   f.category,
    first_name: f.first_name,
    last_name:  f.last_name,
    org:        clearable(f.org),
    email:      clearable(f.email),
    phone:      clearable(f.phone),
    notes:      clearable(f.notes),
  }
}

fn contact_line(c: &Contact) -> String {
  let org = c.org.as_deref().map(|o| format!(" ({o})")).unwrap_or_default();
  format!("{}  {:<8}  {}{org}", c.id, c.category, c.display_name())
}

// ─── Campaigns ────────────────────────────────────────────────────────────────

fn campaign(store: &mut LrgmStore, cmd: CampaignCommand) -> anyhow::Result<()> {
  match cmd {
    CampaignCommand::Add(f) => {
      let campaign = store.add_campaign(NewCampaign {
        title:        f.title,
        channel:      f.channel,
        date_planned: f.date_planned,
        status:       f.status,
        audience_ids: f.audience_ids,
        notes:        f.notes,
      });
      println!("{}", campaign.id);
    }
    CampaignCommand::Update { id, fields } => {
      if !store.update_campaign(&id, campaign_patch(fields)) {
        bail!("no campaign with id {id}");
      }
    }
    CampaignCommand::Delete { id } => {
      if !store.delete_campaign(&id) {
        bail!("no campaign with id {id}");
      }
    }
    CampaignCommand::Toggle { id } => {
      let Some(status) = store.toggle_campaign_status(&id) else {
        bail!("no campaign with id {id}");
      };
      println!("{status}");
    }
    CampaignCommand::List => {
      for c in store.campaigns() {
        println!("{}", campaign_line(c));
      }
    }
    CampaignCommand::Audience { id } => {
      let Some(c) = store.campaign(&id) else {
        bail!("no campaign with id {id}");
      };
      let audience = store.campaign_audience(&id);
      let dangling = c.audience_ids.len().saturating_sub(audience.len());
      for contact in audience {
        println!("{}", contact_line(contact));
      }
      if dangling > 0 {
        println!("({dangling} {UNKNOWN_CONTACT} id(s) not shown)");
      }
    }
  }
  Ok(())
}

fn campaign_patch(f: CampaignUpdate) -> CampaignPatch {
  CampaignPatch {
    title:        f.title,
    channel:      f.channel,
    date_planned: f.date_planned,
    status:       f.status,
    audience_ids: f.audience_ids,
    notes:        clearable(f.notes),
  }
}

fn campaign_line(c: &Campaign) -> String {
  format!(
    "{}  {}  {:<10}  {:<6}  {}  [{} in audience]",
    c.id,
    timestamp::format(&c.date_planned),
    c.channel,
    c.status,
    c.title,
    c.audience_ids.len()
  )
}

// ─── Activities ───────────────────────────────────────────────────────────────

fn activity(store: &mut LrgmStore, cmd: ActivityCommand) -> anyhow::Result<()> {
  match cmd {
    ActivityCommand::Add(f) => {
      let activity = store.add_activity(NewActivity {
        contact_id: f.contact_id,
        date:       f.date,
        kind:       f.kind,
        summary:    f.summary,
        details:    f.details,
      });
      println!("{}", activity.id);
    }
    ActivityCommand::Update { id, fields } => {
      if !store.update_activity(&id, activity_patch(fields)) {
        bail!("no activity with id {id}");
      }
    }
    ActivityCommand::Delete { id } => {
      if !store.delete_activity(&id) {
        bail!("no activity with id {id}");
      }
    }
    ActivityCommand::List { upcoming } => {
      let activities = if upcoming {
        store.upcoming_activities(timestamp::now())
      } else {
        store.activities().iter().collect()
      };
      for a in activities {
        println!("{}", activity_line(store, a));
      }
    }
  }
  Ok(())
}

fn activity_patch(f: ActivityUpdate) -> ActivityPatch {
  ActivityPatch {
    contact_id: f.contact_id,
    date:       f.date,
    kind:       f.kind,
    summary:    f.summary,
    details:    clearable(f.details),
  }
}

fn activity_line(store: &LrgmStore, a: &Activity) -> String {
  let who = store
    .contact(&a.contact_id)
    .map_or_else(|| UNKNOWN_CONTACT.to_owned(), Contact::display_name);
  format!(
    "{}  {}  {:<7}  {who}: {}",
    a.id,
    timestamp::format(&a.date),
    a.kind,
    a.summary
  )
}

// ─── Reports ──────────────────────────────────────────────────────────────────

fn print_summary(store: &LrgmStore) {
  let s = store.summary();
  println!("contacts:   {}", s.contacts);
  for (category, n) in &s.contacts_by_category {
    println!("  {category:<10} {n}");
  }
  println!("campaigns:  {}", s.campaigns);
  for (status, n) in &s.campaigns_by_status {
    println!("  {status:<10} {n}");
  }
  println!("activities: {}", s.activities);
  for (kind, n) in &s.activities_by_type {
    println!("  {kind:<10} {n}");
  }
  let this_month = summary::activities_in_month(store.snapshot(), timestamp::now());
  println!("activities this month: {this_month}");
}

fn print_import_report(report: &ImportReport) {
  for file in &report.files {
    match &file.outcome {
      FileOutcome::Skipped => println!("{}: skipped (unrecognised name)", file.name),
      FileOutcome::Imported { records, rejected } => {
        println!("{}: {records} record(s)", file.name);
        for row in rejected {
          println!("  line {}: {}", row.line, row.error);
        }
      }
      FileOutcome::Failed(error) => println!("{}: failed: {error}", file.name),
    }
  }
}

/// An empty value clears an optional field.
fn clearable(value: Option<String>) -> Option<Option<String>> {
  value.map(|v| (!v.is_empty()).then_some(v))
}
