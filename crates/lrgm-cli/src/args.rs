//! Command-line arguments.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use lrgm_core::{
  activity::ActivityType,
  campaign::{CampaignChannel, CampaignStatus},
  contact::ContactCategory,
  timestamp,
};

#[derive(Parser, Debug)]
#[command(name = "lrgm", version, about = "Local relationship and growth manager")]
pub struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "lrgm.toml")]
  pub config: PathBuf,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Manage contacts.
  #[command(subcommand)]
  Contact(ContactCommand),

  /// Manage campaigns and their audiences.
  #[command(subcommand)]
  Campaign(CampaignCommand),

  /// Manage logged activities.
  #[command(subcommand)]
  Activity(ActivityCommand),

  /// Every activity, newest first.
  Timeline,

  /// Record counts by category, status and type.
  Summary,

  /// Write all data as a zip of CSV tables.
  Export {
    /// Directory to write the archive into.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out: PathBuf,
  },

  /// Append records from CSV files or an exported zip archive.
  Import {
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
  },

  /// Delete every contact, campaign and activity.
  Clear {
    /// Skip the confirmation guard.
    #[arg(long)]
    yes: bool,
  },
}

// ─── Contacts ─────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
  Add(ContactFields),
  /// Change fields of an existing contact; pass "" to clear an optional one.
  Update {
    id: String,
    #[command(flatten)]
    fields: ContactUpdate,
  },
  /// Delete a contact with its activities and audience memberships.
  Delete { id: String },
  List,
  /// A contact and its activities.
  Show { id: String },
}

#[derive(Args, Debug)]
pub struct ContactFields {
  #[arg(long)]
  pub category: ContactCategory,
  #[arg(long = "first")]
  pub first_name: String,
  #[arg(long = "last")]
  pub last_name: String,
  #[arg(long)]
  pub org: Option<String>,
  #[arg(long)]
  pub email: Option<String>,
  #[arg(long)]
  pub phone: Option<String>,
  #[arg(long)]
  pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct ContactUpdate {
  #[arg(long)]
  pub category: Option<ContactCategory>,
  #[arg(long = "first")]
  pub first_name: Option<String>,
  #[arg(long = "last")]
  pub last_name: Option<String>,
  #[arg(long)]
  pub org: Option<String>,
  #[arg(long)]
  pub email: Option<String>,
  #[arg(long)]
  pub phone: Option<String>,
  #[arg(long)]
  pub notes: Option<String>,
}

// ─── Campaigns ────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum CampaignCommand {
  Add(CampaignFields),
  /// Change fields of an existing campaign; pass "" to clear the notes.
  Update {
    id: String,
    #[command(flatten)]
    fields: CampaignUpdate,
  },
  Delete { id: String },
  /// Flip a campaign between LIVE and CLOSED.
  Toggle { id: String },
  List,
  /// Contacts in a campaign's audience.
  Audience { id: String },
}

#[derive(Args, Debug)]
pub struct CampaignFields {
  #[arg(long)]
  pub title: String,
  #[arg(long)]
  pub channel: CampaignChannel,
  /// Planned date, e.g. 2024-05-01 or 2024-05-01T10:00:00Z.
  #[arg(long = "date", value_parser = parse_timestamp)]
  pub date_planned: DateTime<Utc>,
  #[arg(long, default_value = "LIVE")]
  pub status: CampaignStatus,
  /// Comma-separated contact ids.
  #[arg(long = "audience", value_delimiter = ',')]
  pub audience_ids: Vec<String>,
  #[arg(long)]
  pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct CampaignUpdate {
  #[arg(long)]
  pub title: Option<String>,
  #[arg(long)]
  pub channel: Option<CampaignChannel>,
  #[arg(long = "date", value_parser = parse_timestamp)]
  pub date_planned: Option<DateTime<Utc>>,
  #[arg(long)]
  pub status: Option<CampaignStatus>,
  /// Replace the audience; `--audience` alone empties it.
  #[arg(long = "audience", value_delimiter = ',', num_args = 0..)]
  pub audience_ids: Option<Vec<String>>,
  #[arg(long)]
  pub notes: Option<String>,
}

// ─── Activities ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum ActivityCommand {
  Add(ActivityFields),
  /// Change fields of an existing activity; pass "" to clear the details.
  Update {
    id: String,
    #[command(flatten)]
    fields: ActivityUpdate,
  },
  Delete { id: String },
  List {
    /// Only activities dated from now on, soonest first.
    #[arg(long)]
    upcoming: bool,
  },
}

#[derive(Args, Debug)]
pub struct ActivityFields {
  #[arg(long = "contact")]
  pub contact_id: String,
  #[arg(long, value_parser = parse_timestamp)]
  pub date: DateTime<Utc>,
  #[arg(long = "type")]
  pub kind: ActivityType,
  #[arg(long)]
  pub summary: String,
  #[arg(long)]
  pub details: Option<String>,
}

#[derive(Args, Debug)]
pub struct ActivityUpdate {
  #[arg(long = "contact")]
  pub contact_id: Option<String>,
  #[arg(long, value_parser = parse_timestamp)]
  pub date: Option<DateTime<Utc>>,
  #[arg(long = "type")]
  pub kind: Option<ActivityType>,
  #[arg(long)]
  pub summary: Option<String>,
  #[arg(long)]
  pub details: Option<String>,
}

fn parse_timestamp(raw: &str) -> lrgm_core::Result<DateTime<Utc>> {
  timestamp::parse(raw)
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn command_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn parses_contact_add() {
    let cli = Cli::try_parse_from([
      "lrgm", "contact", "add", "--category", "client", "--first", "Jane",
      "--last", "Doe", "--org", "Acme",
    ])
    .unwrap();

    let Command::Contact(ContactCommand::Add(fields)) = cli.command else {
      panic!("expected contact add")
    };
    assert_eq!(fields.category, ContactCategory::Client);
    assert_eq!(fields.org.as_deref(), Some("Acme"));
    assert_eq!(cli.config, PathBuf::from("lrgm.toml"));
  }

  #[test]
  fn audience_flag_splits_and_can_be_empty() {
    let cli = Cli::try_parse_from([
      "lrgm", "campaign", "add", "--title", "Launch", "--channel", "BLOG",
      "--date", "2024-05-01", "--audience", "a1,b2",
    ])
    .unwrap();
    let Command::Campaign(CampaignCommand::Add(fields)) = cli.command else {
      panic!("expected campaign add")
    };
    assert_eq!(fields.audience_ids, ["a1", "b2"]);
    assert_eq!(fields.status, CampaignStatus::Live);

    let cli =
      Cli::try_parse_from(["lrgm", "campaign", "update", "c1", "--audience"])
        .unwrap();
    let Command::Campaign(CampaignCommand::Update { fields, .. }) = cli.command
    else {
      panic!("expected campaign update")
    };
    assert_eq!(fields.audience_ids, Some(vec![]));
  }

  #[test]
  fn rejects_unknown_channel() {
    let result = Cli::try_parse_from([
      "lrgm", "campaign", "add", "--title", "Launch", "--channel", "PODCAST",
      "--date", "2024-05-01",
    ]);
    assert!(result.is_err());
  }

  #[test]
  fn import_requires_a_file() {
    assert!(Cli::try_parse_from(["lrgm", "import"]).is_err());
  }
}
