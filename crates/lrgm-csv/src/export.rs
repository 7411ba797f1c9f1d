//! CSV table writers.
//!
//! Quoting follows RFC 4180 via the `csv` crate: a field is quoted only when
//! it contains the delimiter, a quote, or a line break. Absent optional fields
//! become empty cells.

use csv::{Terminator, WriterBuilder};
use lrgm_core::{
  activity::Activity, campaign::Campaign, contact::Contact, timestamp,
};

use crate::{
  ACTIVITY_COLUMNS, AUDIENCE_SEPARATOR, CAMPAIGN_COLUMNS, CONTACT_COLUMNS,
  Error, Result,
};

fn opt(value: &Option<String>) -> &str { value.as_deref().unwrap_or("") }

/// Write a header and rows into a CSV string.
fn write_table<'a, const N: usize>(
  columns: [&str; N],
  rows: impl IntoIterator<Item = [&'a str; N]>,
) -> Result<String> {
  let mut writer = WriterBuilder::new()
    .terminator(Terminator::CRLF)
    .from_writer(Vec::new());

  writer.write_record(columns)?;
  for row in rows {
    writer.write_record(row)?;
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| Error::Io(e.into_error()))?;
  String::from_utf8(bytes).map_err(|e| Error::Utf8(e.utf8_error()))
}

pub(crate) fn contacts(contacts: &[Contact]) -> Result<String> {
  write_table(
    CONTACT_COLUMNS,
    contacts.iter().map(|c| {
      [
        c.id.as_str(),
        c.category.as_ref(),
        c.first_name.as_str(),
        c.last_name.as_str(),
        opt(&c.org),
        opt(&c.email),
        opt(&c.phone),
        opt(&c.notes),
      ]
    }),
  )
}

pub(crate) fn campaigns(campaigns: &[Campaign]) -> Result<String> {
  // Owned cells must outlive the borrowed rows.
  let cells: Vec<(String, String)> = campaigns
    .iter()
    .map(|c| {
      (
        timestamp::format(&c.date_planned),
        c.audience_ids.join(AUDIENCE_SEPARATOR),
      )
    })
    .collect();

  write_table(
    CAMPAIGN_COLUMNS,
    campaigns.iter().zip(&cells).map(|(c, (date_planned, audience))| {
      [
        c.id.as_str(),
        c.title.as_str(),
        c.channel.as_ref(),
        date_planned.as_str(),
        c.status.as_ref(),
        audience.as_str(),
        opt(&c.notes),
      ]
    }),
  )
}

pub(crate) fn activities(activities: &[Activity]) -> Result<String> {
  let dates: Vec<String> =
    activities.iter().map(|a| timestamp::format(&a.date)).collect();

  write_table(
    ACTIVITY_COLUMNS,
    activities.iter().zip(&dates).map(|(a, date)| {
      [
        a.id.as_str(),
        a.contact_id.as_str(),
        date.as_str(),
        a.kind.as_ref(),
        a.summary.as_str(),
        opt(&a.details),
      ]
    }),
  )
}
