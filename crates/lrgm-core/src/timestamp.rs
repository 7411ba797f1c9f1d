//! Timestamp formatting and lenient parsing.
//!
//! Timestamps are stored as `DateTime<Utc>` and always written as RFC 3339
//! with millisecond precision and a `Z` suffix, e.g.
//! `2024-05-01T09:30:00.000Z`. Parsing also accepts the shorter forms that
//! date pickers and spreadsheets produce.
//!
//! The module doubles as a `#[serde(with = "crate::timestamp")]` adapter.

use chrono::{
  DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, SubsecRound,
  Utc,
};
use serde::{Deserialize, Deserializer, Serializer};

use crate::{Error, Result};

/// Local date-time layouts without an offset; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M",
];

/// The current instant, truncated to the precision that [`format`] keeps.
pub fn now() -> DateTime<Utc> { normalize(Utc::now()) }

/// Truncate `dt` to whole milliseconds, the precision [`format`] writes.
/// Every timestamp entering a record passes through here, so what is held in
/// memory is exactly what survives persistence and export.
pub fn normalize(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(3) }

pub fn format(dt: &DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp.
///
/// Tries RFC 3339 first, then offset-less date-times (as UTC), then a bare
/// `YYYY-MM-DD` date (midnight UTC). Finer than millisecond precision is
/// truncated.
pub fn parse(input: &str) -> Result<DateTime<Utc>> {
  let s = input.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(normalize(dt.with_timezone(&Utc)));
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Ok(normalize(naive.and_utc()));
    }
  }
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Ok(date.and_time(NaiveTime::MIN).and_utc());
  }

  Err(Error::InvalidTimestamp(input.to_owned()))
}

// ─── serde adapter ───────────────────────────────────────────────────────────

pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  serializer.serialize_str(&format(dt))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn formats_with_millis_and_z() {
    let dt = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    assert_eq!(format(&dt), "2024-05-01T09:30:00.000Z");
  }

  #[test]
  fn parses_rfc3339_with_offset() {
    let dt = parse("2024-05-01T11:30:00+02:00").unwrap();
    assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
  }

  #[test]
  fn parses_date_picker_forms() {
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    assert_eq!(parse("2024-05-01T09:30").unwrap(), expected);
    assert_eq!(parse("2024-05-01 09:30:00").unwrap(), expected);
    assert_eq!(
      parse("2024-05-01").unwrap(),
      Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    );
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(parse("next tuesday"), Err(Error::InvalidTimestamp(_))));
  }

  #[test]
  fn parse_truncates_to_millis() {
    let dt = parse("2024-05-01T09:30:00.123456Z").unwrap();
    assert_eq!(format(&dt), "2024-05-01T09:30:00.123Z");
    assert_eq!(parse(&format(&dt)).unwrap(), dt);

    let naive = parse("2024-05-01T09:30:00.999999").unwrap();
    assert_eq!(format(&naive), "2024-05-01T09:30:00.999Z");
  }

  #[test]
  fn now_survives_format_and_parse() {
    let dt = now();
    assert_eq!(parse(&format(&dt)).unwrap(), dt);
  }
}
