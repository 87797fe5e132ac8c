//! Parsing of spreadsheet/CSV rows into worklog entries.

use chrono::{
  DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
  TimeZone,
};
use chrono_tz::Tz;
use std::path::Path;

use super::target::TimeLogEntry;
use crate::error::{Error, Result};

/// Accepted datetime formats, tried in order. First match wins.
const DATETIME_FORMATS: &[&str] = &[
  // 10/24/2024 4:15 PM
  "%m/%d/%Y %I:%M %p",
  // 2024-10-24 16:15:00
  "%Y-%m-%d %H:%M:%S",
];

/// Date-only fallback, interpreted as midnight
const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MIN_FIELDS: usize = 4;

/// Column arrangement of the incoming rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RowLayout {
  /// `[datetime, hours, comment, task, extra comment?]`, or
  /// `[date, time, hours, comment, task]` when the second cell is not hours
  #[default]
  TimeLog,
  /// `[date, time, hours, task, comment?]`
  Worksheet,
}

/// The cells of one row, before any conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow<'a> {
  pub datetime: String,
  pub hours: &'a str,
  pub comment: String,
  pub task_reference: &'a str,
}

impl RowLayout {
  pub fn split<'a>(&self, row: &'a [String]) -> Result<RawRow<'a>> {
    if row.len() < MIN_FIELDS {
      return Err(Error::MissingFields {
        expected: MIN_FIELDS,
        actual: row.len(),
      });
    }

    let raw = match self {
      RowLayout::TimeLog if has_time_cell(row) => RawRow {
        datetime: join_date_time(&row[0], &row[1]),
        hours: &row[2],
        comment: row[3].trim().to_string(),
        task_reference: &row[4],
      },
      RowLayout::TimeLog => RawRow {
        datetime: row[0].trim().to_string(),
        hours: &row[1],
        comment: join_comments(&row[2], row.get(4).map(String::as_str).unwrap_or("")),
        task_reference: &row[3],
      },
      RowLayout::Worksheet => RawRow {
        datetime: join_date_time(&row[0], &row[1]),
        hours: &row[2],
        task_reference: &row[3],
        comment: row.get(4).map(|c| c.trim().to_string()).unwrap_or_default(),
      },
    };

    Ok(raw)
  }
}

/// A five-cell time-log row carries a separate time cell only when its
/// second cell is not a number of hours and its fifth cell names a task.
fn has_time_cell(row: &[String]) -> bool {
  match row.get(4) {
    Some(task) if !task.trim().is_empty() => row[1].trim().parse::<f64>().is_err(),
    _ => false,
  }
}

fn join_comments(comment: &str, extra: &str) -> String {
  match (comment.trim(), extra.trim()) {
    (comment, "") => comment.to_string(),
    ("", extra) => extra.to_string(),
    (comment, extra) => format!("{} {}", comment, extra),
  }
}

fn join_date_time(date: &str, time: &str) -> String {
  format!("{} {}", date.trim(), time.trim())
}

/// Parse one row into an entry localized to `tz`.
pub fn parse_row(row: &[String], layout: RowLayout, tz: Tz) -> Result<TimeLogEntry> {
  let raw = layout.split(row)?;

  let task_id = task_id_from_reference(raw.task_reference).ok_or_else(|| Error::InvalidTaskId {
    value: raw.task_reference.to_string(),
  })?;
  let naive = parse_datetime(&raw.datetime)?;
  let seconds = hours_to_seconds(raw.hours)?;

  Ok(TimeLogEntry {
    task_id: task_id.to_string(),
    started: localize(naive, tz),
    seconds,
    comment: raw.comment,
  })
}

/// The first whitespace-delimited token of a task reference is the ID.
pub fn task_id_from_reference(reference: &str) -> Option<&str> {
  reference.split_whitespace().next()
}

pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
  let value = value.trim();

  for format in DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
      return Ok(dt);
    }
  }

  NaiveDate::parse_from_str(value, DATE_FORMAT)
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .ok_or_else(|| Error::ParseFailure {
      value: value.to_string(),
    })
}

/// Attach the reference zone to a naive timestamp.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times in a
/// DST gap keep the offset in effect before the transition.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<FixedOffset> {
  match tz.from_local_datetime(&naive) {
    LocalResult::Single(dt) => dt.fixed_offset(),
    LocalResult::Ambiguous(earliest, _) => earliest.fixed_offset(),
    LocalResult::None => {
      let offset = tz.offset_from_utc_datetime(&naive).fix();
      let utc = naive - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
      offset.from_utc_datetime(&utc)
    }
  }
}

/// Instants bounding the local days `start..=end` in `tz`: midnight of
/// `start` and midnight after `end`.
pub fn local_day_bounds(
  start: NaiveDate,
  end: NaiveDate,
  tz: Tz,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
  (
    localize(start.and_time(NaiveTime::MIN), tz),
    localize((end + TimeDelta::days(1)).and_time(NaiveTime::MIN), tz),
  )
}

/// Calendar date of an RFC 3339 timestamp as seen in `tz`.
pub fn local_date(timestamp: &str, tz: Tz) -> Option<NaiveDate> {
  DateTime::parse_from_rfc3339(timestamp)
    .ok()
    .map(|at| at.with_timezone(&tz).date_naive())
}

/// Convert decimal hours to whole seconds, truncating.
pub fn hours_to_seconds(value: &str) -> Result<i64> {
  let hours: f64 = value.trim().parse().map_err(|_| Error::InvalidHours {
    value: value.to_string(),
  })?;

  if !hours.is_finite() || hours < 0.0 {
    return Err(Error::InvalidHours {
      value: value.to_string(),
    });
  }

  Ok((hours * 3600.0) as i64)
}

/// Read a CSV file, skipping its header row.
///
/// Short rows are kept so they can be reported per row instead of
/// failing the whole file.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_path(path)?;

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    rows.push(record.iter().map(String::from).collect());
  }

  Ok(rows)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
  }

  #[test]
  fn test_us_format_with_separate_time_cell() {
    let entry = parse_row(
      &row(&[
        "10/24/2024",
        "4:15 PM",
        "1.5",
        "meeting notes",
        "ABC-123 Sprint planning",
      ]),
      RowLayout::TimeLog,
      chrono_tz::America::Montreal,
    )
    .unwrap();

    assert_eq!(entry.task_id, "ABC-123");
    assert_eq!(entry.started.to_rfc3339(), "2024-10-24T16:15:00-04:00");
    assert_eq!(entry.seconds, 5400);
    assert_eq!(entry.comment, "meeting notes");
  }

  #[test]
  fn test_iso_format_in_single_cell() {
    let entry = parse_row(
      &row(&["2024-10-24 16:15:00", "2", "", "XYZ-42"]),
      RowLayout::TimeLog,
      chrono_tz::America::Montreal,
    )
    .unwrap();

    assert_eq!(entry.task_id, "XYZ-42");
    assert_eq!(entry.started.to_rfc3339(), "2024-10-24T16:15:00-04:00");
    assert_eq!(entry.seconds, 7200);
    assert_eq!(entry.comment, "");
  }

  #[test]
  fn test_trailing_empty_cell_keeps_four_field_shape() {
    let entry = parse_row(
      &row(&["2024-10-24", "1.5", "notes", "abc123", ""]),
      RowLayout::TimeLog,
      chrono_tz::America::Montreal,
    )
    .unwrap();

    assert_eq!(entry.task_id, "abc123");
    assert_eq!(entry.started.to_rfc3339(), "2024-10-24T00:00:00-04:00");
    assert_eq!(entry.seconds, 5400);
    assert_eq!(entry.comment, "notes");
  }

  #[test]
  fn test_fifth_cell_is_extra_comment_when_second_is_hours() {
    let entry = parse_row(
      &row(&["2024-10-24 09:00:00", "2", "review", "abc123", "extra note"]),
      RowLayout::TimeLog,
      chrono_tz::America::Montreal,
    )
    .unwrap();

    assert_eq!(entry.task_id, "abc123");
    assert_eq!(entry.started.to_rfc3339(), "2024-10-24T09:00:00-04:00");
    assert_eq!(entry.seconds, 7200);
    assert_eq!(entry.comment, "review extra note");

    let no_first_comment_row = row(&["2024-10-24", "2", " ", "abc123", "extra note"]);
    let no_first_comment = RowLayout::TimeLog.split(&no_first_comment_row).unwrap();
    assert_eq!(no_first_comment.comment, "extra note");
  }

  #[test]
  fn test_csv_export_with_trailing_column() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,hours,comment,task,note").unwrap();
    writeln!(file, "2024-10-24,1.5,notes,abc123,").unwrap();
    writeln!(file, "10/24/2024,4:15 PM,1,planning,abc123 Sprint").unwrap();

    let rows = read_csv_rows(file.path()).unwrap();
    let first = RowLayout::TimeLog.split(&rows[0]).unwrap();
    assert_eq!(first.datetime, "2024-10-24");
    assert_eq!(first.hours, "1.5");
    assert_eq!(first.task_reference, "abc123");

    let second = RowLayout::TimeLog.split(&rows[1]).unwrap();
    assert_eq!(second.datetime, "10/24/2024 4:15 PM");
    assert_eq!(second.hours, "1");
    assert_eq!(second.comment, "planning");
    assert_eq!(second.task_reference, "abc123 Sprint");
  }

  #[test]
  fn test_worksheet_layout() {
    let entry = parse_row(
      &row(&["2024-01-15", "09:30:00", "0.25", "OPS-7 On-call", "triage"]),
      RowLayout::Worksheet,
      chrono_tz::America::Montreal,
    )
    .unwrap();

    assert_eq!(entry.task_id, "OPS-7");
    // Winter: standard time
    assert_eq!(entry.started.to_rfc3339(), "2024-01-15T09:30:00-05:00");
    assert_eq!(entry.seconds, 900);
    assert_eq!(entry.comment, "triage");

    let without_comment = parse_row(
      &row(&["2024-01-15", "09:30:00", "1", "OPS-7"]),
      RowLayout::Worksheet,
      chrono_tz::America::Montreal,
    )
    .unwrap();
    assert_eq!(without_comment.comment, "");
  }

  #[test]
  fn test_date_only_is_midnight() {
    let dt = parse_datetime("2023-06-01").unwrap();
    assert_eq!(dt.to_string(), "2023-06-01 00:00:00");
  }

  #[test]
  fn test_first_matching_format_wins() {
    let dt = parse_datetime("01/02/2024 12:05 AM").unwrap();
    assert_eq!(dt.to_string(), "2024-01-02 00:05:00");
  }

  #[test]
  fn test_unparseable_datetime() {
    assert!(matches!(
      parse_datetime("yesterday afternoon"),
      Err(Error::ParseFailure { .. })
    ));
    assert!(matches!(
      parse_datetime("2024-10-24T16:15:00"),
      Err(Error::ParseFailure { .. })
    ));
  }

  #[test]
  fn test_missing_fields() {
    let err = parse_row(
      &row(&["2024-10-24", "2", "XYZ-42"]),
      RowLayout::TimeLog,
      chrono_tz::America::Montreal,
    );
    assert!(matches!(
      err,
      Err(Error::MissingFields {
        expected: 4,
        actual: 3
      })
    ));
  }

  #[test]
  fn test_hours_to_seconds_truncates() {
    assert_eq!(hours_to_seconds("1.5").unwrap(), 5400);
    assert_eq!(hours_to_seconds(" 2 ").unwrap(), 7200);
    assert_eq!(hours_to_seconds("0.0001").unwrap(), 0);
    assert_eq!(hours_to_seconds("0.3333").unwrap(), 1199);
    assert!(matches!(
      hours_to_seconds("two"),
      Err(Error::InvalidHours { .. })
    ));
    assert!(matches!(
      hours_to_seconds("-1"),
      Err(Error::InvalidHours { .. })
    ));
  }

  #[test]
  fn test_blank_task_reference() {
    let err = parse_row(
      &row(&["2024-10-24 16:15:00", "2", "", "   "]),
      RowLayout::TimeLog,
      chrono_tz::America::Montreal,
    );
    assert!(matches!(err, Err(Error::InvalidTaskId { .. })));
  }

  #[test]
  fn test_localize_dst_edges() {
    let tz = chrono_tz::America::Montreal;

    // 2024-11-03 01:30 happens twice; take the first (EDT)
    let ambiguous = NaiveDate::from_ymd_opt(2024, 11, 3)
      .unwrap()
      .and_hms_opt(1, 30, 0)
      .unwrap();
    assert_eq!(
      localize(ambiguous, tz).to_rfc3339(),
      "2024-11-03T01:30:00-04:00"
    );

    // 2024-03-10 02:30 does not exist; keep standard time
    let gap = NaiveDate::from_ymd_opt(2024, 3, 10)
      .unwrap()
      .and_hms_opt(2, 30, 0)
      .unwrap();
    assert_eq!(localize(gap, tz).to_rfc3339(), "2024-03-10T02:30:00-05:00");
  }

  #[test]
  fn test_local_day_bounds_follow_zone() {
    let tz = chrono_tz::America::Montreal;
    let day = NaiveDate::from_ymd_opt(2024, 10, 24).unwrap();
    let (start, end) = local_day_bounds(day, day, tz);
    assert_eq!(start.to_rfc3339(), "2024-10-24T00:00:00-04:00");
    assert_eq!(end.to_rfc3339(), "2024-10-25T00:00:00-04:00");

    // The day DST ends is 25 hours long
    let fall_back = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
    let (start, end) = local_day_bounds(fall_back, fall_back, tz);
    assert_eq!((end - start).num_hours(), 25);
  }

  #[test]
  fn test_local_date() {
    let tz = chrono_tz::America::Montreal;
    assert_eq!(
      local_date("2024-10-24T01:00:00Z", tz),
      NaiveDate::from_ymd_opt(2024, 10, 23)
    );
    assert_eq!(
      local_date("2024-10-24T21:00:00-04:00", tz),
      NaiveDate::from_ymd_opt(2024, 10, 24)
    );
    assert_eq!(local_date("not a time", tz), None);
  }

  #[test]
  fn test_read_csv_rows_skips_header_and_keeps_short_rows() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,hours,comment,task").unwrap();
    writeln!(file, "2024-10-24,1.5,notes,abc123").unwrap();
    writeln!(file, "2024-10-25,2").unwrap();

    let rows = read_csv_rows(file.path()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], row(&["2024-10-24", "1.5", "notes", "abc123"]));
    assert_eq!(rows[1].len(), 2);
  }
}
