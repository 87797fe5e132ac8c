//! Input validation shared by every service adapter.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

static TASK_ID: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("task id pattern"));

// Jira issue keys: project key, dash, number (e.g. "ABC-123", "XYZ_2-42")
static ISSUE_KEY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*-[0-9]+$").expect("issue key pattern"));

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| Error::InvalidDateFormat {
    value: value.to_string(),
  })
}

/// Parse both ends of a date range and make sure it is not inverted.
pub fn date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
  let start_date = parse_date(start)?;
  let end_date = parse_date(end)?;

  if start_date > end_date {
    return Err(Error::InvalidRange {
      start: start.to_string(),
      end: end.to_string(),
    });
  }

  Ok((start_date, end_date))
}

/// Validate a Wrike-style task ID (alphanumeric only).
pub fn task_id(value: &str) -> Result<&str> {
  if TASK_ID.is_match(value) {
    Ok(value)
  } else {
    Err(Error::InvalidTaskId {
      value: value.to_string(),
    })
  }
}

/// Validate a Jira issue key.
pub fn issue_key(value: &str) -> Result<&str> {
  if ISSUE_KEY.is_match(value) {
    Ok(value)
  } else {
    Err(Error::InvalidTaskId {
      value: value.to_string(),
    })
  }
}
