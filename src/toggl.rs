//! Toggl Track API v9 adapter.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use chrono_tz::Tz;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::http;
use crate::sync::{local_date, local_day_bounds};
use crate::validate;

pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";

/// A Toggl time entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
  pub id: i64,
  #[serde(default)]
  pub workspace_id: Option<i64>,
  #[serde(default)]
  pub description: Option<String>,
  pub start: String,
  #[serde(default)]
  pub stop: Option<String>,
  /// Seconds; negative while the timer is running
  #[serde(default)]
  pub duration: i64,
}

impl TimeEntry {
  pub fn description(&self) -> &str {
    self.description.as_deref().unwrap_or("")
  }
}

#[derive(Debug, Serialize)]
struct NewTimeEntry<'a> {
  description: &'a str,
  start: String,
  stop: String,
  duration: i64,
  workspace_id: i64,
  created_with: &'static str,
}

pub struct TogglClient {
  http: Client,
  base_url: String,
  token: String,
  workspace_id: Option<i64>,
  /// Zone in which dates passed to the client are read
  timezone: Tz,
}

impl TogglClient {
  pub fn new(
    base_url: &str,
    token: String,
    workspace_id: Option<i64>,
    timezone: Tz,
    timeout: Duration,
  ) -> Result<Self> {
    Ok(Self {
      http: http::build_client(timeout)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      token,
      workspace_id,
      timezone,
    })
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .http
      .request(method, format!("{}{}", self.base_url, path))
      .basic_auth(&self.token, Some("api_token"))
  }

  fn workspace_id(&self) -> Result<i64> {
    self
      .workspace_id
      .ok_or_else(|| Error::config("toggl.workspace_id is not set"))
  }

  /// Entries of the current user that start between the local days `start`
  /// and `end`, both inclusive.
  pub async fn list_entries(&self, start: &str, end: &str) -> Result<Vec<TimeEntry>> {
    let (start, end) = validate::date_range(start, end)?;
    let (from, until) = local_day_bounds(start, end, self.timezone);

    // end_date is exclusive on the Toggl side
    let query = [
      ("start_date", rfc3339_utc(from)),
      ("end_date", rfc3339_utc(until)),
    ];
    let response = self
      .request(Method::GET, "/me/time_entries")
      .query(&query)
      .send()
      .await?;

    let mut entries: Vec<TimeEntry> = http::json(response).await?;
    entries.retain(|e| {
      local_date(&e.start, self.timezone).is_some_and(|day| (start..=end).contains(&day))
    });
    info!(count = entries.len(), "fetched toggl time entries");
    Ok(entries)
  }

  pub async fn add_time_entry(
    &self,
    description: &str,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
  ) -> Result<TimeEntry> {
    if end < start {
      return Err(Error::InvalidRange {
        start: start.to_rfc3339(),
        end: end.to_rfc3339(),
      });
    }
    let workspace_id = self.workspace_id()?;

    let body = NewTimeEntry {
      description,
      start: rfc3339_utc(start),
      stop: rfc3339_utc(end),
      duration: (end - start).num_seconds(),
      workspace_id,
      created_with: "timesync",
    };
    let response = self
      .request(
        Method::POST,
        &format!("/workspaces/{}/time_entries", workspace_id),
      )
      .json(&body)
      .send()
      .await?;

    http::json(response).await
  }

  pub async fn delete_entry(&self, entry: &TimeEntry) -> Result<()> {
    let workspace_id = match entry.workspace_id {
      Some(id) => id,
      None => self.workspace_id()?,
    };
    let response = self
      .request(
        Method::DELETE,
        &format!("/workspaces/{}/time_entries/{}", workspace_id, entry.id),
      )
      .send()
      .await?;
    http::check(response).await?;
    Ok(())
  }

  /// Delete the current user's entries on `date`. In dry-run mode nothing is deleted.
  pub async fn delete_entries_on_date(&self, date: &str, dry_run: bool) -> Result<Vec<String>> {
    let entries = self.list_entries(date, date).await?;

    let mut results = Vec::new();
    for entry in &entries {
      if dry_run {
        results.push(format!(
          "Dry run mode: Would delete time entry {} ({})",
          entry.id,
          entry.description()
        ));
        continue;
      }

      match self.delete_entry(entry).await {
        Ok(()) => results.push(format!(
          "Deleted time entry {} ({})",
          entry.id,
          entry.description()
        )),
        Err(e) => {
          warn!(entry = entry.id, error = %e, "failed to delete toggl entry");
          results.push(format!(
            "Failed to delete time entry {} ({})",
            entry.id,
            entry.description()
          ))
        }
      }
    }

    Ok(results)
  }
}

fn rfc3339_utc(at: DateTime<FixedOffset>) -> String {
  at.with_timezone(&Utc)
    .to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn entries_to_tsv(entries: &[TimeEntry]) -> String {
  entries
    .iter()
    .map(|e| {
      format!(
        "{}\t{}\t{}\t{}",
        e.id,
        e.start,
        e.duration,
        e.description()
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}
