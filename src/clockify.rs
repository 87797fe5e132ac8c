//! Clockify API v1 adapter (`X-Api-Key` authentication).

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use chrono_tz::Tz;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::http;
use crate::sync::{local_date, local_day_bounds};
use crate::validate;

pub const DEFAULT_API_URL: &str = "https://api.clockify.me/api/v1";
const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub active_workspace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
  pub start: String,
  pub end: Option<String>,
  /// ISO 8601 duration such as `PT1H30M`
  pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
  pub id: String,
  #[serde(default)]
  pub description: String,
  pub time_interval: TimeInterval,
}

#[derive(Debug, Serialize)]
struct NewTimeEntry<'a> {
  start: String,
  end: String,
  description: &'a str,
}

pub struct ClockifyClient {
  http: Client,
  base_url: String,
  api_key: String,
  timezone: Tz,
}

impl ClockifyClient {
  pub fn new(base_url: &str, api_key: String, timezone: Tz, timeout: Duration) -> Result<Self> {
    Ok(Self {
      http: http::build_client(timeout)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key,
      timezone,
    })
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .http
      .request(method, format!("{}{}", self.base_url, path))
      .header("X-Api-Key", &self.api_key)
  }

  pub async fn workspaces(&self) -> Result<Vec<Workspace>> {
    let response = self.request(Method::GET, "/workspaces").send().await?;
    http::json(response).await
  }

  pub async fn current_user(&self) -> Result<User> {
    let response = self.request(Method::GET, "/user").send().await?;
    http::json(response).await
  }

  /// The current user's entries that start between the local days `start`
  /// and `end`, both inclusive.
  pub async fn list_entries(
    &self,
    workspace_id: &str,
    start: &str,
    end: &str,
  ) -> Result<Vec<TimeEntry>> {
    let (start, end) = validate::date_range(start, end)?;
    let (from, until) = local_day_bounds(start, end, self.timezone);
    let user = self.current_user().await?;
    let path = format!("/workspaces/{}/user/{}/time-entries", workspace_id, user.id);

    let mut entries = Vec::new();
    let mut page = 1usize;
    loop {
      let query = [
        ("start", rfc3339_utc(from)),
        ("end", rfc3339_utc(until)),
        ("page", page.to_string()),
        ("page-size", PAGE_SIZE.to_string()),
      ];
      let response = self.request(Method::GET, &path).query(&query).send().await?;
      let batch: Vec<TimeEntry> = http::json(response).await?;

      let count = batch.len();
      entries.extend(batch);
      debug!(page, count, "fetched clockify page");

      if count < PAGE_SIZE {
        break;
      }
      page += 1;
    }

    entries.retain(|e| {
      local_date(&e.time_interval.start, self.timezone)
        .is_some_and(|day| (start..=end).contains(&day))
    });
    Ok(entries)
  }

  pub async fn add_time_entry(
    &self,
    workspace_id: &str,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    description: &str,
  ) -> Result<TimeEntry> {
    if end < start {
      return Err(Error::InvalidRange {
        start: start.to_rfc3339(),
        end: end.to_rfc3339(),
      });
    }

    let body = NewTimeEntry {
      start: rfc3339_utc(start),
      end: rfc3339_utc(end),
      description,
    };
    let response = self
      .request(
        Method::POST,
        &format!("/workspaces/{}/time-entries", workspace_id),
      )
      .json(&body)
      .send()
      .await?;
    http::json(response).await
  }

  pub async fn delete_entry(&self, workspace_id: &str, entry_id: &str) -> Result<()> {
    let response = self
      .request(
        Method::DELETE,
        &format!("/workspaces/{}/time-entries/{}", workspace_id, entry_id),
      )
      .send()
      .await?;
    http::check(response).await?;
    Ok(())
  }

  /// Delete the current user's entries on `date`. In dry-run mode nothing is deleted.
  pub async fn delete_entries_on_date(
    &self,
    workspace_id: &str,
    date: &str,
    dry_run: bool,
  ) -> Result<Vec<String>> {
    let entries = self.list_entries(workspace_id, date, date).await?;

    let mut results = Vec::new();
    for entry in &entries {
      if dry_run {
        results.push(format!(
          "Dry run mode: Would delete time entry {} ({})",
          entry.id, entry.description
        ));
        continue;
      }

      match self.delete_entry(workspace_id, &entry.id).await {
        Ok(()) => results.push(format!(
          "Deleted time entry {} ({})",
          entry.id, entry.description
        )),
        Err(e) => {
          warn!(entry = %entry.id, error = %e, "failed to delete clockify entry");
          results.push(format!(
            "Failed to delete time entry {} ({})",
            entry.id, entry.description
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
        e.time_interval.start,
        e.time_interval.duration.as_deref().unwrap_or(""),
        e.description
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}
