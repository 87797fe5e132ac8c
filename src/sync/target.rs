use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// A worklog ready to be written to a target service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLogEntry {
  pub task_id: String,
  pub started: DateTime<FixedOffset>,
  pub seconds: i64,
  pub comment: String,
}

/// What a target service reported back for a created worklog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorklogResult {
  /// Target service name ("jira", "wrike")
  pub service: String,
  pub task_id: String,
  /// Identifier of the created worklog, when the service returns one
  pub worklog_id: Option<String>,
  pub seconds: i64,
  pub started: String,
}

impl fmt::Display for WorklogResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} worklog {} on {}: {}s at {}",
      self.service,
      self.worklog_id.as_deref().unwrap_or("?"),
      self.task_id,
      self.seconds,
      self.started
    )
  }
}

/// A service that time logs can be synced into.
#[async_trait]
pub trait TimeLogTarget: Send + Sync {
  fn name(&self) -> &str;

  async fn create_time_log(&self, entry: &TimeLogEntry) -> Result<WorklogResult>;
}
