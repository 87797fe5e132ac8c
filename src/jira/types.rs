use serde::Serialize;

/// Issue details, as shown by `jira get-task`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
  pub key: String,
  pub summary: String,
  pub status: String,
  pub issue_type: String,
  pub assignee: Option<String>,
  pub updated: String,
}

/// A worklog on an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worklog {
  pub id: String,
  pub issue_key: String,
  /// Account ID (Cloud) or user name (Server) of the author
  pub author: Option<String>,
  /// Jira timestamp, e.g. "2024-10-24T16:15:00.000-0400"
  pub started: String,
  pub time_spent_seconds: i64,
  pub comment: Option<String>,
}

impl Worklog {
  /// Calendar date part of `started`
  pub fn started_date(&self) -> &str {
    self.started.get(..10).unwrap_or(&self.started)
  }
}
