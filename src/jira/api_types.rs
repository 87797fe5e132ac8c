//! Wire shapes of the Jira REST responses this crate reads.
//!
//! Only the fields needed for worklogs and issue lookups are declared.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueType {
  pub name: String,
}

/// User as returned by `/myself` and worklog authors.
///
/// Cloud identifies users by `accountId`, Server/Data Center by `name`.
#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "accountId")]
  pub account_id: Option<String>,
  pub name: Option<String>,
  #[serde(rename = "displayName")]
  pub display_name: Option<String>,
}

impl ApiUser {
  pub fn identity(&self) -> Option<&str> {
    self.account_id.as_deref().or(self.name.as_deref())
  }
}

// ============================================================================
// Issues
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiIssueType>,
  pub assignee: Option<ApiUser>,
  #[serde(default)]
  pub updated: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Worklogs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiWorklog {
  pub id: String,
  pub author: Option<ApiUser>,
  #[serde(default)]
  pub started: String,
  #[serde(rename = "timeSpentSeconds", default)]
  pub time_spent_seconds: i64,
  // String in API v2, ADF document in v3
  pub comment: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiWorklogsResponse {
  #[serde(default)]
  pub worklogs: Vec<ApiWorklog>,
  #[serde(rename = "startAt", default)]
  pub start_at: u64,
  #[serde(default)]
  pub total: u64,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

use super::types::{Issue, Worklog};

impl ApiIssue {
  pub fn into_issue(self) -> Issue {
    let f = self.fields;
    Issue {
      key: self.key,
      summary: f.summary,
      status: f.status.map(|s| s.name).unwrap_or_default(),
      issue_type: f.issue_type.map(|t| t.name).unwrap_or_default(),
      assignee: f.assignee.and_then(|u| u.display_name),
      updated: f.updated,
    }
  }
}

impl ApiWorklog {
  pub fn into_worklog(self, issue_key: &str) -> Worklog {
    Worklog {
      author: self.author.as_ref().and_then(|a| a.identity()).map(String::from),
      comment: self.comment.as_ref().and_then(extract_comment),
      id: self.id,
      issue_key: issue_key.to_string(),
      started: self.started,
      time_spent_seconds: self.time_spent_seconds,
    }
  }
}

/// Plain text of a worklog comment: a bare string (API v2) or an Atlassian
/// document (API v3) flattened with one line per paragraph.
fn extract_comment(value: &serde_json::Value) -> Option<String> {
  let text = match value {
    serde_json::Value::String(s) => s.clone(),
    serde_json::Value::Object(_) => {
      let mut out = String::new();
      adf_text(value, &mut out);
      out.trim_end().to_string()
    }
    _ => return None,
  };
  (!text.is_empty()).then_some(text)
}

fn adf_text(node: &serde_json::Value, out: &mut String) {
  match node["type"].as_str() {
    Some("text") => out.push_str(node["text"].as_str().unwrap_or_default()),
    Some("hardBreak") => out.push('\n'),
    kind => {
      for child in node["content"].as_array().into_iter().flatten() {
        adf_text(child, out);
      }
      if kind == Some("paragraph") {
        out.push('\n');
      }
    }
  }
}
