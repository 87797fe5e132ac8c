//! Serde-deserializable types matching Wrike API v4 responses.
//!
//! Every Wrike response wraps its records in a `{"kind", "data"}` envelope;
//! only `data` and the paging token are read.

use serde::Deserialize;

use super::types::{Folder, Task, TaskSummary, Timelog};

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(rename = "nextPageToken", default)]
  pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiContact {
  pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTask {
  pub id: String,
  #[serde(default)]
  pub title: String,
  pub status: Option<String>,
  pub permalink: Option<String>,
  pub created_date: Option<String>,
  pub updated_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFolder {
  pub id: String,
  #[serde(default)]
  pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTimelog {
  pub id: String,
  pub task_id: Option<String>,
  pub user_id: Option<String>,
  #[serde(default)]
  pub hours: f64,
  pub created_date: Option<String>,
  pub updated_date: Option<String>,
  pub tracked_date: Option<String>,
  pub comment: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiTask> for Task {
  fn from(t: ApiTask) -> Self {
    Task {
      id: t.id,
      title: t.title,
      status: t.status,
      permalink: t.permalink,
      created_date: t.created_date,
      updated_date: t.updated_date,
    }
  }
}

impl From<ApiTask> for TaskSummary {
  fn from(t: ApiTask) -> Self {
    TaskSummary {
      id: t.id,
      title: t.title,
    }
  }
}

impl From<ApiFolder> for Folder {
  fn from(f: ApiFolder) -> Self {
    Folder {
      id: f.id,
      title: f.title,
    }
  }
}

impl From<ApiTimelog> for Timelog {
  fn from(t: ApiTimelog) -> Self {
    Timelog {
      id: t.id,
      task_id: t.task_id,
      user_id: t.user_id,
      hours: t.hours,
      created_date: t.created_date,
      updated_date: t.updated_date,
      tracked_date: t.tracked_date,
      comment: t.comment,
    }
  }
}
