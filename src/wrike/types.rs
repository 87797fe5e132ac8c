use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task id and title, as listed from a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
  pub id: String,
  pub title: String,
}

/// Full task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub title: String,
  pub status: Option<String>,
  pub permalink: Option<String>,
  pub created_date: Option<String>,
  pub updated_date: Option<String>,
}

/// Folder or project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
  pub id: String,
  pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timelog {
  pub id: String,
  pub task_id: Option<String>,
  pub user_id: Option<String>,
  pub hours: f64,
  pub created_date: Option<String>,
  pub updated_date: Option<String>,
  pub tracked_date: Option<String>,
  pub comment: Option<String>,
}

/// Timelog joined with the title and permalink of its task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTimelog {
  pub hours: f64,
  pub created_date: Option<String>,
  pub updated_date: Option<String>,
  pub tracked_date: Option<String>,
  pub comment: Option<String>,
  pub permalink: Option<String>,
  pub task_name: String,
}

pub const UNKNOWN_TASK_NAME: &str = "Unknown Task Name";

impl EnrichedTimelog {
  pub fn new(timelog: Timelog, task: Option<&Task>) -> Self {
    Self {
      hours: timelog.hours,
      created_date: timelog.created_date,
      updated_date: timelog.updated_date,
      tracked_date: timelog.tracked_date,
      comment: timelog.comment,
      permalink: task.and_then(|t| t.permalink.clone()),
      task_name: task
        .map(|t| t.title.clone())
        .unwrap_or_else(|| UNKNOWN_TASK_NAME.to_string()),
    }
  }
}

/// Filters for listing timelogs across the account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelogFilter {
  pub created: Option<(NaiveDate, NaiveDate)>,
  pub tracked: Option<(NaiveDate, NaiveDate)>,
  /// Only timelogs of the connected user
  pub for_current_user: bool,
}

pub fn tasks_to_tsv(tasks: &[TaskSummary]) -> String {
  tasks
    .iter()
    .map(|t| format!("{}\t{}", t.id, t.title))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn tasks_to_csv(tasks: &[TaskSummary]) -> csv::Result<String> {
  let mut wtr = csv::Writer::from_writer(vec![]);
  wtr.write_record(["Task ID", "Task Name"])?;
  for task in tasks {
    wtr.write_record([&task.id, &task.title])?;
  }
  let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn timelogs_to_tsv(timelogs: &[Timelog]) -> String {
  timelogs
    .iter()
    .map(|t| {
      format!(
        "{}\t{}\t{}\t{}\t{}",
        t.id,
        t.hours,
        t.created_date.as_deref().unwrap_or(""),
        t.tracked_date.as_deref().unwrap_or(""),
        t.comment.as_deref().unwrap_or("")
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Rows for writing tasks into a spreadsheet
pub fn tasks_to_rows(tasks: &[TaskSummary]) -> Vec<Vec<String>> {
  tasks
    .iter()
    .map(|t| vec![t.id.clone(), t.title.clone()])
    .collect()
}
