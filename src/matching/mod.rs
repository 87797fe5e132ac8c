//! Matching free-text time entries to tasks with a rating oracle.

mod matcher;
mod oracle;

pub use matcher::{Matcher, MatcherConfig};
pub use oracle::{ChatRequest, OpenAiOracle, RatingOracle, DEFAULT_API_URL};

use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::cache::CacheStorage;
use crate::error::Result;
use crate::sync::task_id_from_reference;
use crate::toggl::{TimeEntry, TogglClient};
use crate::wrike::types::TaskSummary;
use crate::wrike::{WrikeClient, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
  /// Description starts with the task ID
  TaskId,
  /// Picked by the oracle among task titles
  Oracle,
}

/// A Toggl entry paired with the Wrike task it belongs to, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryMatch {
  pub entry: TimeEntry,
  pub task: Option<TaskSummary>,
  pub method: Option<MatchMethod>,
}

impl fmt::Display for EntryMatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.task {
      Some(task) => write!(
        f,
        "Matched Toggl entry {} ({}) to Wrike task {} ({})",
        self.entry.id,
        self.entry.description(),
        task.id,
        task.title
      ),
      None => write!(
        f,
        "No Wrike task found for Toggl entry {} ({})",
        self.entry.id,
        self.entry.description()
      ),
    }
  }
}

/// Pair every Toggl entry in `[start, end]` with a Wrike task.
///
/// A description that starts with an existing Wrike task ID is matched
/// directly; anything else is matched by title through `matcher`, using
/// the tasks of `folder_ids` (all tasks when empty) as candidates.
pub async fn match_toggl_to_wrike<S, O>(
  toggl: &TogglClient,
  wrike: &WrikeClient<S>,
  matcher: &Matcher<O>,
  folder_ids: &[String],
  start: &str,
  end: &str,
) -> Result<Vec<EntryMatch>>
where
  S: CacheStorage,
  O: RatingOracle,
{
  let entries = toggl.list_entries(start, end).await?;

  let mut tasks: Option<Vec<TaskSummary>> = None;
  let mut matches = Vec::with_capacity(entries.len());

  for entry in entries {
    if let Some(task) = task_from_description(wrike, entry.description()).await {
      matches.push(EntryMatch {
        entry,
        task: Some(task),
        method: Some(MatchMethod::TaskId),
      });
      continue;
    }

    // Candidate list is fetched once, on first need
    if tasks.is_none() {
      tasks = Some(candidate_tasks(wrike, folder_ids).await?);
    }
    let candidates = tasks.as_deref().unwrap_or_default();
    let titles: Vec<String> = candidates.iter().map(|t| t.title.clone()).collect();

    let task = match matcher.best_match(entry.description(), &titles).await {
      Some(title) => candidates.iter().find(|t| t.title == title).cloned(),
      None => None,
    };
    let method = task.as_ref().map(|_| MatchMethod::Oracle);
    matches.push(EntryMatch {
      entry,
      task,
      method,
    });
  }

  info!(entries = matches.len(), "matched toggl entries");
  Ok(matches)
}

async fn task_from_description<S: CacheStorage>(
  wrike: &WrikeClient<S>,
  description: &str,
) -> Option<TaskSummary> {
  let candidate = task_id_from_reference(description)?;
  // Not an ID-shaped token, or a lookup failure, falls through to title matching
  match wrike.get_task(candidate).await {
    Ok(Some(task)) => Some(TaskSummary {
      id: task.id,
      title: task.title,
    }),
    _ => None,
  }
}

async fn candidate_tasks<S: CacheStorage>(
  wrike: &WrikeClient<S>,
  folder_ids: &[String],
) -> Result<Vec<TaskSummary>> {
  if folder_ids.is_empty() {
    return wrike.get_all_tasks(None, DEFAULT_PAGE_SIZE).await;
  }

  let mut tasks = Vec::new();
  for folder_id in folder_ids {
    tasks.extend(wrike.get_all_tasks(Some(folder_id.trim()), DEFAULT_PAGE_SIZE).await?);
  }
  Ok(tasks)
}
