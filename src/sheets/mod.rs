//! Google Sheets as a source and sink of worklogs.
//!
//! Sheets are read as plain rows and fed to the sync engine; the first row
//! of a sheet is always a header.

mod auth;
mod client;

pub use auth::TokenStore;
pub use client::{SheetsClient, DEFAULT_API_URL};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cache::CacheStorage;
use crate::error::Result;
use crate::sync::{
  sync_rows, RowLayout, SyncOptions, SyncResult, TimeLogTarget, FIRST_DATA_ROW,
};
use crate::wrike::{types, WrikeClient};

/// All rows of sheet `title`, or `None` when it is empty or cannot be read.
pub async fn fetch_data_from_sheet(
  sheets: &SheetsClient,
  title: &str,
) -> Result<Option<Vec<Vec<String>>>> {
  fetch_range(sheets, &format!("{}!A:Z", title)).await
}

async fn fetch_range(sheets: &SheetsClient, range: &str) -> Result<Option<Vec<Vec<String>>>> {
  match sheets.get_values(range).await {
    Ok(rows) if rows.is_empty() => {
      warn!(range, "no data found in sheet");
      Ok(None)
    }
    Ok(rows) => {
      info!(
        range,
        spreadsheet = sheets.spreadsheet_id(),
        rows = rows.len(),
        "data fetched from sheet"
      );
      Ok(Some(rows))
    }
    Err(e) if e.is_remote() => {
      warn!(range, error = %e, "could not read sheet");
      Ok(None)
    }
    Err(e) => Err(e),
  }
}

pub fn wrike_tasks_title(today: NaiveDate) -> String {
  format!("Wrike Tasks {}", today.format("%Y-%m-%d"))
}

pub fn wrike_sync_title(today: NaiveDate) -> String {
  format!("wrike sync {}", today.format("%Y-%m-%d"))
}

pub fn jira_sync_title(client: &str) -> String {
  format!("Jira Sync {}", client)
}

/// Write every task of `folder_ids` into a new `Wrike Tasks <date>` sheet.
/// Returns the sheet title.
pub async fn sync_wrike_to_sheets<S: CacheStorage>(
  sheets: &SheetsClient,
  wrike: &WrikeClient<S>,
  folder_ids: &[String],
  today: NaiveDate,
) -> Result<String> {
  let title = wrike_tasks_title(today);

  let mut rows = Vec::new();
  for folder_id in folder_ids {
    let folder_id = folder_id.trim();
    let folder = (!folder_id.is_empty()).then_some(folder_id);
    let tasks = wrike.get_all_tasks(folder, crate::wrike::DEFAULT_PAGE_SIZE).await?;
    rows.extend(types::tasks_to_rows(&tasks));
  }

  sheets.check_or_create_sheet(&title).await?;
  sheets.update_values(&format!("{}!A1", title), &rows).await?;

  info!(title = %title, rows = rows.len(), "sync completed");
  Ok(title)
}

/// Sync a `[date, hours, comment, task]` sheet into `target`, skipping the header.
pub async fn sync_sheet_to_wrike<T: TimeLogTarget + ?Sized>(
  sheets: &SheetsClient,
  target: &T,
  title: &str,
  options: &SyncOptions,
) -> Result<Vec<SyncResult>> {
  let Some(rows) = fetch_data_from_sheet(sheets, title).await? else {
    info!(title, "nothing to sync");
    return Ok(Vec::new());
  };

  let data = &rows[1..];
  info!(title, rows = data.len(), "processing rows from sheet");

  let options = SyncOptions {
    layout: RowLayout::TimeLog,
    first_row: FIRST_DATA_ROW,
    ..options.clone()
  };
  Ok(sync_rows(data, target, &options).await)
}

/// Sync a `[date, time, hours, task, comment?]` worksheet (columns A to E)
/// into a Jira instance, skipping the header.
pub async fn sync_sheet_to_jira<T: TimeLogTarget + ?Sized>(
  sheets: &SheetsClient,
  target: &T,
  sheet_name: &str,
  options: &SyncOptions,
) -> Result<Vec<SyncResult>> {
  info!(sheet = sheet_name, "starting sync from Google Sheets to Jira");

  let Some(rows) = fetch_range(sheets, &format!("{}!A:E", sheet_name)).await? else {
    return Ok(Vec::new());
  };

  let options = SyncOptions {
    layout: RowLayout::Worksheet,
    first_row: FIRST_DATA_ROW,
    ..options.clone()
  };
  let results = sync_rows(&rows[1..], target, &options).await;

  info!(sheet = sheet_name, "sync from Google Sheets to Jira completed");
  Ok(results)
}

/// Sync the `Jira Sync <client>` sheet into the Jira instance of that client.
pub async fn sync<T: TimeLogTarget + ?Sized>(
  sheets: &SheetsClient,
  target: &T,
  client: &str,
  options: &SyncOptions,
) -> Result<Vec<SyncResult>> {
  sync_sheet_to_jira(sheets, target, &jira_sync_title(client), options).await
}
