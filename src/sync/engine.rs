//! Row-by-row sync of parsed worklogs into a target service.

use chrono_tz::Tz;
use tracing::{error, info, warn};

use super::row::{parse_row, RowLayout};
use super::target::TimeLogTarget;
use super::SyncResult;

/// Reference zone for timestamps that carry no zone information
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Montreal;

/// Line number of the first data row in a source with a header row
pub const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// Report what would be written without calling the target
  pub dry_run: bool,
  pub timezone: Tz,
  pub layout: RowLayout,
  /// Number of the first row in the source, for log output (2 after a header row)
  pub first_row: usize,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      dry_run: false,
      timezone: DEFAULT_TIMEZONE,
      layout: RowLayout::default(),
      first_row: 1,
    }
  }
}

impl SyncOptions {
  pub fn dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }
}

/// Sync every row into `target`, in order.
///
/// Returns one result per input row. A malformed row or a failed write is
/// recorded and the batch moves on to the next row.
pub async fn sync_rows<T>(rows: &[Vec<String>], target: &T, options: &SyncOptions) -> Vec<SyncResult>
where
  T: TimeLogTarget + ?Sized,
{
  info!(
    rows = rows.len(),
    target = target.name(),
    dry_run = options.dry_run,
    "starting sync"
  );

  let mut results = Vec::with_capacity(rows.len());

  for (offset, row) in rows.iter().enumerate() {
    let index = options.first_row + offset;

    let entry = match parse_row(row, options.layout, options.timezone) {
      Ok(entry) => entry,
      Err(e) => {
        error!(row = index, error = %e, "skipping row");
        results.push(SyncResult::Failed(e));
        continue;
      }
    };

    if options.dry_run {
      let message = format!(
        "dry run: would log {}s for {} at {}",
        entry.seconds,
        entry.task_id,
        entry.started.to_rfc3339()
      );
      info!(row = index, "{}", message);
      results.push(SyncResult::Skipped(message));
      continue;
    }

    match target.create_time_log(&entry).await {
      Ok(logged) => {
        info!(row = index, "Logged time for task {}: {}", entry.task_id, logged);
        results.push(SyncResult::Logged(logged));
      }
      Err(e) => {
        warn!(row = index, task = %entry.task_id, error = %e, "failed to log time");
        results.push(SyncResult::Failed(e));
      }
    }
  }

  results
}
