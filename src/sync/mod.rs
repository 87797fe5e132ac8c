//! Row transform and sync engine.
//!
//! Rows from a spreadsheet or CSV file are parsed, localized and written to
//! a [`TimeLogTarget`] one at a time, producing one [`SyncResult`] per row.

mod engine;
mod row;
mod target;

pub use engine::{sync_rows, SyncOptions, FIRST_DATA_ROW};
pub use row::{
  local_date, local_day_bounds, localize, parse_datetime, read_csv_rows, task_id_from_reference,
  RowLayout,
};
pub use target::{TimeLogEntry, TimeLogTarget, WorklogResult};

use crate::error::Error;

/// Outcome of syncing a single row.
#[derive(Debug)]
pub enum SyncResult {
  Logged(WorklogResult),
  Skipped(String),
  Failed(Error),
}

/// Counts of each outcome in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
  pub logged: usize,
  pub skipped: usize,
  pub failed: usize,
}

impl SyncSummary {
  pub fn from_results(results: &[SyncResult]) -> Self {
    results.iter().fold(Self::default(), |mut acc, r| {
      match r {
        SyncResult::Logged(_) => acc.logged += 1,
        SyncResult::Skipped(_) => acc.skipped += 1,
        SyncResult::Failed(_) => acc.failed += 1,
      }
      acc
    })
  }
}

impl std::fmt::Display for SyncSummary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} logged, {} skipped, {} failed",
      self.logged, self.skipped, self.failed
    )
  }
}
