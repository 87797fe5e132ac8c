//! Subcommands and their dispatch

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use crate::cache::{CacheStorage, NoopStorage, SqliteStorage};
use crate::clockify::{self, ClockifyClient};
use crate::config::Config;
use crate::http;
use crate::jira::JiraClient;
use crate::matching::{self, Matcher, OpenAiOracle};
use crate::sheets::{self, SheetsClient, TokenStore};
use crate::sync::{
  localize, parse_datetime, read_csv_rows, sync_rows, RowLayout, SyncOptions, SyncResult,
  SyncSummary, FIRST_DATA_ROW,
};
use crate::toggl::{self, TogglClient};
use crate::validate;
use crate::wrike::types::{self as wrike_types, EnrichedTimelog, TimelogFilter};
use crate::wrike::{WrikeClient, DEFAULT_PAGE_SIZE};

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Toggl time entries
  #[command(subcommand, visible_alias = "t")]
  Toggl(TogglCommand),
  /// Clockify time entries
  #[command(subcommand, visible_alias = "c")]
  Clockify(ClockifyCommand),
  /// Wrike tasks and timelogs
  #[command(subcommand, visible_alias = "w")]
  Wrike(WrikeCommand),
  /// Jira worklogs
  #[command(subcommand, visible_alias = "j")]
  Jira(JiraCommand),
  /// Google Sheets import and export
  #[command(subcommand, visible_alias = "s")]
  Sheets(SheetsCommand),
  /// Text matching through the OpenAI API
  #[command(subcommand)]
  Openai(OpenAiCommand),
  /// Pair Toggl entries with Wrike tasks
  #[command(visible_alias = "m")]
  Match {
    /// YYYY-MM-DD
    start: String,
    /// YYYY-MM-DD
    end: String,
  },
}

#[derive(Debug, Subcommand)]
pub enum TogglCommand {
  /// List time entries between two dates (inclusive)
  #[command(visible_alias = "ls")]
  Entries { start: String, end: String },
  /// Add a time entry; times are in the configured timezone
  Add {
    description: String,
    /// "YYYY-MM-DD HH:MM:SS" or "MM/DD/YYYY HH:MM AM"
    start: String,
    end: String,
    #[arg(long)]
    dry_run: bool,
  },
  /// Delete every entry on a date
  DeleteOnDate {
    date: String,
    #[arg(long)]
    dry_run: bool,
  },
}

#[derive(Debug, Subcommand)]
pub enum ClockifyCommand {
  Workspaces,
  /// Show the user that owns the API key
  Me,
  #[command(visible_alias = "ls")]
  Entries {
    start: String,
    end: String,
    /// Defaults to clockify.workspace_id
    #[arg(long)]
    workspace: Option<String>,
  },
  Add {
    start: String,
    end: String,
    description: String,
    #[arg(long)]
    workspace: Option<String>,
    #[arg(long)]
    dry_run: bool,
  },
  DeleteOnDate {
    date: String,
    #[arg(long)]
    workspace: Option<String>,
    #[arg(long)]
    dry_run: bool,
  },
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ListFormat {
  #[default]
  Tsv,
  Csv,
}

#[derive(Debug, Subcommand)]
pub enum WrikeCommand {
  /// ID of the user owning the access token
  Me,
  /// List tasks of a folder or project (all tasks without --folder)
  Tasks {
    #[arg(long)]
    folder: Option<String>,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,
    #[arg(long, value_enum, default_value_t)]
    format: ListFormat,
  },
  Projects,
  Folders,
  Task { task_id: String },
  /// Log hours against a task
  LogTime {
    task_id: String,
    hours: f64,
    /// YYYY-MM-DD
    date: String,
    #[arg(long, default_value = "")]
    comment: String,
    #[arg(long)]
    dry_run: bool,
  },
  /// Import a CSV of [date, hours, comment, task] rows
  ImportCsv {
    path: PathBuf,
    #[arg(long)]
    dry_run: bool,
  },
  /// Timelogs of one task
  Timelogs { task_id: String },
  Timelog { timelog_id: String },
  /// Timelogs across the account
  AllTimelogs {
    #[arg(long, requires = "created_end")]
    created_start: Option<String>,
    #[arg(long, requires = "created_start")]
    created_end: Option<String>,
    #[arg(long, requires = "tracked_end")]
    tracked_start: Option<String>,
    #[arg(long, requires = "tracked_start")]
    tracked_end: Option<String>,
    /// Only the connected user's timelogs
    #[arg(long)]
    me: bool,
    /// Add task title and permalink
    #[arg(long)]
    with_tasks: bool,
  },
  DeleteTimelog {
    timelog_id: String,
    #[arg(long)]
    dry_run: bool,
  },
  /// Delete the connected user's timelogs on a date
  DeleteOnDate {
    date: String,
    #[arg(long)]
    dry_run: bool,
  },
  ClearCache,
}

#[derive(Debug, Subcommand)]
pub enum JiraCommand {
  Task {
    issue_key: String,
    #[arg(long, default_value = "default")]
    instance: String,
  },
  /// Log time on an issue
  LogTime {
    issue_key: String,
    /// Start time in the configured timezone
    start: String,
    hours: String,
    #[arg(long, default_value = "")]
    comment: String,
    #[arg(long, default_value = "default")]
    instance: String,
    #[arg(long)]
    dry_run: bool,
  },
  /// The current user's worklogs between two dates
  #[command(visible_alias = "ls")]
  Entries {
    start: String,
    end: String,
    #[arg(long, default_value = "default")]
    instance: String,
  },
  DeleteOnDate {
    date: String,
    #[arg(long, default_value = "default")]
    instance: String,
    #[arg(long)]
    dry_run: bool,
  },
  /// Import worklogs from a CSV file with a header row
  ImportCsv {
    path: PathBuf,
    #[arg(long, value_enum, default_value_t)]
    layout: RowLayout,
    #[arg(long, default_value = "default")]
    instance: String,
    #[arg(long)]
    dry_run: bool,
  },
}

#[derive(Debug, Subcommand)]
pub enum SheetsCommand {
  /// Print the rows of a sheet
  Fetch { title: String },
  /// Export Wrike tasks of the configured folders to a new sheet
  SyncWrike {
    #[arg(long)]
    dry_run: bool,
  },
  /// Log the rows of a sheet into Wrike
  ToWrike {
    /// Defaults to "wrike sync <today>"
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    dry_run: bool,
  },
  /// Log the rows of a worksheet into Jira
  ToJira {
    sheet: String,
    #[arg(long, default_value = "default")]
    instance: String,
    #[arg(long)]
    dry_run: bool,
  },
  /// Log the "Jira Sync <client>" sheet into the <client> Jira instance
  Sync {
    client: String,
    #[arg(long)]
    dry_run: bool,
  },
}

#[derive(Debug, Subcommand)]
pub enum OpenAiCommand {
  /// Print the candidate closest to the query
  BestMatch {
    query: String,
    #[arg(required = true)]
    candidates: Vec<String>,
  },
}

/// Everything a command needs besides its own arguments
pub struct Context {
  pub config: Config,
  pub no_cache: bool,
}

impl Context {
  fn timezone(&self) -> Result<Tz> {
    self.config.timezone()
  }

  fn sync_options(&self, dry_run: bool) -> Result<SyncOptions> {
    Ok(SyncOptions {
      timezone: self.timezone()?,
      ..SyncOptions::default().dry_run(dry_run)
    })
  }

  fn today(&self) -> Result<NaiveDate> {
    Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
  }

  fn storage(&self) -> Result<Box<dyn CacheStorage>> {
    if self.no_cache {
      return Ok(Box::new(NoopStorage));
    }
    Ok(Box::new(SqliteStorage::open(&self.config.cache_dir()?)?))
  }

  fn toggl(&self) -> Result<TogglClient> {
    Ok(TogglClient::new(
      &self.config.toggl.api_url,
      Config::toggl_api_key()?,
      self.config.toggl.workspace_id,
      self.timezone()?,
      self.config.request_timeout(),
    )?)
  }

  fn clockify(&self) -> Result<ClockifyClient> {
    Ok(ClockifyClient::new(
      &self.config.clockify.api_url,
      Config::clockify_api_key()?,
      self.timezone()?,
      self.config.request_timeout(),
    )?)
  }

  fn clockify_workspace(&self, flag: Option<String>) -> Result<String> {
    flag
      .or_else(|| self.config.clockify.workspace_id.clone())
      .ok_or_else(|| eyre!("No Clockify workspace. Pass --workspace or set clockify.workspace_id."))
  }

  fn wrike(&self) -> Result<WrikeClient<Box<dyn CacheStorage>>> {
    Ok(WrikeClient::new(
      &self.config.wrike.api_url,
      Config::wrike_token()?,
      self.config.request_timeout(),
      self.storage()?,
    )?)
  }

  fn jira(&self, instance: &str) -> Result<JiraClient> {
    let instance = self.config.jira_instance(instance)?;
    Ok(JiraClient::new(
      instance,
      Config::jira_token(instance)?,
      self.config.request_timeout(),
    )?)
  }

  async fn sheets(&self) -> Result<SheetsClient> {
    let mut tokens = TokenStore::load(&self.config.google_sheets.token_file)?;
    let access_token = tokens
      .access_token(&http::build_client(self.config.request_timeout())?)
      .await?;

    Ok(SheetsClient::new(
      &self.config.google_sheets.api_url,
      self.config.spreadsheet_id()?,
      access_token,
      self.config.request_timeout(),
    )?)
  }

  fn matcher(&self) -> Result<Matcher<OpenAiOracle>> {
    let oracle = OpenAiOracle::new(
      &self.config.openai.api_url,
      Config::openai_api_key()?,
      self.config.request_timeout(),
    )?;
    Ok(Matcher::new(oracle, self.config.matcher_config()))
  }
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
  match command {
    Command::Toggl(cmd) => run_toggl(cmd, ctx).await,
    Command::Clockify(cmd) => run_clockify(cmd, ctx).await,
    Command::Wrike(cmd) => run_wrike(cmd, ctx).await,
    Command::Jira(cmd) => run_jira(cmd, ctx).await,
    Command::Sheets(cmd) => run_sheets(cmd, ctx).await,
    Command::Openai(cmd) => run_openai(cmd, ctx).await,
    Command::Match { start, end } => {
      let matches = matching::match_toggl_to_wrike(
        &ctx.toggl()?,
        &ctx.wrike()?,
        &ctx.matcher()?,
        &ctx.config.wrike.folder_ids,
        &start,
        &end,
      )
      .await?;
      for m in matches {
        println!("{}", m);
      }
      Ok(())
    }
  }
}

async fn run_toggl(cmd: TogglCommand, ctx: &Context) -> Result<()> {
  let toggl = ctx.toggl()?;
  match cmd {
    TogglCommand::Entries { start, end } => {
      let entries = toggl.list_entries(&start, &end).await?;
      println!("{}", toggl::entries_to_tsv(&entries));
    }
    TogglCommand::Add {
      description,
      start,
      end,
      dry_run,
    } => {
      let tz = ctx.timezone()?;
      let (start, end) = (local_time(&start, tz)?, local_time(&end, tz)?);
      if dry_run {
        println!("Dry run mode: Would add time entry {} to {} ({})", start, end, description);
        return Ok(());
      }
      let entry = toggl.add_time_entry(&description, start, end).await?;
      println!("Added time entry {} ({})", entry.id, entry.description());
    }
    TogglCommand::DeleteOnDate { date, dry_run } => {
      print_lines(&toggl.delete_entries_on_date(&date, dry_run).await?);
    }
  }
  Ok(())
}

async fn run_clockify(cmd: ClockifyCommand, ctx: &Context) -> Result<()> {
  let clockify = ctx.clockify()?;
  match cmd {
    ClockifyCommand::Workspaces => {
      for ws in clockify.workspaces().await? {
        println!("{}\t{}", ws.id, ws.name);
      }
    }
    ClockifyCommand::Me => {
      let user = clockify.current_user().await?;
      println!("{}\t{}\t{}", user.id, user.name, user.email);
    }
    ClockifyCommand::Entries {
      start,
      end,
      workspace,
    } => {
      let workspace = ctx.clockify_workspace(workspace)?;
      let entries = clockify.list_entries(&workspace, &start, &end).await?;
      println!("{}", clockify::entries_to_tsv(&entries));
    }
    ClockifyCommand::Add {
      start,
      end,
      description,
      workspace,
      dry_run,
    } => {
      let workspace = ctx.clockify_workspace(workspace)?;
      let tz = ctx.timezone()?;
      let (start, end) = (local_time(&start, tz)?, local_time(&end, tz)?);
      if dry_run {
        println!("Dry run mode: Would add time entry {} to {} ({})", start, end, description);
        return Ok(());
      }
      let entry = clockify
        .add_time_entry(&workspace, start, end, &description)
        .await?;
      println!("Added time entry {} ({})", entry.id, entry.description);
    }
    ClockifyCommand::DeleteOnDate {
      date,
      workspace,
      dry_run,
    } => {
      let workspace = ctx.clockify_workspace(workspace)?;
      print_lines(
        &clockify
          .delete_entries_on_date(&workspace, &date, dry_run)
          .await?,
      );
    }
  }
  Ok(())
}

async fn run_wrike(cmd: WrikeCommand, ctx: &Context) -> Result<()> {
  let wrike = ctx.wrike()?;
  match cmd {
    WrikeCommand::Me => match wrike.connected_user_id().await? {
      Some(id) => println!("{}", id),
      None => println!("No connected user"),
    },
    WrikeCommand::Tasks {
      folder,
      page_size,
      format,
    } => {
      let tasks = wrike.get_all_tasks(folder.as_deref(), page_size).await?;
      match format {
        ListFormat::Tsv => println!("{}", wrike_types::tasks_to_tsv(&tasks)),
        ListFormat::Csv => print!("{}", wrike_types::tasks_to_csv(&tasks)?),
      }
    }
    WrikeCommand::Projects => {
      for folder in wrike.list_projects().await? {
        println!("{}\t{}", folder.id, folder.title);
      }
    }
    WrikeCommand::Folders => {
      for folder in wrike.list_folders().await? {
        println!("{}\t{}", folder.id, folder.title);
      }
    }
    WrikeCommand::Task { task_id } => match wrike.get_task(&task_id).await? {
      Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
      None => println!("Task {} not found", task_id),
    },
    WrikeCommand::LogTime {
      task_id,
      hours,
      date,
      comment,
      dry_run,
    } => {
      validate::task_id(&task_id)?;
      validate::parse_date(&date)?;
      if dry_run {
        println!(
          "Dry run mode: Would log {} hours for task {} on {}",
          hours, task_id, date
        );
      } else {
        let timelog = wrike.create_time_log(&task_id, hours, &date, &comment).await?;
        println!("Created timelog {} for task {}", timelog.id, task_id);
      }
    }
    WrikeCommand::ImportCsv { path, dry_run } => {
      let results = wrike
        .create_timelogs_from_csv(&path, &ctx.sync_options(dry_run)?)
        .await?;
      print_results(&results, FIRST_DATA_ROW);
    }
    WrikeCommand::Timelogs { task_id } => {
      println!(
        "{}",
        wrike_types::timelogs_to_tsv(&wrike.list_timelogs(&task_id).await?)
      );
    }
    WrikeCommand::Timelog { timelog_id } => match wrike.get_timelog(&timelog_id).await? {
      Some(timelog) => println!("{}", serde_json::to_string_pretty(&timelog)?),
      None => println!("Timelog {} not found", timelog_id),
    },
    WrikeCommand::AllTimelogs {
      created_start,
      created_end,
      tracked_start,
      tracked_end,
      me,
      with_tasks,
    } => {
      let filter = TimelogFilter {
        created: optional_range(created_start, created_end)?,
        tracked: optional_range(tracked_start, tracked_end)?,
        for_current_user: me,
      };
      if with_tasks {
        let enriched: Vec<EnrichedTimelog> = wrike.get_all_timelogs_with_task_data(&filter).await?;
        println!("{}", serde_json::to_string_pretty(&enriched)?);
      } else {
        println!(
          "{}",
          wrike_types::timelogs_to_tsv(&wrike.get_all_timelogs(&filter).await?)
        );
      }
    }
    WrikeCommand::DeleteTimelog {
      timelog_id,
      dry_run,
    } => {
      validate::task_id(&timelog_id)?;
      if dry_run {
        println!("Dry run mode: Would delete timelog {}", timelog_id);
      } else {
        wrike.delete_timelog(&timelog_id).await?;
        println!("Deleted timelog {}", timelog_id);
      }
    }
    WrikeCommand::DeleteOnDate { date, dry_run } => {
      print_lines(&wrike.delete_worklogs_for_user_on_date(&date, dry_run).await?);
    }
    WrikeCommand::ClearCache => {
      wrike.clear_cache()?;
      println!("Cache cleared");
    }
  }
  Ok(())
}

async fn run_jira(cmd: JiraCommand, ctx: &Context) -> Result<()> {
  match cmd {
    JiraCommand::Task {
      issue_key,
      instance,
    } => match ctx.jira(&instance)?.get_task(&issue_key).await? {
      Some(issue) => println!("{}", serde_json::to_string_pretty(&issue)?),
      None => println!("Issue {} not found", issue_key),
    },
    JiraCommand::LogTime {
      issue_key,
      start,
      hours,
      comment,
      instance,
      dry_run,
    } => {
      let jira = ctx.jira(&instance)?;
      // Reuse the row path so CLI and sheet imports agree on parsing
      let row = vec![start, hours, comment, issue_key];
      let options = ctx.sync_options(dry_run)?;
      print_results(&sync_rows(&[row], &jira, &options).await, options.first_row);
    }
    JiraCommand::Entries {
      start,
      end,
      instance,
    } => {
      for worklog in ctx.jira(&instance)?.list_entries(&start, &end).await? {
        println!(
          "{}\t{}\t{}\t{}\t{}",
          worklog.issue_key,
          worklog.id,
          worklog.started,
          worklog.time_spent_seconds,
          worklog.comment.as_deref().unwrap_or("")
        );
      }
    }
    JiraCommand::DeleteOnDate {
      date,
      instance,
      dry_run,
    } => {
      let jira = ctx.jira(&instance)?;
      print_lines(&jira.delete_worklogs_for_user_on_date(&date, dry_run).await?);
    }
    JiraCommand::ImportCsv {
      path,
      layout,
      instance,
      dry_run,
    } => {
      let jira = ctx.jira(&instance)?;
      let rows = read_csv_rows(&path)?;
      let options = SyncOptions {
        layout,
        first_row: FIRST_DATA_ROW,
        ..ctx.sync_options(dry_run)?
      };
      print_results(&sync_rows(&rows, &jira, &options).await, options.first_row);
    }
  }
  Ok(())
}

async fn run_sheets(cmd: SheetsCommand, ctx: &Context) -> Result<()> {
  let client = ctx.sheets().await?;
  match cmd {
    SheetsCommand::Fetch { title } => match sheets::fetch_data_from_sheet(&client, &title).await? {
      Some(rows) => {
        for row in rows {
          println!("{}", row.join("\t"));
        }
      }
      None => println!("No data found in sheet: {}", title),
    },
    SheetsCommand::SyncWrike { dry_run } => {
      if dry_run {
        println!(
          "Dry run mode: Would write tasks of {} folder(s) to sheet {}",
          ctx.config.wrike.folder_ids.len(),
          sheets::wrike_tasks_title(ctx.today()?)
        );
        return Ok(());
      }
      let title = sheets::sync_wrike_to_sheets(
        &client,
        &ctx.wrike()?,
        &ctx.config.wrike.folder_ids,
        ctx.today()?,
      )
      .await?;
      println!("Sync completed. Data added to the sheet: {}", title);
    }
    SheetsCommand::ToWrike { title, dry_run } => {
      let title = match title {
        Some(t) => t,
        None => sheets::wrike_sync_title(ctx.today()?),
      };
      let results =
        sheets::sync_sheet_to_wrike(&client, &ctx.wrike()?, &title, &ctx.sync_options(dry_run)?)
          .await?;
      print_results(&results, FIRST_DATA_ROW);
    }
    SheetsCommand::ToJira {
      sheet,
      instance,
      dry_run,
    } => {
      let results = sheets::sync_sheet_to_jira(
        &client,
        &ctx.jira(&instance)?,
        &sheet,
        &ctx.sync_options(dry_run)?,
      )
      .await?;
      print_results(&results, FIRST_DATA_ROW);
    }
    SheetsCommand::Sync { client: name, dry_run } => {
      let results = sheets::sync(
        &client,
        &ctx.jira(&name)?,
        &name,
        &ctx.sync_options(dry_run)?,
      )
      .await?;
      print_results(&results, FIRST_DATA_ROW);
    }
  }
  Ok(())
}

async fn run_openai(cmd: OpenAiCommand, ctx: &Context) -> Result<()> {
  match cmd {
    OpenAiCommand::BestMatch { query, candidates } => {
      match ctx.matcher()?.best_match(&query, &candidates).await {
        Some(best) => println!("{}", best),
        None => println!("No match"),
      }
    }
  }
  Ok(())
}

/// Parse a naive CLI timestamp in the configured zone.
fn local_time(value: &str, tz: Tz) -> Result<DateTime<FixedOffset>> {
  Ok(localize(parse_datetime(value)?, tz))
}

fn optional_range(
  start: Option<String>,
  end: Option<String>,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
  match (start, end) {
    (Some(start), Some(end)) => Ok(Some(validate::date_range(&start, &end)?)),
    (None, None) => Ok(None),
    _ => Err(eyre!("Both ends of a date range are required")),
  }
}

fn print_lines(lines: &[String]) {
  if lines.is_empty() {
    println!("Nothing to do");
  }
  for line in lines {
    println!("{}", line);
  }
}

/// One line per result, numbered like the source rows (`first_row` is the first).
fn print_results(results: &[SyncResult], first_row: usize) {
  for line in result_lines(results, first_row) {
    println!("{}", line);
  }
  println!("{}", SyncSummary::from_results(results));
}

fn result_lines(results: &[SyncResult], first_row: usize) -> Vec<String> {
  results
    .iter()
    .enumerate()
    .map(|(offset, result)| {
      let row = first_row + offset;
      match result {
        SyncResult::Logged(worklog) => format!("{}: logged {}", row, worklog),
        SyncResult::Skipped(reason) => format!("{}: {}", row, reason),
        SyncResult::Failed(e) => format!("{}: failed: {}", row, e),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Debug, Parser)]
  struct Cli {
    #[command(subcommand)]
    command: Command,
  }

  #[test]
  fn test_parse_wrike_log_time() {
    let cli = Cli::try_parse_from([
      "timesync", "wrike", "log-time", "IEAAA1", "1.5", "2024-10-24", "--comment", "notes",
      "--dry-run",
    ])
    .unwrap();

    match cli.command {
      Command::Wrike(WrikeCommand::LogTime {
        task_id,
        hours,
        dry_run,
        ..
      }) => {
        assert_eq!(task_id, "IEAAA1");
        assert_eq!(hours, 1.5);
        assert!(dry_run);
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_aliases() {
    let cli = Cli::try_parse_from(["timesync", "t", "ls", "2024-10-01", "2024-10-31"]).unwrap();
    assert!(matches!(cli.command, Command::Toggl(TogglCommand::Entries { .. })));
  }

  #[test]
  fn test_jira_defaults_to_first_instance() {
    let cli = Cli::try_parse_from(["timesync", "jira", "task", "ABC-1"]).unwrap();
    match cli.command {
      Command::Jira(JiraCommand::Task { instance, .. }) => assert_eq!(instance, "default"),
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_sheets_sync_takes_client() {
    let cli = Cli::try_parse_from(["timesync", "sheets", "sync", "acme", "--dry-run"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Sheets(SheetsCommand::Sync { ref client, dry_run: true }) if client == "acme"
    ));
  }

  #[test]
  fn test_adds_accept_dry_run() {
    let cli = Cli::try_parse_from([
      "timesync", "toggl", "add", "standup", "2024-10-24 09:00:00", "2024-10-24 09:15:00",
      "--dry-run",
    ])
    .unwrap();
    assert!(matches!(cli.command, Command::Toggl(TogglCommand::Add { dry_run: true, .. })));

    let cli = Cli::try_parse_from(["timesync", "s", "sync-wrike", "--dry-run"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Sheets(SheetsCommand::SyncWrike { dry_run: true })
    ));
  }

  #[test]
  fn test_best_match_requires_candidates() {
    assert!(Cli::try_parse_from(["timesync", "openai", "best-match", "query"]).is_err());
  }

  #[test]
  fn test_optional_range() {
    assert_eq!(optional_range(None, None).unwrap(), None);
    assert!(optional_range(Some("2024-10-01".into()), None).is_err());
    assert!(optional_range(Some("2024-10-02".into()), Some("2024-10-01".into())).is_err());
  }

  #[test]
  fn test_result_lines_follow_source_rows() {
    let results = vec![
      SyncResult::Skipped("dry run: would log 60s for A-1".to_string()),
      SyncResult::Failed(crate::error::Error::MissingFields {
        expected: 4,
        actual: 2,
      }),
    ];
    let lines = result_lines(&results, FIRST_DATA_ROW);
    assert!(lines[0].starts_with("2: dry run"));
    assert!(lines[1].starts_with("3: failed"));
  }

  #[test]
  fn test_local_time_uses_zone() {
    let at = local_time("10/24/2024 4:15 PM", chrono_tz::America::Montreal).unwrap();
    assert_eq!(at.to_rfc3339(), "2024-10-24T16:15:00-04:00");
  }
}
