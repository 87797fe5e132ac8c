use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheLayer, CacheSource, CacheStorage, SqliteStorage};
use crate::error::{Error, Result};
use crate::http;
use crate::sync::{
  read_csv_rows, sync_rows, SyncOptions, SyncResult, TimeLogEntry, TimeLogTarget, WorklogResult,
  FIRST_DATA_ROW,
};
use crate::validate;

use super::api_types::{ApiContact, ApiEnvelope, ApiFolder, ApiTask, ApiTimelog};
use super::types::{EnrichedTimelog, Folder, Task, TaskSummary, Timelog, TimelogFilter};

pub const DEFAULT_API_URL: &str = "https://www.wrike.com/api/v4";
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Wrike API client. Reads are memoized through the cache layer.
pub struct WrikeClient<S: CacheStorage = SqliteStorage> {
  http: Client,
  base_url: String,
  token: String,
  cache: CacheLayer<S>,
}

impl<S: CacheStorage> WrikeClient<S> {
  pub fn new(base_url: &str, token: String, timeout: Duration, storage: S) -> Result<Self> {
    Ok(Self {
      http: http::build_client(timeout)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      token,
      cache: CacheLayer::new(storage),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .http
      .request(method, self.url(path))
      .bearer_auth(&self.token)
  }

  fn auth_headers(&self) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.token)) {
      headers.insert(AUTHORIZATION, value);
    }
    headers
  }

  async fn get_data<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<ApiEnvelope<T>> {
    let response = self.request(Method::GET, path).query(query).send().await?;
    http::json(response).await
  }

  /// ID of the user that owns the access token.
  pub async fn connected_user_id(&self) -> Result<Option<String>> {
    let key = CacheKey::new("connected_user_id");
    self
      .cache
      .fetch_or_compute(&key, || async {
        let envelope: ApiEnvelope<ApiContact> =
          self.get_data("/contacts", &[("me", "true".to_string())]).await?;
        Ok(envelope.data.into_iter().next().map(|c| c.id))
      })
      .await
  }

  /// All tasks of a folder/project (or the whole account), following `nextPageToken`.
  pub async fn get_all_tasks(
    &self,
    folder_or_project_id: Option<&str>,
    page_size: u32,
  ) -> Result<Vec<TaskSummary>> {
    let key = CacheKey::new("get_all_tasks")
      .arg(folder_or_project_id)
      .arg(page_size);
    self
      .cache
      .fetch_or_compute(&key, || self.fetch_all_tasks(folder_or_project_id, page_size))
      .await
  }

  async fn fetch_all_tasks(
    &self,
    folder_or_project_id: Option<&str>,
    page_size: u32,
  ) -> Result<Vec<TaskSummary>> {
    let path = match folder_or_project_id {
      Some(id) => format!("/folders/{}/tasks", id),
      None => "/tasks".to_string(),
    };

    let mut tasks = Vec::new();
    let mut next_page_token: Option<String> = None;

    loop {
      let mut query = vec![
        ("pageSize", page_size.to_string()),
        ("descendants", "true".to_string()),
        ("subTasks", "true".to_string()),
      ];
      if let Some(token) = &next_page_token {
        query.push(("nextPageToken", token.clone()));
      }

      let envelope: ApiEnvelope<ApiTask> = self.get_data(&path, &query).await?;
      tasks.extend(envelope.data.into_iter().map(TaskSummary::from));

      match envelope.next_page_token {
        Some(token) if !token.is_empty() => next_page_token = Some(token),
        _ => break,
      }
    }

    debug!(count = tasks.len(), "fetched wrike tasks");
    Ok(tasks)
  }

  pub async fn list_projects(&self) -> Result<Vec<Folder>> {
    let key = CacheKey::new("list_all_projects");
    self
      .cache
      .fetch_or_compute(&key, || self.fetch_folders(true))
      .await
  }

  pub async fn list_folders(&self) -> Result<Vec<Folder>> {
    let key = CacheKey::new("list_all_folders");
    self
      .cache
      .fetch_or_compute(&key, || self.fetch_folders(false))
      .await
  }

  async fn fetch_folders(&self, projects_only: bool) -> Result<Vec<Folder>> {
    let mut query = Vec::new();
    if projects_only {
      query.push(("project", "true".to_string()));
    }
    let envelope: ApiEnvelope<ApiFolder> = self.get_data("/folders", &query).await?;
    Ok(envelope.data.into_iter().map(Folder::from).collect())
  }

  /// Look up a task. Remote failures are logged and reported as `None`.
  pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
    let task_id = validate::task_id(task_id)?;
    let path = format!("/tasks/{}", task_id);
    let key = CacheKey::new("get_task_by_id").arg(task_id);

    let result = self
      .cache
      .fetch(&key, || async {
        let envelope: ApiEnvelope<ApiTask> = self.get_data(&path, &[]).await?;
        Ok(envelope.data.into_iter().next().map(Task::from))
      })
      .await;

    match result {
      Ok(found) => {
        if found.source == CacheSource::Cache {
          debug!(task_id, "task served from cache");
        }
        Ok(found.data)
      }
      // An undecodable body counts as an unsuccessful lookup too
      Err(e) if e.is_remote() || matches!(e, Error::Json(_)) => {
        http::log_diagnostics(&e, &self.url(&path), &self.auth_headers());
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  /// Log `hours` against a task on `tracked_date` (`YYYY-MM-DD`).
  pub async fn create_time_log(
    &self,
    task_id: &str,
    hours: f64,
    tracked_date: &str,
    comment: &str,
  ) -> Result<Timelog> {
    let task_id = validate::task_id(task_id)?;
    validate::parse_date(tracked_date)?;

    let form = [
      ("hours", hours.to_string()),
      ("trackedDate", tracked_date.to_string()),
      ("comment", comment.to_string()),
    ];
    let response = self
      .request(Method::POST, &format!("/tasks/{}/timelogs", task_id))
      .form(&form)
      .send()
      .await?;

    let envelope: ApiEnvelope<ApiTimelog> = http::json(response).await?;
    envelope
      .data
      .into_iter()
      .next()
      .map(Timelog::from)
      .ok_or_else(|| Error::Remote {
        status: None,
        body: format!("no timelog returned for task {}", task_id),
      })
  }

  pub async fn delete_timelog(&self, timelog_id: &str) -> Result<()> {
    let timelog_id = validate::task_id(timelog_id)?;
    let response = self
      .request(Method::DELETE, &format!("/timelogs/{}", timelog_id))
      .send()
      .await?;
    http::check(response).await?;
    Ok(())
  }

  pub async fn get_timelog(&self, timelog_id: &str) -> Result<Option<Timelog>> {
    let timelog_id = validate::task_id(timelog_id)?;
    let key = CacheKey::new("get_specific_timelog_from_id").arg(timelog_id);
    self
      .cache
      .fetch_or_compute(&key, || async {
        let envelope: ApiEnvelope<ApiTimelog> = self
          .get_data(&format!("/timelogs/{}", timelog_id), &[])
          .await?;
        Ok(envelope.data.into_iter().next().map(Timelog::from))
      })
      .await
  }

  pub async fn list_timelogs(&self, task_id: &str) -> Result<Vec<Timelog>> {
    let task_id = validate::task_id(task_id)?;
    let key = CacheKey::new("list_timelogs").arg(task_id);
    self
      .cache
      .fetch_or_compute(&key, || async {
        let envelope: ApiEnvelope<ApiTimelog> = self
          .get_data(&format!("/tasks/{}/timelogs", task_id), &[])
          .await?;
        Ok(envelope.data.into_iter().map(Timelog::from).collect())
      })
      .await
  }

  /// All timelogs matching `filter`.
  pub async fn get_all_timelogs(&self, filter: &TimelogFilter) -> Result<Vec<Timelog>> {
    let key = CacheKey::new("get_all_timelogs")
      .arg(filter.created.map(range_value))
      .arg(filter.tracked.map(range_value))
      .arg(filter.for_current_user);
    self
      .cache
      .fetch_or_compute(&key, || self.fetch_all_timelogs(filter))
      .await
  }

  async fn fetch_all_timelogs(&self, filter: &TimelogFilter) -> Result<Vec<Timelog>> {
    let mut query = Vec::new();

    if let Some((start, end)) = filter.created {
      let range = serde_json::json!({
        "start": format!("{}T00:00:00Z", start.format("%Y-%m-%d")),
        "end": format!("{}T00:00:00Z", end.format("%Y-%m-%d")),
      });
      query.push(("createdDate", range.to_string()));
    }

    if let Some((start, end)) = filter.tracked {
      let range = serde_json::json!({
        "start": start.format("%Y-%m-%d").to_string(),
        "end": end.format("%Y-%m-%d").to_string(),
      });
      query.push(("trackedDate", range.to_string()));
    }

    if filter.for_current_user {
      query.push(("me", "true".to_string()));
    }

    let envelope: ApiEnvelope<ApiTimelog> = self.get_data("/timelogs", &query).await?;
    Ok(envelope.data.into_iter().map(Timelog::from).collect())
  }

  /// Timelogs joined with the title and permalink of their task.
  pub async fn get_all_timelogs_with_task_data(
    &self,
    filter: &TimelogFilter,
  ) -> Result<Vec<EnrichedTimelog>> {
    let timelogs = self.get_all_timelogs(filter).await?;

    let mut enriched = Vec::with_capacity(timelogs.len());
    for timelog in timelogs {
      let task = match timelog.task_id.as_deref() {
        Some(task_id) => self.get_task(task_id).await.unwrap_or_else(|e| {
          warn!(task_id, error = %e, "could not look up task");
          None
        }),
        None => None,
      };
      enriched.push(EnrichedTimelog::new(timelog, task.as_ref()));
    }

    Ok(enriched)
  }

  /// Delete the connected user's timelogs tracked on `date`.
  ///
  /// Always reads fresh data; in dry-run mode nothing is deleted.
  pub async fn delete_worklogs_for_user_on_date(
    &self,
    date: &str,
    dry_run: bool,
  ) -> Result<Vec<String>> {
    let day = validate::parse_date(date)?;
    let filter = TimelogFilter {
      created: None,
      tracked: Some((day, day)),
      for_current_user: true,
    };

    let timelogs = self.fetch_all_timelogs(&filter).await?;
    let formatted = day.format("%Y-%m-%d").to_string();

    let mut results = Vec::new();
    for timelog in timelogs
      .iter()
      .filter(|t| t.tracked_date.as_deref().map(|d| d.starts_with(&formatted)) == Some(true))
    {
      let task = timelog.task_id.as_deref().unwrap_or("?");

      if dry_run {
        results.push(format!(
          "Dry run mode: Would delete timelog {} for task {}",
          timelog.id, task
        ));
        continue;
      }

      match self.delete_timelog(&timelog.id).await {
        Ok(()) => results.push(format!("Deleted timelog {} for task {}", timelog.id, task)),
        Err(e) => {
          warn!(timelog = %timelog.id, error = %e, "failed to delete timelog");
          results.push(format!(
            "Failed to delete timelog {} for task {}",
            timelog.id, task
          ))
        }
      }
    }

    Ok(results)
  }

  /// Sync a CSV file of `[date, hours, comment, task]` rows into Wrike.
  pub async fn create_timelogs_from_csv(
    &self,
    path: &Path,
    options: &SyncOptions,
  ) -> Result<Vec<SyncResult>> {
    let rows = read_csv_rows(path)?;
    info!(rows = rows.len(), file = %path.display(), "importing timelogs from csv");

    let options = SyncOptions {
      first_row: FIRST_DATA_ROW,
      ..options.clone()
    };
    Ok(sync_rows(&rows, self, &options).await)
  }

  pub fn clear_cache(&self) -> Result<()> {
    self.cache.clear()
  }
}

fn range_value((start, end): (NaiveDate, NaiveDate)) -> serde_json::Value {
  serde_json::json!([start.to_string(), end.to_string()])
}

#[async_trait]
impl<S: CacheStorage> TimeLogTarget for WrikeClient<S> {
  fn name(&self) -> &str {
    "wrike"
  }

  async fn create_time_log(&self, entry: &TimeLogEntry) -> Result<WorklogResult> {
    let hours = entry.seconds as f64 / 3600.0;
    let date = entry.started.date_naive().format("%Y-%m-%d").to_string();

    let timelog =
      WrikeClient::create_time_log(self, &entry.task_id, hours, &date, &entry.comment).await?;

    Ok(WorklogResult {
      service: "wrike".to_string(),
      task_id: entry.task_id.clone(),
      worklog_id: Some(timelog.id),
      seconds: entry.seconds,
      started: timelog.tracked_date.unwrap_or(date),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use serde_json::json;
  use wiremock::matchers::{body_string_contains, header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(server: &MockServer) -> WrikeClient<MemoryStorage> {
    WrikeClient::new(
      &server.uri(),
      "test-token".to_string(),
      http::DEFAULT_TIMEOUT,
      MemoryStorage::default(),
    )
    .unwrap()
  }

  fn task_json(id: &str, title: &str) -> serde_json::Value {
    json!({
      "id": id,
      "title": title,
      "status": "Active",
      "permalink": format!("https://www.wrike.com/open.htm?id={}", id),
    })
  }

  #[tokio::test]
  async fn test_get_task_success_then_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks/abc123"))
      .and(header("authorization", "Bearer test-token"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"kind": "tasks", "data": [task_json("abc123", "Sample Task")]})),
      )
      .expect(1)
      .mount(&server)
      .await;

    let wrike = client(&server);
    let task = wrike.get_task("abc123").await.unwrap().unwrap();
    assert_eq!(task.id, "abc123");
    assert_eq!(task.title, "Sample Task");

    let again = wrike.get_task("abc123").await.unwrap().unwrap();
    assert_eq!(again, task);
  }

  #[tokio::test]
  async fn test_clear_cache_issues_second_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks/abc123"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"data": [task_json("abc123", "Sample Task")]})),
      )
      .expect(2)
      .mount(&server)
      .await;

    let wrike = client(&server);
    wrike.get_task("abc123").await.unwrap();
    wrike.clear_cache().unwrap();
    wrike.get_task("abc123").await.unwrap();
  }

  #[tokio::test]
  async fn test_get_task_failure_is_none_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks/abc123"))
      .respond_with(ResponseTemplate::new(400).set_body_string("invalid request"))
      .expect(2)
      .mount(&server)
      .await;

    let wrike = client(&server);
    assert_eq!(wrike.get_task("abc123").await.unwrap(), None);
    assert_eq!(wrike.get_task("abc123").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_get_task_undecodable_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/tasks/abc123"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
      .expect(1)
      .mount(&server)
      .await;

    assert_eq!(client(&server).get_task("abc123").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_invalid_task_id_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let wrike = client(&server);
    assert!(matches!(
      wrike.get_task("!invalid_id!").await,
      Err(Error::InvalidTaskId { .. })
    ));
    assert!(matches!(
      wrike.create_time_log("ABC-123", 1.0, "2024-10-24", "").await,
      Err(Error::InvalidTaskId { .. })
    ));
    assert!(matches!(
      wrike.create_time_log("abc123", 1.0, "24/10/2024", "").await,
      Err(Error::InvalidDateFormat { .. })
    ));
  }

  #[tokio::test]
  async fn test_get_all_tasks_follows_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/folders/F1/tasks"))
      .and(query_param("nextPageToken", "page2"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"data": [task_json("t3", "Third")]})),
      )
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/folders/F1/tasks"))
      .and(query_param("pageSize", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [task_json("t1", "First"), task_json("t2", "Second")],
        "nextPageToken": "page2"
      })))
      .up_to_n_times(1)
      .mount(&server)
      .await;

    let wrike = client(&server);
    let tasks = wrike.get_all_tasks(Some("F1"), 2).await.unwrap();

    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
  }

  #[tokio::test]
  async fn test_create_time_log_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/tasks/abc123/timelogs"))
      .and(body_string_contains("trackedDate=2024-10-24"))
      .and(body_string_contains("hours=1.5"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [{
          "id": "TL1",
          "taskId": "abc123",
          "hours": 1.5,
          "trackedDate": "2024-10-24",
          "comment": "notes"
        }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let wrike = client(&server);
    let timelog = wrike
      .create_time_log("abc123", 1.5, "2024-10-24", "notes")
      .await
      .unwrap();
    assert_eq!(timelog.id, "TL1");
    assert_eq!(timelog.hours, 1.5);
  }

  #[tokio::test]
  async fn test_create_time_log_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/tasks/abc123/timelogs"))
      .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
      .mount(&server)
      .await;

    let wrike = client(&server);
    let err = wrike
      .create_time_log("abc123", 1.0, "2024-10-24", "")
      .await
      .unwrap_err();
    match err {
      Error::Remote { status, body } => {
        assert_eq!(status, Some(403));
        assert_eq!(body, "forbidden");
      }
      other => panic!("unexpected error {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_delete_worklogs_dry_run_does_not_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/timelogs"))
      .and(query_param("me", "true"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [
          {"id": "TL1", "taskId": "abc123", "hours": 1.0, "trackedDate": "2024-10-24"},
          {"id": "TL2", "taskId": "def456", "hours": 2.0, "trackedDate": "2024-10-23"}
        ]
      })))
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
      .expect(0)
      .mount(&server)
      .await;

    let wrike = client(&server);
    let results = wrike
      .delete_worklogs_for_user_on_date("2024-10-24", true)
      .await
      .unwrap();
    assert_eq!(
      results,
      vec!["Dry run mode: Would delete timelog TL1 for task abc123".to_string()]
    );
  }

  #[tokio::test]
  async fn test_delete_worklogs_reports_each_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/timelogs"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [
          {"id": "TL1", "taskId": "abc123", "hours": 1.0, "trackedDate": "2024-10-24"},
          {"id": "TL2", "taskId": "abc123", "hours": 2.0, "trackedDate": "2024-10-24"}
        ]
      })))
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/timelogs/TL1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/timelogs/TL2"))
      .respond_with(ResponseTemplate::new(500))
      .expect(1)
      .mount(&server)
      .await;

    let wrike = client(&server);
    let results = wrike
      .delete_worklogs_for_user_on_date("2024-10-24", false)
      .await
      .unwrap();
    assert_eq!(
      results,
      vec![
        "Deleted timelog TL1 for task abc123".to_string(),
        "Failed to delete timelog TL2 for task abc123".to_string(),
      ]
    );
  }

  #[tokio::test]
  async fn test_delete_worklogs_rejects_bad_date() {
    let server = MockServer::start().await;
    let wrike = client(&server);
    assert!(matches!(
      wrike.delete_worklogs_for_user_on_date("10/24/2024", true).await,
      Err(Error::InvalidDateFormat { .. })
    ));
  }

  #[tokio::test]
  async fn test_timelogs_with_task_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/timelogs"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [
          {"id": "TL1", "taskId": "abc123", "hours": 1.0, "trackedDate": "2024-10-24", "comment": "a"},
          {"id": "TL2", "taskId": "missing1", "hours": 2.0, "trackedDate": "2024-10-24", "comment": "b"}
        ]
      })))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/tasks/abc123"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"data": [task_json("abc123", "Known")]})),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/tasks/missing1"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let wrike = client(&server);
    let enriched = wrike
      .get_all_timelogs_with_task_data(&TimelogFilter {
        for_current_user: true,
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(enriched.len(), 2);
    assert_eq!(enriched[0].task_name, "Known");
    assert!(enriched[0].permalink.is_some());
    assert_eq!(enriched[1].task_name, "Unknown Task Name");
  }

  #[tokio::test]
  async fn test_csv_import_dry_run() {
    use std::io::Write;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,hours,comment,task").unwrap();
    writeln!(file, "2024-10-24,1.5,notes,abc123 Write report").unwrap();
    writeln!(file, "2024-10-25,2").unwrap();

    let wrike = client(&server);
    let results = wrike
      .create_timelogs_from_csv(file.path(), &SyncOptions::default().dry_run(true))
      .await
      .unwrap();

    assert_eq!(results.len(), 2);
    assert!(matches!(&results[0], SyncResult::Skipped(m) if m.contains("5400s for abc123")));
    assert!(matches!(
      results[1],
      SyncResult::Failed(Error::MissingFields { .. })
    ));
  }
}
