use crate::config::JiraInstance;
use crate::error::{Error, Result};
use crate::http;
use crate::jira::api_types::{ApiIssue, ApiUser, ApiWorklog, ApiWorklogsResponse};
use crate::jira::types::{Issue, Worklog};
use crate::sync::{TimeLogEntry, TimeLogTarget, WorklogResult};
use crate::validate;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timestamp layout Jira expects for `started`, e.g. `2024-10-24T16:15:00.000-0400`
pub const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const PAGE_SIZE: u64 = 50;

/// Jira API client wrapper
#[derive(Clone)]
pub struct JiraClient {
  client: gouqi::r#async::Jira,
  instance: String,
  base_url: String,
  timeout: Duration,
}

impl JiraClient {
  pub fn new(instance: &JiraInstance, token: String, timeout: Duration) -> Result<Self> {
    let credentials = gouqi::Credentials::Basic(instance.user_email.clone(), token);

    let client = gouqi::r#async::Jira::new(&instance.base_url, credentials)
      .map_err(|e| Error::jira(format!("Failed to create Jira client: {}", e)))?;

    Ok(Self {
      client,
      instance: instance.name.clone(),
      base_url: instance.base_url.trim_end_matches('/').to_string(),
      timeout,
    })
  }

  /// Run one SDK call under the request timeout.
  ///
  /// HTTP error responses become `Error::Remote` with their status.
  async fn call<T, F>(&self, what: &str, fut: F) -> Result<T>
  where
    F: Future<Output = std::result::Result<T, gouqi::Error>>,
  {
    match tokio::time::timeout(self.timeout, fut).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => match response_status(&e) {
        Some(status) => Err(Error::Remote {
          status: Some(status),
          body: format!("{}: {}", what, e),
        }),
        None => Err(Error::jira(format!("{}: {}", what, e))),
      },
      Err(_) => Err(Error::Remote {
        status: None,
        body: format!("{}: request timed out after {:?}", what, self.timeout),
      }),
    }
  }

  fn url(&self, endpoint: &str) -> String {
    format!("{}/rest/api/latest{}", self.base_url, endpoint)
  }

  /// Headers gouqi sends, for diagnostics; the credential itself is never kept here.
  fn request_headers(&self) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
  }

  /// Get a single issue by key. Remote failures are logged and reported as `None`.
  pub async fn get_task(&self, key: &str) -> Result<Option<Issue>> {
    let key = validate::issue_key(key)?;
    let endpoint = format!("/issue/{}?fields=summary,status,issuetype,assignee,updated", key);

    let result: Result<ApiIssue> = self
      .call("Failed to get issue", self.client.get("api", &endpoint))
      .await;

    match result {
      Ok(issue) => Ok(Some(issue.into_issue())),
      Err(e) => {
        warn!(instance = %self.instance, issue = key, "issue lookup failed");
        http::log_diagnostics(&e, &self.url(&endpoint), &self.request_headers());
        Ok(None)
      }
    }
  }

  /// Create a worklog on `entry.task_id`.
  pub async fn log_time(&self, entry: &TimeLogEntry) -> Result<Worklog> {
    let key = validate::issue_key(&entry.task_id)?;
    let endpoint = format!("/issue/{}/worklog", key);

    let body = serde_json::json!({
      "started": entry.started.format(STARTED_FORMAT).to_string(),
      "timeSpentSeconds": entry.seconds,
      "comment": entry.comment,
    });

    let created: ApiWorklog = self
      .call("Failed to add worklog", self.client.post("api", &endpoint, body))
      .await?;

    info!(instance = %self.instance, issue = key, worklog = %created.id, "worklog created");
    Ok(created.into_worklog(key))
  }

  /// Identity of the authenticated user, as used in worklog authors
  pub async fn current_user(&self) -> Result<String> {
    let user: ApiUser = self
      .call("Failed to get current user", self.client.get("api", "/myself"))
      .await?;

    user
      .identity()
      .map(String::from)
      .ok_or_else(|| Error::jira("current user has neither accountId nor name"))
  }

  /// Keys of all issues matching `jql`; the SDK stream follows the result pages.
  async fn search_issue_keys(&self, jql: &str) -> Result<Vec<String>> {
    let options = gouqi::SearchOptions::default();

    self
      .call("Failed to search issues", async {
        let search = self.client.search();
        let stream = search.stream(jql, &options).await?;
        Ok::<_, gouqi::Error>(stream.map(|issue| issue.key).collect::<Vec<_>>().await)
      })
      .await
  }

  /// All worklogs of one issue
  async fn issue_worklogs(&self, key: &str) -> Result<Vec<Worklog>> {
    let mut worklogs = Vec::new();
    let mut start_at = 0u64;

    loop {
      let endpoint = format!(
        "/issue/{}/worklog?startAt={}&maxResults={}",
        key, start_at, PAGE_SIZE
      );

      let response: ApiWorklogsResponse = self
        .call("Failed to get worklogs", self.client.get("api", &endpoint))
        .await?;

      let count = response.worklogs.len() as u64;
      worklogs.extend(response.worklogs.into_iter().map(|w| w.into_worklog(key)));

      if count == 0 || response.start_at + count >= response.total {
        break;
      }
      start_at = response.start_at + count;
    }

    Ok(worklogs)
  }

  /// The current user's worklogs started between `start` and `end` (inclusive).
  pub async fn list_entries(&self, start: &str, end: &str) -> Result<Vec<Worklog>> {
    let (start, end) = validate::date_range(start, end)?;
    let user = self.current_user().await?;

    let jql = format!(
      "worklogAuthor = currentUser() AND worklogDate >= \"{}\" AND worklogDate <= \"{}\"",
      start, end
    );
    let keys = self.search_issue_keys(&jql).await?;
    debug!(instance = %self.instance, issues = keys.len(), "issues with worklogs in range");

    let mut entries = Vec::new();
    for key in keys {
      let worklogs = self.issue_worklogs(&key).await?;
      entries.extend(
        worklogs
          .into_iter()
          .filter(|w| w.author.as_deref() == Some(user.as_str()))
          .filter(|w| within(w, start, end)),
      );
    }

    Ok(entries)
  }

  pub async fn delete_worklog(&self, issue_key: &str, worklog_id: &str) -> Result<()> {
    let endpoint = format!("/issue/{}/worklog/{}", issue_key, worklog_id);
    self
      .call::<Value, _>("Failed to delete worklog", self.client.delete("api", &endpoint))
      .await?;
    Ok(())
  }

  /// Delete the current user's worklogs started on `date`.
  ///
  /// In dry-run mode nothing is deleted.
  pub async fn delete_worklogs_for_user_on_date(
    &self,
    date: &str,
    dry_run: bool,
  ) -> Result<Vec<String>> {
    let day = validate::parse_date(date)?;
    let worklogs = self.list_entries(date, date).await?;
    let user = self.current_user().await?;

    let mut results = Vec::new();
    for worklog in worklogs_to_delete(&worklogs, &user, day) {
      if dry_run {
        results.push(format!(
          "Dry run mode: Would delete worklog {} for issue {}",
          worklog.id, worklog.issue_key
        ));
        continue;
      }

      match self.delete_worklog(&worklog.issue_key, &worklog.id).await {
        Ok(()) => results.push(format!(
          "Deleted worklog {} for issue {}",
          worklog.id, worklog.issue_key
        )),
        Err(e) => {
          warn!(worklog = %worklog.id, error = %e, "failed to delete worklog");
          results.push(format!(
            "Failed to delete worklog {} for issue {}",
            worklog.id, worklog.issue_key
          ))
        }
      }
    }

    Ok(results)
  }
}

/// Status of an HTTP error response reported by the SDK
fn response_status(e: &gouqi::Error) -> Option<u16> {
  match e {
    gouqi::Error::Fault { code, .. } => Some(code.as_u16()),
    gouqi::Error::NotFound => Some(404),
    gouqi::Error::Unauthorized => Some(401),
    gouqi::Error::MethodNotAllowed => Some(405),
    _ => None,
  }
}

fn within(worklog: &Worklog, start: NaiveDate, end: NaiveDate) -> bool {
  match NaiveDate::parse_from_str(worklog.started_date(), "%Y-%m-%d") {
    Ok(day) => day >= start && day <= end,
    Err(_) => false,
  }
}

/// Worklogs authored by `user` and started on `day`
fn worklogs_to_delete<'a>(
  worklogs: &'a [Worklog],
  user: &'a str,
  day: NaiveDate,
) -> impl Iterator<Item = &'a Worklog> + 'a {
  worklogs
    .iter()
    .filter(move |w| w.author.as_deref() == Some(user))
    .filter(move |w| within(w, day, day))
}

#[async_trait]
impl TimeLogTarget for JiraClient {
  fn name(&self) -> &str {
    "jira"
  }

  async fn create_time_log(&self, entry: &TimeLogEntry) -> Result<WorklogResult> {
    let worklog = self.log_time(entry).await?;

    Ok(WorklogResult {
      service: "jira".to_string(),
      task_id: worklog.issue_key,
      worklog_id: Some(worklog.id),
      seconds: entry.seconds,
      started: entry.started.to_rfc3339(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{FixedOffset, TimeZone};
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, method, path_regex, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn worklog(id: &str, author: &str, started: &str) -> Worklog {
    Worklog {
      id: id.to_string(),
      issue_key: "ABC-1".to_string(),
      author: Some(author.to_string()),
      started: started.to_string(),
      time_spent_seconds: 3600,
      comment: None,
    }
  }

  fn client(server: &MockServer) -> JiraClient {
    let instance = JiraInstance {
      name: "test".to_string(),
      base_url: server.uri(),
      user_email: "dev@example.com".to_string(),
      api_token: None,
    };
    JiraClient::new(&instance, "token".to_string(), Duration::from_secs(5)).unwrap()
  }

  #[test]
  fn test_started_format() {
    let started = FixedOffset::west_opt(4 * 3600)
      .unwrap()
      .with_ymd_and_hms(2024, 10, 24, 16, 15, 0)
      .unwrap();
    assert_eq!(
      started.format(STARTED_FORMAT).to_string(),
      "2024-10-24T16:15:00.000-0400"
    );
  }

  #[test]
  fn test_worklogs_to_delete_filters_author_and_day() {
    let day = NaiveDate::from_ymd_opt(2024, 10, 24).unwrap();
    let worklogs = vec![
      worklog("1", "me", "2024-10-24T09:00:00.000-0400"),
      worklog("2", "someone-else", "2024-10-24T09:00:00.000-0400"),
      worklog("3", "me", "2024-10-25T09:00:00.000-0400"),
    ];

    let ids: Vec<_> = worklogs_to_delete(&worklogs, "me", day)
      .map(|w| w.id.as_str())
      .collect();
    assert_eq!(ids, vec!["1"]);
  }

  #[tokio::test]
  async fn test_log_time_rejects_bad_issue_key_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(201))
      .expect(0)
      .mount(&server)
      .await;

    let err = client(&server).log_time(&entry("not a key")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTaskId { .. }));
  }

  #[tokio::test]
  async fn test_list_entries_rejects_reversed_range_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let err = client(&server)
      .list_entries("2024-10-25", "2024-10-24")
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
  }

  async fn mount_myself(server: &MockServer) {
    Mock::given(method("GET"))
      .and(path_regex(r"/myself$"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountId": "me"})))
      .mount(server)
      .await;
  }

  async fn mount_search(server: &MockServer, keys: &[&str]) {
    let issues: Vec<_> = keys
      .iter()
      .enumerate()
      .map(|(i, key)| {
        json!({
          "self": format!("{}/rest/api/2/issue/{}", server.uri(), 10000 + i),
          "id": (10000 + i).to_string(),
          "key": key,
          "fields": {}
        })
      })
      .collect();

    Mock::given(method("GET"))
      .and(path_regex(r"/search$"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "startAt": 0, "maxResults": 50, "total": keys.len(),
        "issues": issues
      })))
      .mount(server)
      .await;
  }

  fn worklog_json(id: &str, author: &str, started: &str) -> Value {
    json!({"id": id, "author": {"accountId": author}, "started": started, "timeSpentSeconds": 3600})
  }

  /// ABC-1 carries four worklogs over two pages; 100 and 102 are mine on the 24th.
  async fn mount_worklog_pages(server: &MockServer) {
    Mock::given(method("GET"))
      .and(path_regex(r"/issue/ABC-1/worklog$"))
      .and(query_param("startAt", "0"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "startAt": 0, "maxResults": 2, "total": 4,
        "worklogs": [
          worklog_json("100", "me", "2024-10-24T09:00:00.000-0400"),
          worklog_json("101", "other", "2024-10-24T10:00:00.000-0400")
        ]
      })))
      .expect(1)
      .mount(server)
      .await;
    Mock::given(method("GET"))
      .and(path_regex(r"/issue/ABC-1/worklog$"))
      .and(query_param("startAt", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "startAt": 2, "maxResults": 2, "total": 4,
        "worklogs": [
          worklog_json("102", "me", "2024-10-24T15:00:00.000-0400"),
          worklog_json("103", "me", "2024-10-25T09:00:00.000-0400")
        ]
      })))
      .expect(1)
      .mount(server)
      .await;
  }

  fn entry(task_id: &str) -> TimeLogEntry {
    TimeLogEntry {
      task_id: task_id.to_string(),
      started: FixedOffset::west_opt(4 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 10, 24, 16, 15, 0)
        .unwrap(),
      seconds: 5400,
      comment: "notes".to_string(),
    }
  }

  #[tokio::test]
  async fn test_create_time_log_posts_worklog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path_regex(r"/issue/ABC-123/worklog$"))
      .and(body_partial_json(json!({
        "started": "2024-10-24T16:15:00.000-0400",
        "timeSpentSeconds": 5400,
        "comment": "notes"
      })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({
        "id": "555",
        "author": {"accountId": "me"},
        "started": "2024-10-24T16:15:00.000-0400",
        "timeSpentSeconds": 5400
      })))
      .expect(1)
      .mount(&server)
      .await;

    let result = client(&server)
      .create_time_log(&entry("ABC-123"))
      .await
      .unwrap();

    assert_eq!(result.service, "jira");
    assert_eq!(result.task_id, "ABC-123");
    assert_eq!(result.worklog_id.as_deref(), Some("555"));
    assert_eq!(result.seconds, 5400);
    assert_eq!(result.started, "2024-10-24T16:15:00-04:00");
  }

  #[tokio::test]
  async fn test_get_task_missing_issue_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path_regex(r"/issue/ABC-404$"))
      .respond_with(ResponseTemplate::new(404))
      .expect(1)
      .mount(&server)
      .await;

    assert!(client(&server).get_task("ABC-404").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_get_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path_regex(r"/issue/ABC-7$"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "key": "ABC-7",
        "fields": {"summary": "Sprint planning", "status": {"name": "Done"}}
      })))
      .mount(&server)
      .await;

    let issue = client(&server).get_task("ABC-7").await.unwrap().unwrap();
    assert_eq!(issue.summary, "Sprint planning");
    assert_eq!(issue.status, "Done");
  }

  #[tokio::test]
  async fn test_unauthorized_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path_regex(r"/myself$"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;

    let err = client(&server).current_user().await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: Some(401), .. }));
  }

  #[tokio::test]
  async fn test_list_entries_pages_and_filters() {
    let server = MockServer::start().await;
    mount_myself(&server).await;
    mount_search(&server, &["ABC-1"]).await;
    mount_worklog_pages(&server).await;

    let entries = client(&server)
      .list_entries("2024-10-24", "2024-10-24")
      .await
      .unwrap();

    let ids: Vec<_> = entries.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["100", "102"]);
    assert!(entries.iter().all(|w| w.issue_key == "ABC-1"));
  }

  #[tokio::test]
  async fn test_delete_reports_each_outcome() {
    let server = MockServer::start().await;
    mount_myself(&server).await;
    mount_search(&server, &["ABC-1"]).await;
    mount_worklog_pages(&server).await;

    Mock::given(method("DELETE"))
      .and(path_regex(r"/issue/ABC-1/worklog/100$"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path_regex(r"/issue/ABC-1/worklog/102$"))
      .respond_with(ResponseTemplate::new(404))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path_regex(r"/worklog/10[13]$"))
      .respond_with(ResponseTemplate::new(204))
      .expect(0)
      .mount(&server)
      .await;

    let results = client(&server)
      .delete_worklogs_for_user_on_date("2024-10-24", false)
      .await
      .unwrap();

    assert_eq!(
      results,
      vec![
        "Deleted worklog 100 for issue ABC-1".to_string(),
        "Failed to delete worklog 102 for issue ABC-1".to_string(),
      ]
    );
  }

  #[tokio::test]
  async fn test_delete_dry_run_does_not_delete() {
    let server = MockServer::start().await;
    mount_myself(&server).await;
    mount_search(&server, &["ABC-1"]).await;

    Mock::given(method("GET"))
      .and(path_regex(r"/issue/ABC-1/worklog$"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "startAt": 0, "maxResults": 50, "total": 2,
        "worklogs": [
          worklog_json("100", "me", "2024-10-24T09:00:00.000-0400"),
          worklog_json("101", "other", "2024-10-24T10:00:00.000-0400")
        ]
      })))
      .mount(&server)
      .await;

    Mock::given(method("DELETE"))
      .respond_with(ResponseTemplate::new(204))
      .expect(0)
      .mount(&server)
      .await;

    let results = client(&server)
      .delete_worklogs_for_user_on_date("2024-10-24", true)
      .await
      .unwrap();

    assert_eq!(
      results,
      vec!["Dry run mode: Would delete worklog 100 for issue ABC-1".to_string()]
    );
  }
}
