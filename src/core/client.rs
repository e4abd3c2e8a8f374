use crate::config::settings::ApiSettings;
use crate::core::retry::{with_retry_when, RetryConfig};
use crate::domain::model::{
    ContentFilter, Draft, ListResponse, NewDraft, Notification, NotificationKind,
};
use crate::domain::ports::TypefullyApi;
use crate::utils::error::{Result, TypefullyError};
use crate::utils::validation::{validate_required_field, validate_url};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-KEY";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Typefully REST client.
pub struct TypefullyClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl TypefullyClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let api_key = validate_required_field("api.key", &settings.api_key)?.clone();
        validate_url("api.base_url", &settings.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(concat!("typefully-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: settings.retry.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// One HTTP exchange, without retries. Empty bodies come back as JSON null.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url.as_str())
            .header(API_KEY_HEADER, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Typefully response status: {}", status);

        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(serde_json::Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let retry_after = parse_retry_after_seconds(response.headers());
        let text = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after, &text))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        self.request_with(method, path, query, body, TypefullyError::is_retryable)
            .await
    }

    async fn request_with<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
        should_retry: fn(&TypefullyError) -> bool,
    ) -> Result<T> {
        let operation_name = format!("{} {}", method, path);
        let value = with_retry_when(
            || self.execute(method.clone(), path, query, body.as_ref()),
            &self.retry,
            &operation_name,
            should_retry,
        )
        .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn list_drafts(&self, path: &str, filter: Option<ContentFilter>) -> Result<Vec<Draft>> {
        let query: Vec<(&str, &str)> = filter
            .map(|f| vec![("content_filter", f.as_str())])
            .unwrap_or_default();
        let response: ListResponse<Draft> = self.request(Method::GET, path, &query, None).await?;
        let drafts = response.into_items();
        tracing::info!("Fetched {} drafts from {}", drafts.len(), path);
        Ok(drafts)
    }
}

#[async_trait]
impl TypefullyApi for TypefullyClient {
    async fn create_draft(&self, draft: &NewDraft) -> Result<Draft> {
        let body = serde_json::to_value(draft)?;
        // A 5xx or timeout may come after the draft was stored; resending would queue a copy.
        let created: Draft = self
            .request_with(
                Method::POST,
                "/drafts/",
                &[],
                Some(body),
                TypefullyError::is_retryable_without_duplicates,
            )
            .await?;
        tracing::info!("Created draft {}", created.id);
        Ok(created)
    }

    async fn recently_scheduled(&self, filter: Option<ContentFilter>) -> Result<Vec<Draft>> {
        self.list_drafts("/drafts/recently-scheduled/", filter).await
    }

    async fn recently_published(&self, filter: Option<ContentFilter>) -> Result<Vec<Draft>> {
        self.list_drafts("/drafts/recently-published/", filter).await
    }

    async fn notifications(&self, kind: Option<NotificationKind>) -> Result<Vec<Notification>> {
        let query: Vec<(&str, &str)> = kind
            .map(|k| vec![("kind", k.as_str())])
            .unwrap_or_default();
        let response: ListResponse<Notification> = self
            .request(Method::GET, "/notifications/", &query, None)
            .await?;
        Ok(response.into_items())
    }

    async fn mark_notifications_read(
        &self,
        kind: Option<NotificationKind>,
        username: Option<&str>,
    ) -> Result<()> {
        let mut body = serde_json::Map::new();
        if let Some(kind) = kind {
            body.insert("kind".to_string(), kind.as_str().into());
        }
        if let Some(username) = username {
            body.insert("username".to_string(), username.into());
        }

        let _: serde_json::Value = self
            .request(
                Method::POST,
                "/notifications/mark-all-read/",
                &[],
                Some(serde_json::Value::Object(body)),
            )
            .await?;
        Ok(())
    }
}

fn parse_retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> TypefullyError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TypefullyError::AuthenticationError { message }
        }
        StatusCode::TOO_MANY_REQUESTS => TypefullyError::RateLimitedError { retry_after },
        _ => TypefullyError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Prefers the `detail`, `error` or `message` field of a JSON error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
        ["detail", "error", "message"]
            .iter()
            .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
    });

    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    crate::domain::model::truncate_chars(&message, MAX_ERROR_BODY_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(base_url: String) -> ApiSettings {
        ApiSettings {
            api_key: Some("test-key".to_string()),
            base_url,
            timeout_seconds: 5,
            retry: RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
                max_delay_ms: 2,
                jitter: 0.0,
            },
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let mut s = settings("https://api.typefully.com/v1".to_string());
        s.api_key = None;
        assert!(matches!(
            TypefullyClient::new(&s),
            Err(TypefullyError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_url_joining() {
        let client = TypefullyClient::new(&settings("https://api.typefully.com/v1/".to_string())).unwrap();
        assert_eq!(
            client.url("/drafts/"),
            "https://api.typefully.com/v1/drafts/"
        );
        assert_eq!(
            client.url("notifications/"),
            "https://api.typefully.com/v1/notifications/"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"detail": "Invalid schedule-date"}"#),
            "Invalid schedule-date"
        );
        assert_eq!(error_message(StatusCode::BAD_REQUEST, "plain text"), "plain text");
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, &"x".repeat(500)).chars().count(),
            MAX_ERROR_BODY_CHARS
        );
    }

    #[tokio::test]
    async fn test_create_draft_sends_key_and_body() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/drafts/")
                .header("X-API-KEY", "Bearer test-key")
                .json_body(serde_json::json!({
                    "content": "Hello\n\n\n\nWorld",
                    "threadify": false,
                    "schedule-date": "next-free-slot"
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "id": 101,
                    "text": "Hello\n\n\n\nWorld",
                    "num_tweets": 2,
                    "scheduled_date": "2026-10-19T10:00:00Z"
                }));
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let draft = client
            .create_draft(&NewDraft {
                content: "Hello\n\n\n\nWorld".to_string(),
                threadify: Some(false),
                schedule_date: Some(crate::domain::model::ScheduleDate::NextFreeSlot),
                ..Default::default()
            })
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(draft.id, "101");
        assert_eq!(draft.num_tweets, Some(2));
    }

    #[tokio::test]
    async fn test_create_draft_is_not_resent_after_server_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/drafts/");
            then.status(502).body("bad gateway");
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let err = client
            .create_draft(&NewDraft {
                content: "Only once".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        api_mock.assert_hits(1);
        assert!(matches!(err, TypefullyError::ApiError { status: 502, .. }));
        assert_eq!(err.severity().exit_code(), 2);
    }

    #[tokio::test]
    async fn test_create_draft_retries_when_rate_limited() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/drafts/");
            then.status(429).header("Retry-After", "0");
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let err = client
            .create_draft(&NewDraft {
                content: "Later".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        api_mock.assert_hits(3);
        assert!(matches!(err, TypefullyError::RateLimitedError { .. }));
    }

    #[tokio::test]
    async fn test_list_with_content_filter() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/drafts/recently-published/")
                .query_param("content_filter", "threads");
            then.status(200)
                .json_body(serde_json::json!([{"id": 1, "status": "published"}]));
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let drafts = client
            .recently_published(Some(ContentFilter::Threads))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].status.as_deref(), Some("published"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/drafts/recently-scheduled/");
            then.status(401)
                .json_body(serde_json::json!({"detail": "Invalid API key"}));
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let err = client.recently_scheduled(None).await.unwrap_err();

        api_mock.assert_hits(1);
        match err {
            TypefullyError::AuthenticationError { message } => {
                assert_eq!(message, "Invalid API key")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/notifications/");
            then.status(503).body("maintenance");
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let err = client.notifications(None).await.unwrap_err();

        api_mock.assert_hits(3);
        assert!(matches!(err, TypefullyError::ApiError { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/notifications/");
            then.status(429).header("Retry-After", "0");
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        let err = client.notifications(None).await.unwrap_err();

        api_mock.assert_hits(3);
        assert!(matches!(
            err,
            TypefullyError::RateLimitedError {
                retry_after: Some(0)
            }
        ));
    }

    #[tokio::test]
    async fn test_mark_read_accepts_empty_body() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/notifications/mark-all-read/")
                .json_body(serde_json::json!({"kind": "inbox", "username": "pete"}));
            then.status(204);
        });

        let client = TypefullyClient::new(&settings(server.base_url())).unwrap();
        client
            .mark_notifications_read(Some(NotificationKind::Inbox), Some("pete"))
            .await
            .unwrap();

        api_mock.assert();
    }
}
