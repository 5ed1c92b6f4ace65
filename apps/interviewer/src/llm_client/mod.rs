/// LLM Client — the single point of entry for all GigaChat calls in the bot.
///
/// ARCHITECTURAL RULE: No other module may call the GigaChat API directly.
/// Interview code depends on the `Reasoner` trait, never on HTTP details.
///
/// Model: GigaChat-2-Max (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GigaChatConfig;

pub mod token;

use token::{AccessToken, TokenCache};

/// The model used for all completion calls.
pub const MODEL: &str = "GigaChat-2-Max";
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
/// Upper bound on a provider-declared token lifetime.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to get access token (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("GigaChat API error: {status} {message}")]
    Service { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GigaChat returned no completion content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Anything that can turn a role-tagged conversation into a single reply.
///
/// The interview controller and summarizer only see this trait, so tests swap
/// in a scripted fake and the provider can change without touching them.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    update_interval: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds. Some deployments send `expires_at` instead.
    expires_in: Option<i64>,
    /// Absolute expiry as Unix milliseconds.
    expires_at: Option<i64>,
}

impl TokenResponse {
    fn lifetime_secs(&self, now_ms: i64) -> i64 {
        let secs = match (self.expires_in, self.expires_at) {
            (Some(secs), _) => secs,
            (None, Some(at_ms)) => at_ms.saturating_sub(now_ms) / 1000,
            (None, None) => DEFAULT_TOKEN_LIFETIME_SECS,
        };
        secs.clamp(0, MAX_TOKEN_LIFETIME_SECS)
    }
}

/// GigaChat client: OAuth token exchange plus the chat-completions endpoint.
/// Cheap to clone; clones share the token cache.
#[derive(Clone)]
pub struct GigaChatClient {
    client: Client,
    config: GigaChatConfig,
    tokens: TokenCache,
    retry_base_delay: Duration,
}

impl GigaChatClient {
    pub fn new(config: GigaChatConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .danger_accept_invalid_certs(config.accept_invalid_certs)
                .build()
                .expect("Failed to build HTTP client"),
            config,
            tokens: TokenCache::new(),
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Exchanges the client credential for a fresh bearer token.
    /// Every failure on this path is reported as `LlmError::Auth`.
    pub async fn acquire_token(&self) -> Result<AccessToken, LlmError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .header(AUTHORIZATION, format!("Basic {}", self.config.auth))
            .header(ACCEPT, "application/json")
            .header("RqUID", Uuid::new_v4().to_string())
            .form(&[("scope", self.config.scope.as_str())])
            .send()
            .await
            .map_err(token_transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            warn!("GigaChat token endpoint returned {}", status);
            return Err(LlmError::Auth {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response.json().await.map_err(token_transport_error)?;
        let now = Utc::now();
        let lifetime = body.lifetime_secs(now.timestamp_millis());
        info!("GigaChat access token acquired (lifetime {}s)", lifetime);

        AccessToken::with_lifetime(body.access_token, now, lifetime)
    }

    /// Returns the cached token, re-authenticating first if it has expired.
    pub async fn ensure_valid_token(&self) -> Result<String, LlmError> {
        self.tokens
            .get_or_refresh(Utc::now(), || self.acquire_token())
            .await
    }

    /// Sends one non-streaming completion request and returns the first choice's text.
    /// Retries transport failures, 429 and 5xx with exponential backoff.
    /// A 401 drops the cached token so the retry re-authenticates.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request_body = CompletionRequest {
            model: MODEL,
            messages,
            stream: false,
            update_interval: 0,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.retry_base_delay * (1 << (attempt - 1));
                warn!(
                    "GigaChat call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let token = self.ensure_valid_token().await?;

            let response = self
                .client
                .post(&self.config.api_url)
                .bearer_auth(&token)
                .header(ACCEPT, "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
                let body = response.text().await.unwrap_or_default();
                warn!("GigaChat rejected the access token: {}", body);
                last_error = Some(LlmError::Service {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("GigaChat API returned {}: {}", status, body);
                last_error = Some(LlmError::Service {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Service {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let completion: CompletionResponse = response.json().await?;
            let content = completion
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or(LlmError::EmptyContent)?;

            debug!("GigaChat call succeeded: {} chars", content.chars().count());
            return Ok(content);
        }

        Err(last_error.unwrap_or(LlmError::Service {
            status: 0,
            message: format!("gave up after {MAX_RETRIES} attempts"),
        }))
    }
}

fn token_transport_error(e: reqwest::Error) -> LlmError {
    warn!("GigaChat token request failed: {}", e);
    LlmError::Auth {
        status: 0,
        message: e.to_string(),
    }
}

#[async_trait]
impl Reasoner for GigaChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        GigaChatClient::complete(self, messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const CREDENTIAL: &str = "Y2xpZW50OnNlY3JldA==";

    /// In-process stand-in for the provider's token and completion endpoints.
    #[derive(Clone, Default)]
    struct FakeProvider {
        token_calls: Arc<AtomicUsize>,
        token_status: Arc<Mutex<u16>>,
        token_lifetime: Arc<Mutex<i64>>,
        token_bodies: Arc<Mutex<Vec<String>>>,
        chat_replies: Arc<Mutex<VecDeque<(u16, Value)>>>,
        chat_requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    impl FakeProvider {
        fn new() -> Self {
            let provider = Self::default();
            *provider.token_status.lock().unwrap() = 200;
            *provider.token_lifetime.lock().unwrap() = 1800;
            provider
        }

        fn queue_chat(&self, status: u16, body: Value) {
            self.chat_replies.lock().unwrap().push_back((status, body));
        }

        fn queue_content(&self, content: &str) {
            self.queue_chat(
                200,
                json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }),
            );
        }
    }

    async fn token_handler(
        State(provider): State<FakeProvider>,
        headers: HeaderMap,
        body: String,
    ) -> (axum::http::StatusCode, Json<Value>) {
        let n = provider.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
        provider.token_bodies.lock().unwrap().push(body);
        let status = *provider.token_status.lock().unwrap();
        let expected = format!("Basic {CREDENTIAL}");
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str());
        let has_rquid = headers.contains_key("rquid");

        if status != 200 || !authorized || !has_rquid {
            return (
                axum::http::StatusCode::from_u16(if status != 200 { status } else { 401 }).unwrap(),
                Json(json!({ "message": "credentials rejected" })),
            );
        }

        let lifetime = *provider.token_lifetime.lock().unwrap();
        (
            axum::http::StatusCode::OK,
            Json(json!({ "access_token": format!("token-{n}"), "expires_in": lifetime })),
        )
    }

    async fn chat_handler(
        State(provider): State<FakeProvider>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (axum::http::StatusCode, Json<Value>) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        provider.chat_requests.lock().unwrap().push((bearer, body));
        let (status, reply) = provider
            .chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((500, json!({ "message": "nothing queued" })));
        (axum::http::StatusCode::from_u16(status).unwrap(), Json(reply))
    }

    async fn spawn_provider(provider: FakeProvider) -> GigaChatClient {
        let app = Router::new()
            .route("/oauth", post(token_handler))
            .route("/chat/completions", post(chat_handler))
            .with_state(provider);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        GigaChatClient::new(GigaChatConfig {
            auth: CREDENTIAL.to_string(),
            scope: "GIGACHAT_API_PERS".to_string(),
            token_url: format!("http://{addr}/oauth"),
            api_url: format!("http://{addr}/chat/completions"),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(5),
        })
        .with_retry_base_delay(Duration::from_millis(1))
    }

    fn interview_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("Ты HR-специалист."),
            ChatMessage::user("Я писал автотесты на pytest три года."),
        ]
    }

    #[test]
    fn test_token_lifetime_prefers_expires_in() {
        let body = TokenResponse {
            access_token: "t".into(),
            expires_in: Some(1800),
            expires_at: Some(99_999_999),
        };
        assert_eq!(body.lifetime_secs(0), 1800);
    }

    #[test]
    fn test_token_lifetime_from_expires_at() {
        let body = TokenResponse {
            access_token: "t".into(),
            expires_in: None,
            expires_at: Some(1_000_000 + 1_800_000),
        };
        assert_eq!(body.lifetime_secs(1_000_000), 1800);
    }

    #[test]
    fn test_token_lifetime_defaults_to_one_hour() {
        let body = TokenResponse {
            access_token: "t".into(),
            expires_in: None,
            expires_at: None,
        };
        assert_eq!(body.lifetime_secs(0), DEFAULT_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_token_lifetime_is_clamped() {
        let huge = TokenResponse {
            access_token: "t".into(),
            expires_in: Some(i64::MAX / 1000),
            expires_at: None,
        };
        assert_eq!(huge.lifetime_secs(0), MAX_TOKEN_LIFETIME_SECS);

        let past = TokenResponse {
            access_token: "t".into(),
            expires_in: None,
            expires_at: Some(i64::MIN),
        };
        assert_eq!(past.lifetime_secs(1_000_000), 0);
    }

    #[test]
    fn test_request_body_shape() {
        let messages = interview_messages();
        let body = CompletionRequest {
            model: MODEL,
            messages: &messages,
            stream: false,
            update_interval: 0,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "GigaChat-2-Max");
        assert_eq!(value["stream"], false);
        assert_eq!(value["update_interval"], 0);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice_content() {
        let provider = FakeProvider::new();
        provider.queue_chat(
            200,
            json!({ "choices": [
                { "message": { "content": "OK" } },
                { "message": { "content": "ignored" } }
            ] }),
        );
        let client = spawn_provider(provider.clone()).await;

        let reply = client.complete(&interview_messages()).await.unwrap();

        assert_eq!(reply, "OK");
        let requests = provider.chat_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.as_deref(), Some("Bearer token-1"));
        assert_eq!(requests[0].1["model"], MODEL);
        assert_eq!(
            provider.token_bodies.lock().unwrap()[0],
            "scope=GIGACHAT_API_PERS"
        );
    }

    #[tokio::test]
    async fn test_token_is_reused_across_calls() {
        let provider = FakeProvider::new();
        provider.queue_content("first");
        provider.queue_content("second");
        let client = spawn_provider(provider.clone()).await;

        client.complete(&interview_messages()).await.unwrap();
        client.complete(&interview_messages()).await.unwrap();

        assert_eq!(provider.token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_once_before_completion() {
        let provider = FakeProvider::new();
        // Lifetime below the safety margin: expired as soon as it is issued.
        *provider.token_lifetime.lock().unwrap() = 30;
        provider.queue_content("first");
        provider.queue_content("second");
        let client = spawn_provider(provider.clone()).await;

        client.complete(&interview_messages()).await.unwrap();
        assert_eq!(provider.token_calls.load(Ordering::SeqCst), 1);

        client.complete(&interview_messages()).await.unwrap();
        assert_eq!(provider.token_calls.load(Ordering::SeqCst), 2);
        let requests = provider.chat_requests.lock().unwrap();
        assert_eq!(requests[1].0.as_deref(), Some("Bearer token-2"));
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces_without_completion_call() {
        let provider = FakeProvider::new();
        *provider.token_status.lock().unwrap() = 403;
        let client = spawn_provider(provider.clone()).await;

        let err = client.complete(&interview_messages()).await.unwrap_err();

        assert!(matches!(err, LlmError::Auth { status: 403, .. }));
        assert_eq!(provider.token_calls.load(Ordering::SeqCst), 1);
        assert!(provider.chat_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_huge_token_lifetime_does_not_panic() {
        let provider = FakeProvider::new();
        *provider.token_lifetime.lock().unwrap() = i64::MAX / 1000;
        provider.queue_content("OK");
        let client = spawn_provider(provider.clone()).await;

        let reply = client.complete(&interview_messages()).await.unwrap();

        assert_eq!(reply, "OK");
        let token = client.tokens.current().await.unwrap();
        let ceiling = Utc::now() + chrono::Duration::seconds(MAX_TOKEN_LIFETIME_SECS);
        assert!(token.expires_at <= ceiling);
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_an_auth_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = GigaChatClient::new(GigaChatConfig {
            auth: CREDENTIAL.to_string(),
            scope: "GIGACHAT_API_PERS".to_string(),
            token_url: format!("http://{addr}/oauth"),
            api_url: format!("http://{addr}/chat/completions"),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(5),
        });

        let err = client.complete(&interview_messages()).await.unwrap_err();

        assert!(matches!(err, LlmError::Auth { status: 0, .. }));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let provider = FakeProvider::new();
        provider.queue_chat(400, json!({ "message": "bad messages" }));
        provider.queue_content("never reached");
        let client = spawn_provider(provider.clone()).await;

        let err = client.complete(&interview_messages()).await.unwrap_err();

        match err {
            LlmError::Service { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("bad messages"));
            }
            other => panic!("expected service error, got {other:?}"),
        }
        assert_eq!(provider.chat_requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let provider = FakeProvider::new();
        provider.queue_chat(503, json!({ "message": "busy" }));
        provider.queue_content("OK, принято");
        let client = spawn_provider(provider.clone()).await;

        let reply = client.complete(&interview_messages()).await.unwrap();

        assert_eq!(reply, "OK, принято");
        assert_eq!(provider.chat_requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_reports_last_service_error() {
        let provider = FakeProvider::new();
        for _ in 0..MAX_RETRIES {
            provider.queue_chat(500, json!({ "message": "down" }));
        }
        let client = spawn_provider(provider.clone()).await;

        let err = client.complete(&interview_messages()).await.unwrap_err();

        assert!(matches!(err, LlmError::Service { status: 500, .. }));
        assert_eq!(
            provider.chat_requests.lock().unwrap().len(),
            MAX_RETRIES as usize
        );
    }

    #[tokio::test]
    async fn test_unauthorized_completion_reauthenticates() {
        let provider = FakeProvider::new();
        provider.queue_chat(401, json!({ "message": "token expired" }));
        provider.queue_content("OK");
        let client = spawn_provider(provider.clone()).await;

        let reply = client.complete(&interview_messages()).await.unwrap();

        assert_eq!(reply, "OK");
        assert_eq!(provider.token_calls.load(Ordering::SeqCst), 2);
        let requests = provider.chat_requests.lock().unwrap();
        assert_eq!(requests[1].0.as_deref(), Some("Bearer token-2"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let provider = FakeProvider::new();
        provider.queue_chat(200, json!({ "choices": [] }));
        let client = spawn_provider(provider.clone()).await;

        let err = client.complete(&interview_messages()).await.unwrap_err();

        assert!(matches!(err, LlmError::EmptyContent));
    }
}
