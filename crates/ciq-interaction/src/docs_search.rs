//! Documentation-search client for the knowledge-base generator API.
//!
//! Wraps the retrieval service the copilot delegates technical questions
//! to. Transient failures (network, 5xx, timeouts, rate limits) are
//! retried a bounded number of times with exponential backoff before the
//! caller gets a user-facing degraded message; client and auth errors
//! surface immediately.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use ciq_core::capability::DocsSearch;
use ciq_core::error::Result as CiqResult;

use crate::agent::AgentError;

fn default_base_url() -> String {
    "https://docs-search.invalid/generator/v2/chat/".to_string()
}

fn default_model() -> String {
    "meta-llama/Llama-3.3-70B-Instruct".to_string()
}

fn default_indexes() -> Vec<String> {
    vec!["nf_deployment_guide_index".to_string()]
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_tokens() -> u32 {
    500
}

fn default_chat_id() -> String {
    "ciq_copilot".to_string()
}

/// Documentation-search endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsSearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_chat_id")]
    pub chat_id: String,
    #[serde(default = "default_indexes")]
    pub indexes: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for DocsSearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_id: String::new(),
            chat_id: default_chat_id(),
            indexes: default_indexes(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Classification of a failed search attempt, used to pick the retry
/// policy and the degraded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorKind {
    Network,
    Server,
    Client,
    Timeout,
    Auth,
    RateLimit,
    Unknown,
}

impl SearchErrorKind {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit,
            s if s.is_client_error() => Self::Client,
            s if s.is_server_error() => Self::Server,
            _ => Self::Unknown,
        }
    }

    fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Server | Self::Timeout | Self::RateLimit
        )
    }

    /// User-facing message shown when all attempts are exhausted.
    pub fn degraded_message(self) -> &'static str {
        match self {
            Self::Network => {
                "I'm having trouble connecting to the documentation service. \
                 Please check the connection and try again."
            }
            Self::Server => {
                "The documentation service is currently experiencing issues. \
                 Please try again in a few moments."
            }
            Self::Timeout => {
                "The documentation service is taking too long to respond. \
                 Please try a simpler question or try again later."
            }
            Self::Auth => {
                "There's an authentication issue with the documentation \
                 service. Please contact your administrator."
            }
            Self::RateLimit => {
                "Too many documentation lookups in a row. Please wait a \
                 moment before asking another question."
            }
            Self::Client | Self::Unknown => {
                "I couldn't retrieve documentation for that question right now."
            }
        }
    }
}

/// HTTP client for the knowledge-base search endpoint.
pub struct DocsSearchClient {
    client: Client,
    config: DocsSearchConfig,
}

impl DocsSearchClient {
    pub fn new(config: DocsSearchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn build_payload(&self, query: &str) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": query }],
            "max_tokens": self.config.max_tokens,
            "stream": false,
            "search_options": {
                "user_id": self.config.user_id,
                "chat_id": self.config.chat_id,
                "indexes": self.config.indexes,
                "use_dense": true,
                "use_sparse": false,
            },
        })
    }

    /// Backoff delay for the given attempt: base * 2^attempt, five times
    /// longer when the upstream is rate-limiting.
    fn retry_delay(&self, attempt: u32, kind: SearchErrorKind) -> Duration {
        let mut base_ms = self.config.retry_delay_ms;
        if kind == SearchErrorKind::RateLimit {
            base_ms *= 5;
        }
        Duration::from_millis(base_ms.saturating_mul(1 << attempt.min(16)))
    }

    async fn attempt(&self, payload: &Value) -> Result<String, (SearchErrorKind, AgentError)> {
        let response = self
            .client
            .post(&self.config.base_url)
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                let kind = if err.is_timeout() {
                    SearchErrorKind::Timeout
                } else {
                    SearchErrorKind::Network
                };
                (
                    kind,
                    AgentError::ProcessError {
                        status_code: None,
                        message: format!("documentation search request failed: {err}"),
                        is_retryable: kind.is_retryable(),
                        retry_after: None,
                    },
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let kind = SearchErrorKind::from_status(status);
            let body = response.text().await.unwrap_or_default();
            return Err((
                kind,
                AgentError::ProcessError {
                    status_code: Some(status.as_u16()),
                    message: format!(
                        "documentation search returned status {status}: {}",
                        body.chars().take(200).collect::<String>()
                    ),
                    is_retryable: kind.is_retryable(),
                    retry_after: None,
                },
            ));
        }

        let body: Value = response.json().await.map_err(|err| {
            (
                SearchErrorKind::Server,
                AgentError::Other(format!("invalid JSON from documentation search: {err}")),
            )
        })?;

        parse_answer(&body).ok_or_else(|| {
            (
                SearchErrorKind::Unknown,
                AgentError::Other("documentation search response had no answer content".into()),
            )
        })
    }

    /// Runs the query with bounded retries, returning the answer text or
    /// the classified error of the last attempt.
    pub async fn query(&self, query: &str) -> Result<String, (SearchErrorKind, AgentError)> {
        let payload = self.build_payload(query);
        let mut last_failure = None;

        for attempt in 0..=self.config.max_retries {
            info!(
                attempt = attempt + 1,
                max = self.config.max_retries + 1,
                "documentation search attempt"
            );
            match self.attempt(&payload).await {
                Ok(answer) => return Ok(answer),
                Err((kind, err)) => {
                    warn!(?kind, error = %err, "documentation search attempt failed");
                    let retry = kind.is_retryable() && attempt < self.config.max_retries;
                    last_failure = Some((kind, err));
                    if !retry {
                        break;
                    }
                    tokio::time::sleep(self.retry_delay(attempt, kind)).await;
                }
            }
        }

        Err(last_failure.unwrap_or((
            SearchErrorKind::Unknown,
            AgentError::Other("documentation search produced no attempts".into()),
        )))
    }
}

#[async_trait]
impl DocsSearch for DocsSearchClient {
    /// Returns the answer text, or the per-class degraded message when
    /// the upstream stayed unavailable. Never errors across this seam.
    async fn search(&self, query: &str) -> CiqResult<String> {
        match self.query(query).await {
            Ok(answer) => Ok(answer),
            Err((kind, _)) => Ok(kind.degraded_message().to_string()),
        }
    }
}

/// Extracts the answer from the OpenAI-compatible response, which may
/// arrive as a bare object or wrapped in a single-element list.
fn parse_answer(body: &Value) -> Option<String> {
    let object = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };

    if let Some(content) = object
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
    {
        return Some(content.to_string());
    }

    // Tolerate flatter shapes some deployments return
    for key in ["content", "text"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    None
}
