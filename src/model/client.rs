//! Model client for text generation against an Ollama-compatible API.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Default number of attempts per generation request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;

/// Default per-attempt request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 180;

/// Prompts are cut to this many characters before sending.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 3000;

/// Model client errors.
///
/// These never leave [`ModelClient::generate`]; they are logged per attempt.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
}

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay before every retry.
    #[default]
    Fixed,
    /// Delay doubles after each failed attempt.
    Exponential,
}

/// Configuration for the generation endpoint.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub model_name: String,
    pub temperature: f64,
    /// Total attempts per request, including the first one.
    pub max_retries: u32,
    /// Delay before each retry.
    pub retry_delay: Duration,
    /// Timeout applied to every single attempt.
    pub request_timeout: Duration,
    pub max_prompt_chars: usize,
    pub backoff: Backoff,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: "llama2".to_string(),
            temperature: 0.7,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            backoff: Backoff::Fixed,
        }
    }
}

impl ModelConfig {
    /// Create a new ModelConfig with custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a new ModelConfig with custom model name.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the total number of attempts per request.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-attempt request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.retry_delay,
            Backoff::Exponential => {
                let factor = 1u32 << attempt.saturating_sub(1).min(16);
                self.retry_delay.saturating_mul(factor)
            }
        }
    }
}

/// Outcome of [`ModelClient::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Model output, or the exhausted-retries message.
    pub text: String,
    pub failed: bool,
}

impl Generation {
    fn completed(text: String) -> Self {
        Self {
            text,
            failed: false,
        }
    }

    fn exhausted(attempts: u32) -> Self {
        Self {
            text: format!("Error: Failed after {} attempts", attempts),
            failed: true,
        }
    }
}

/// Ollama `/api/generate` response body.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a locally hosted generation server.
pub struct ModelClient {
    config: ModelConfig,
    client: Client,
}

impl ModelClient {
    /// Create a new ModelClient with the given configuration.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ModelError::ClientBuild)?;
        Ok(Self { config, client })
    }

    /// Create a new ModelClient with default configuration.
    pub fn with_defaults() -> Result<Self, ModelError> {
        Self::new(ModelConfig::default())
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Generate text for a prompt.
    ///
    /// The prompt is silently cut to `max_prompt_chars` characters. Every failure
    /// (transport error, timeout, non-2xx status) is retried the same way, up to
    /// `max_retries` attempts in total. This never returns an error: exhaustion
    /// is reported through [`Generation::failed`].
    pub async fn generate(&self, prompt: &str) -> Generation {
        let prompt = truncate_chars(prompt, self.config.max_prompt_chars);
        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));

        let body = json!({
            "model": self.config.model_name,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
            },
        });

        let max_attempts = self.config.max_retries.max(1);

        for attempt in 1..=max_attempts {
            debug!(
                %url,
                attempt,
                prompt_chars = prompt.chars().count(),
                "Sending generation request"
            );
            match self.send_request(&url, &body).await {
                Ok(text) => {
                    info!(attempt, "Generation request succeeded");
                    return Generation::completed(text);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Generation request failed");
                    if attempt < max_attempts {
                        sleep(self.config.delay_after(attempt)).await;
                    }
                }
            }
        }

        Generation::exhausted(max_attempts)
    }

    /// Send a single request to the API.
    async fn send_request(&self, url: &str, body: &Value) -> Result<String, ModelError> {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            return Err(ModelError::ApiError {
                status: status.as_u16(),
                body: raw,
            });
        }

        Ok(Self::parse_response(&raw))
    }

    /// Read the `response` field, falling back to the raw body when it cannot be decoded.
    fn parse_response(raw: &str) -> String {
        match serde_json::from_str::<GenerateResponse>(raw) {
            Ok(parsed) => parsed.response,
            Err(e) => {
                debug!(error = %e, "Response body is not a generate payload, using raw text");
                raw.to_string()
            }
        }
    }
}

/// First `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
