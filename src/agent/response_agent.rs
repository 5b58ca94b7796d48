//! ResponseAgent: validates prompts and turns generations into result records.

use chrono::Utc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::model::{Generation, ModelClient, ModelConfig, ModelError};
use crate::record::ResultRecord;

/// Text reported for blank prompts.
pub const EMPTY_PROMPT_MESSAGE: &str = "Error: Empty prompt";

/// Agent errors.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Generation timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("Model client error: {0}")]
    Client(#[from] ModelError),
}

/// Configuration for the ResponseAgent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Attempts around the whole client call.
    pub retry_count: u32,
    /// Upper bound on a single client call. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            retry_count: 2,
            max_wait: Some(Duration::from_secs(120)),
        }
    }
}

impl AgentConfig {
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Disable the per-call wait limit.
    pub fn without_max_wait(mut self) -> Self {
        self.max_wait = None;
        self
    }
}

/// Wraps a [`ModelClient`] and always produces a [`ResultRecord`].
///
/// # Example
///
/// ```rust,no_run
/// use ollama_prompt_agent::{AgentConfig, ModelConfig, ResponseAgent};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let agent = ResponseAgent::new(ModelConfig::default(), AgentConfig::default())?;
///     let record = agent.generate_response("Explain the allegory of the cave.").await;
///
///     println!("{} (error: {})", record.text, record.error);
///     Ok(())
/// }
/// ```
pub struct ResponseAgent {
    client: ModelClient,
    config: AgentConfig,
}

impl ResponseAgent {
    /// Create a new ResponseAgent with its own client.
    pub fn new(model_config: ModelConfig, agent_config: AgentConfig) -> Result<Self, AgentError> {
        Ok(Self::with_client(ModelClient::new(model_config)?, agent_config))
    }

    pub fn with_client(client: ModelClient, config: AgentConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn client(&self) -> &ModelClient {
        &self.client
    }

    /// Generate a response and record its timing and error status.
    ///
    /// Blank prompts are rejected without any network call. A client call that
    /// overruns `max_wait` is retried up to `retry_count` attempts; once those run
    /// out, the last error message becomes the record text.
    pub async fn generate_response(&self, prompt: &str) -> ResultRecord {
        let started = Instant::now();
        let timestamp = epoch_seconds();

        if prompt.trim().is_empty() {
            warn!("Rejected empty prompt");
            return ResultRecord::failure(EMPTY_PROMPT_MESSAGE, timestamp, 0.0);
        }

        let attempts = self.config.retry_count.max(1);
        let mut last_error: Option<AgentError> = None;

        for attempt in 1..=attempts {
            match self.attempt(prompt).await {
                Ok(generation) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    info!(
                        attempt,
                        failed = generation.failed,
                        processing_time = elapsed,
                        "Generation finished"
                    );
                    return if generation.failed {
                        ResultRecord::failure(generation.text, timestamp, elapsed)
                    } else {
                        ResultRecord::success(generation.text, timestamp, elapsed)
                    };
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Agent attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        let (message, timed_out) = match last_error {
            Some(e) => (e.to_string(), matches!(e, AgentError::Timeout(_))),
            None => ("Unknown error".to_string(), false),
        };
        ResultRecord::failure(message.clone(), timestamp, elapsed)
            .with_error_details(message, timed_out)
    }

    async fn attempt(&self, prompt: &str) -> Result<Generation, AgentError> {
        match self.config.max_wait {
            Some(limit) => timeout(limit, self.client.generate(prompt))
                .await
                .map_err(|_| AgentError::Timeout(limit)),
            None => Ok(self.client.generate(prompt).await),
        }
    }
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
