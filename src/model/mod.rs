//! Model client module for text generation.

mod client;

pub use client::{
    Backoff, Generation, ModelClient, ModelConfig, ModelError, DEFAULT_MAX_PROMPT_CHARS,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_SECS,
};
