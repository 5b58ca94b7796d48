//! Structured outcome of a single generation request.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Record persistence errors.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to access record file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of one `generate_response` call.
///
/// Built once per call and never mutated afterwards. When `error` is set,
/// `text` holds a human-readable failure description instead of model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Model output, or the failure description.
    pub text: String,
    /// Seconds since the epoch at the start of generation.
    pub timestamp: f64,
    /// Whether generation ultimately failed.
    pub error: bool,
    /// Wall-clock duration of the call in seconds.
    pub processing_time: f64,
    /// Last agent-level error message, if any.
    #[serde(default)]
    pub error_details: Option<String>,
    /// Set when the last agent-level failure was a `max_wait` timeout.
    #[serde(default)]
    pub timeout_flag: bool,
    #[serde(default)]
    pub conceptual_depth: f64,
    #[serde(default)]
    pub schools: Vec<String>,
    #[serde(default)]
    pub refinement_suggestions: Vec<String>,
}

impl ResultRecord {
    fn new(text: String, timestamp: f64, error: bool, processing_time: f64) -> Self {
        Self {
            text,
            timestamp,
            error,
            processing_time: processing_time.max(0.0),
            error_details: None,
            timeout_flag: false,
            conceptual_depth: 0.0,
            schools: Vec::new(),
            refinement_suggestions: Vec::new(),
        }
    }

    /// Record carrying model output.
    pub fn success(text: impl Into<String>, timestamp: f64, processing_time: f64) -> Self {
        Self::new(text.into(), timestamp, false, processing_time)
    }

    /// Record carrying a failure description.
    pub fn failure(text: impl Into<String>, timestamp: f64, processing_time: f64) -> Self {
        Self::new(text.into(), timestamp, true, processing_time)
    }

    /// Attach agent-level error details.
    pub fn with_error_details(mut self, details: impl Into<String>, timed_out: bool) -> Self {
        self.error_details = Some(details.into());
        self.timeout_flag = timed_out;
        self
    }

    /// Write the record as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read a record previously written by [`ResultRecord::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
