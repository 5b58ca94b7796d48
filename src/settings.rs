//! Settings for the prompt agent CLI.
//! Persisted in the platform-specific config directory via `directories::ProjectDirs`,
//! with environment variables taking precedence.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::agent::AgentConfig;
use crate::model::{
    Backoff, ModelConfig, DEFAULT_MAX_PROMPT_CHARS, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_SECS,
};

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Inference server base URL
    pub base_url: String,
    /// Model name
    pub model_name: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Total attempts per model request
    pub max_retries: u32,
    /// Retry delay in seconds
    pub retry_delay: u64,
    /// Per-attempt request timeout in seconds
    pub request_timeout: u64,
    /// Prompt truncation length in characters
    pub max_prompt_chars: usize,
    /// Double the retry delay after each failure
    pub exponential_backoff: bool,
    /// Agent-level attempts
    pub retry_count: u32,
    /// Agent-level wait limit in seconds (0 disables)
    pub max_wait: u64,
    /// Where the result record is written
    pub output_path: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: "llama2".to_string(),
            temperature: 0.7,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            exponential_backoff: false,
            retry_count: 2,
            max_wait: 120,
            output_path: "response.json".to_string(),
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "moderras", "prompt-agent")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        let defaults = Self::default();

        let mut loaded: Self = Self::settings_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        // Empty strings in older files mean "unset"
        if loaded.base_url.is_empty() {
            loaded.base_url = defaults.base_url;
        }
        if loaded.model_name.is_empty() {
            loaded.model_name = defaults.model_name;
        }
        if loaded.output_path.is_empty() {
            loaded.output_path = defaults.output_path;
        }

        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<PathBuf, String> {
        let dir = Self::config_dir().ok_or("Cannot determine config directory")?;

        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let path = dir.join("settings.json");
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(path)
    }

    /// Override fields from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| env::var(key).ok());
    }

    /// Override fields from a variable lookup. Unparsable values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("OLLAMA_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_MODEL") {
            self.model_name = v;
        }
        if let Some(v) = lookup("RESULT_PATH") {
            self.output_path = v;
        }
        if let Some(v) = lookup("OLLAMA_BACKOFF") {
            self.exponential_backoff = v.eq_ignore_ascii_case("exponential");
        }
        override_parsed(&lookup, "OLLAMA_TEMPERATURE", &mut self.temperature);
        override_parsed(&lookup, "OLLAMA_MAX_RETRIES", &mut self.max_retries);
        override_parsed(&lookup, "OLLAMA_RETRY_DELAY", &mut self.retry_delay);
        override_parsed(&lookup, "OLLAMA_TIMEOUT", &mut self.request_timeout);
        override_parsed(&lookup, "AGENT_RETRY_COUNT", &mut self.retry_count);
        override_parsed(&lookup, "AGENT_MAX_WAIT", &mut self.max_wait);
    }

    /// Build the model client configuration.
    pub fn model_config(&self) -> ModelConfig {
        let backoff = if self.exponential_backoff {
            Backoff::Exponential
        } else {
            Backoff::Fixed
        };

        ModelConfig::default()
            .with_base_url(&self.base_url)
            .with_model_name(&self.model_name)
            .with_temperature(self.temperature)
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_secs(self.retry_delay))
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_max_prompt_chars(self.max_prompt_chars)
            .with_backoff(backoff)
    }

    /// Build the agent configuration.
    pub fn agent_config(&self) -> AgentConfig {
        let config = AgentConfig::default().with_retry_count(self.retry_count);
        match self.max_wait {
            0 => config.without_max_wait(),
            secs => config.with_max_wait(Duration::from_secs(secs)),
        }
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(value) = lookup(key).and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_client_and_agent() {
        let settings = AppSettings::default();

        let model = settings.model_config();
        assert_eq!(model.base_url, "http://localhost:11434");
        assert_eq!(model.model_name, "llama2");
        assert_eq!(model.max_retries, 3);
        assert_eq!(model.retry_delay, Duration::from_secs(1));
        assert_eq!(model.request_timeout, Duration::from_secs(180));
        assert_eq!(model.max_prompt_chars, 3000);
        assert_eq!(model.backoff, Backoff::Fixed);

        let agent = settings.agent_config();
        assert_eq!(agent.retry_count, 2);
        assert_eq!(agent.max_wait, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut settings = AppSettings::default();
        settings.apply_env_from(lookup_from(&[
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "mistral"),
            ("OLLAMA_MAX_RETRIES", "5"),
            ("OLLAMA_BACKOFF", "Exponential"),
            ("AGENT_MAX_WAIT", "0"),
        ]));

        assert_eq!(settings.base_url, "http://gpu-box:11434");
        assert_eq!(settings.model_name, "mistral");
        assert_eq!(settings.max_retries, 5);
        assert!(settings.exponential_backoff);
        assert_eq!(settings.model_config().backoff, Backoff::Exponential);
        assert_eq!(settings.agent_config().max_wait, None);
    }

    #[test]
    fn test_apply_env_ignores_unparsable_values() {
        let mut settings = AppSettings::default();
        settings.apply_env_from(lookup_from(&[
            ("OLLAMA_TIMEOUT", "soon"),
            ("OLLAMA_TEMPERATURE", "hot"),
        ]));

        assert_eq!(settings.request_timeout, 180);
        assert_eq!(settings.temperature, 0.7);
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"model_name":"phi3"}"#).unwrap();
        assert_eq!(settings.model_name, "phi3");
        assert_eq!(settings.base_url, "http://localhost:11434");
        assert_eq!(settings.retry_count, 2);
    }
}
