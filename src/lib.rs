// Copyright 2025 ModerRAS
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Ollama Prompt Agent
//!
//! Sends a single prompt to a locally hosted inference server and returns
//! the generated text as a structured, serializable record.
//!
//! The [`ModelClient`] talks to the `/api/generate` endpoint with a bounded,
//! fixed-delay retry loop and never fails outright. The [`ResponseAgent`]
//! validates the prompt, bounds each client call and wraps the outcome in a
//! [`ResultRecord`] carrying timing and error flags.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ollama_prompt_agent::{AgentConfig, ModelConfig, ResponseAgent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let model_config = ModelConfig::default()
//!         .with_base_url("http://localhost:11434")
//!         .with_model_name("llama2");
//!
//!     let agent = ResponseAgent::new(model_config, AgentConfig::default())?;
//!     let record = agent.generate_response("What is the good life?").await;
//!
//!     record.save("response.json")?;
//!     println!("{}", record.text);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod model;
pub mod record;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::{AgentConfig, AgentError, ResponseAgent};
pub use model::{Backoff, Generation, ModelClient, ModelConfig, ModelError};
pub use record::{RecordError, ResultRecord};
pub use settings::AppSettings;
