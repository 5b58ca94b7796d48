//! Agent module wrapping the model client with validation and result recording.

mod response_agent;

pub use response_agent::{AgentConfig, AgentError, ResponseAgent, EMPTY_PROMPT_MESSAGE};
