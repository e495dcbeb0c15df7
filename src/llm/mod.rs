// LLM abstraction layer

pub mod provider;
pub mod zai;

pub use provider::*;
pub use crate::types::{LLMMessage, LLMRequest, LLMResponse, TokenUsage};
