//! Configuration system for Ready4Uni.
//!
//! A single YAML file with one section per concern (llm, agent, data,
//! uploads, session, grading). Every key has a default.

pub use self::global::{
    AgentConfig, Config, DataConfig, LlmConfig, MAX_SESSION_TIMEOUT_MINUTES, SessionConfig, UploadConfig,
};

mod global;
