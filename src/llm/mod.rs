//! LLM Client Layer - Anthropic API integration, retry and tool parsing
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction, plus a scripted mock
//! - AnthropicClient implementation
//! - Linear-backoff retry around one API call
//! - LlmGateway for text, structured JSON and function-calling requests
//! - Tool call parsing and validation

pub mod anthropic;
pub mod client;
pub mod generate;
pub mod retry;
pub mod tool_parser;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, LlmError, MockLlmClient};
pub use generate::{LlmGateway, STRUCTURED_TOOL_NAME, extract_json_object};
pub use retry::{RetryPolicy, with_retry};
pub use tool_parser::{
    find_tool_definition, needs_tool_execution, parse_response, validate_tool_calls, validate_tool_input,
};
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, ToolCall, ToolChoice, ToolDefinition, Usage,
};
