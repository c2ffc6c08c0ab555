//! Tool parser for extracting tool calls from Anthropic API responses
//!
//! Parses `text` and `tool_use` content blocks and validates tool call
//! inputs against the advertised definitions.

use serde_json::Value;

use crate::error::{Ready4UniError, Result};
use crate::llm::client::LlmError;
use crate::llm::types::{CompletionResponse, StopReason, ToolCall, ToolDefinition, Usage};

/// Parse a raw Anthropic API response into a CompletionResponse
pub fn parse_response(response: &Value) -> std::result::Result<CompletionResponse, LlmError> {
    let content_blocks = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| LlmError::InvalidResponse("response has no content array".to_string()))?;

    let mut content = String::new();
    let mut tool_calls = Vec::new();

    for block in content_blocks {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(text);
                }
            }
            Some("tool_use") => {
                if let Some(call) = parse_tool_use_block(block) {
                    tool_calls.push(call);
                }
            }
            _ => {}
        }
    }

    let stop_reason = response
        .get("stop_reason")
        .and_then(|s| s.as_str())
        .map(parse_stop_reason)
        .unwrap_or(StopReason::EndTurn);

    let usage = response.get("usage").map(parse_usage).unwrap_or_default();

    Ok(CompletionResponse {
        content,
        tool_calls,
        stop_reason,
        usage,
    })
}

fn parse_tool_use_block(block: &Value) -> Option<ToolCall> {
    let id = block.get("id").and_then(|v| v.as_str())?.to_string();
    let name = block.get("name").and_then(|v| v.as_str())?.to_string();
    let input = block.get("input").cloned().unwrap_or(Value::Object(Default::default()));

    Some(ToolCall { id, name, input })
}

fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "end_turn" => StopReason::EndTurn,
        "tool_use" => StopReason::ToolUse,
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

fn parse_usage(usage: &Value) -> Usage {
    Usage {
        input_tokens: usage.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
        output_tokens: usage.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
    }
}

/// Validate a tool call's input against a tool definition's schema
///
/// Checks that the input is an object and that all required fields are present and non-null.
pub fn validate_tool_input(call: &ToolCall, definition: &ToolDefinition) -> Result<()> {
    if !call.input.is_object() {
        return Err(Ready4UniError::InvalidInput(format!(
            "Tool '{}' expects an object input",
            call.name
        )));
    }

    if let Some(required) = definition.input_schema.get("required").and_then(|r| r.as_array()) {
        for req in required {
            if let Some(field_name) = req.as_str()
                && call.input.get(field_name).is_none_or(Value::is_null)
            {
                return Err(Ready4UniError::InvalidInput(format!(
                    "Tool '{}' missing required field: {}",
                    call.name, field_name
                )));
            }
        }
    }

    Ok(())
}

/// Find a tool definition by name in a list
pub fn find_tool_definition<'a>(name: &str, tools: &'a [ToolDefinition]) -> Option<&'a ToolDefinition> {
    tools.iter().find(|t| t.name == name)
}

/// Validate all tool calls in a response against available tool definitions
pub fn validate_tool_calls(response: &CompletionResponse, tools: &[ToolDefinition]) -> Result<()> {
    for call in &response.tool_calls {
        let definition = find_tool_definition(&call.name, tools)
            .ok_or_else(|| Ready4UniError::InvalidInput(format!("Unknown tool: {}", call.name)))?;
        validate_tool_input(call, definition)?;
    }
    Ok(())
}

/// Whether the response asks for tools to be run
pub fn needs_tool_execution(response: &CompletionResponse) -> bool {
    !response.tool_calls.is_empty()
}
