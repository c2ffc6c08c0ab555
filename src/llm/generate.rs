//! Higher-level calls built on `LlmClient`: plain text, structured JSON and
//! function calling, each wrapped in the retry policy.

use std::sync::Arc;

use serde_json::Value;

use super::client::{LlmClient, LlmError};
use super::retry::{RetryPolicy, with_retry};
use super::types::{CompletionRequest, CompletionResponse, StopReason, ToolChoice, ToolDefinition};

/// Name of the tool used to force structured output
pub const STRUCTURED_TOOL_NAME: &str = "record_output";

const STRUCTURED_SYSTEM: &str = "You extract and classify information. \
Always answer by calling the record_output tool with JSON that matches its input schema.";

/// Shared handle to the LLM used by the router, orchestrator and tools
#[derive(Clone)]
pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    max_tokens: Option<u32>,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            max_tokens: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    async fn send(&self, label: &str, mut request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.max_tokens.is_none() {
            request.max_tokens = self.max_tokens;
        }
        let client = &self.client;
        let request = &request;
        let response = with_retry(&self.retry, label, move || client.complete(request.clone())).await?;

        log::debug!(
            "{}: {} tokens (${:.4})",
            label,
            response.usage.total(),
            response.usage.cost_usd(self.model())
        );
        if response.stop_reason == StopReason::MaxTokens {
            log::warn!("{}: response cut off at the token limit", label);
        }
        Ok(response)
    }

    /// Free-form text completion
    pub async fn text(&self, system: &str, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let request = CompletionRequest::new(system)
            .with_user_message(prompt)
            .with_temperature(temperature);

        let response = self.send("text completion", request).await?;
        let content = response.content.trim();
        if content.is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".to_string()));
        }
        Ok(content.to_string())
    }

    /// Completion constrained to a JSON object matching `schema`
    pub async fn structured(&self, prompt: &str, schema: &Value, temperature: f32) -> Result<Value, LlmError> {
        let tool = ToolDefinition::new(
            STRUCTURED_TOOL_NAME,
            "Record the answer as JSON matching this schema.",
            schema.clone(),
        );
        let request = CompletionRequest::new(STRUCTURED_SYSTEM)
            .with_user_message(prompt)
            .with_tools(vec![tool])
            .with_tool_choice(ToolChoice::Tool(STRUCTURED_TOOL_NAME.to_string()))
            .with_temperature(temperature);

        let response = self.send("structured output", request).await?;

        if let Some(call) = response
            .tool_calls
            .iter()
            .find(|c| c.name == STRUCTURED_TOOL_NAME && c.input.is_object())
        {
            return Ok(call.input.clone());
        }

        extract_json_object(&response.content)
            .ok_or_else(|| LlmError::InvalidResponse("no structured output in response".to_string()))
    }

    /// Completion that may request any of `tools`
    pub async fn with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: Vec<ToolDefinition>,
        temperature: f32,
    ) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest::new(system)
            .with_user_message(prompt)
            .with_tools(tools)
            .with_tool_choice(ToolChoice::Auto)
            .with_temperature(temperature);

        self.send("tool selection", request).await
    }
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("model", &self.client.model())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Pull a JSON object out of model text, tolerating ```json fences and prose around it
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(unfenced) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLlmClient;
    use crate::llm::types::ToolCall;
    use serde_json::json;

    fn gateway(mock: &Arc<MockLlmClient>) -> LlmGateway {
        LlmGateway::new(mock.clone()).with_retry_policy(RetryPolicy::none())
    }

    #[test]
    fn test_extract_json_plain() {
        let value = extract_json_object(r#"{"intent": "greeting_or_chitchat"}"#).unwrap();
        assert_eq!(value["intent"], "greeting_or_chitchat");
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "```json\n{\"confidence\": 0.8}\n```";
        assert_eq!(extract_json_object(text).unwrap()["confidence"], 0.8);
    }

    #[test]
    fn test_extract_json_with_prose() {
        let text = "Here is the result: {\"a\": {\"b\": 1}} hope it helps";
        assert_eq!(extract_json_object(text).unwrap()["a"]["b"], 1);
    }

    #[test]
    fn test_extract_json_rejects_non_objects() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("} {").is_none());
    }

    #[tokio::test]
    async fn test_structured_uses_forced_tool() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_structured(json!({"intent": "major_discovery", "confidence": 0.9}));

        let schema = json!({"type": "object", "properties": {"intent": {"type": "string"}}});
        let value = gateway(&mock).structured("classify", &schema, 0.2).await.unwrap();
        assert_eq!(value["intent"], "major_discovery");

        let request = &mock.requests()[0];
        assert_eq!(request.tools[0].name, STRUCTURED_TOOL_NAME);
        assert_eq!(request.tools[0].input_schema, schema);
        assert_eq!(
            request.tool_choice,
            Some(ToolChoice::Tool(STRUCTURED_TOOL_NAME.to_string()))
        );
        assert_eq!(request.temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_structured_falls_back_to_text_json() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_text("```json\n{\"grades\": []}\n```");

        let value = gateway(&mock)
            .structured("extract", &json!({"type": "object"}), 0.1)
            .await
            .unwrap();
        assert!(value["grades"].is_array());
    }

    #[tokio::test]
    async fn test_structured_without_json_is_error() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_text("I cannot help with that.");

        let result = gateway(&mock).structured("extract", &json!({"type": "object"}), 0.1).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_text_rejects_empty_completion() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_text("   ");

        let result = gateway(&mock).text("sys", "hi", 0.8).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_text_retries_server_errors() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_error(LlmError::ApiError {
            status: 500,
            message: "boom".to_string(),
        });
        mock.push_text("Hello!");

        let gateway = LlmGateway::new(mock.clone())
            .with_retry_policy(RetryPolicy::new(2, std::time::Duration::ZERO))
            .with_max_tokens(512);
        let text = gateway.text("sys", "hi", 0.8).await.unwrap();

        assert_eq!(text, "Hello!");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[1].max_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_with_tools_passes_definitions() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_response(CompletionResponse::tool_use(vec![ToolCall::new(
            "t1",
            "get_major_info",
            json!({"major_name": "Law"}),
        )]));

        let tools = vec![ToolDefinition::new("get_major_info", "info", json!({"type": "object"}))];
        let response = gateway(&mock).with_tools("sys", "next?", tools, 0.3).await.unwrap();

        assert_eq!(response.tool_calls[0].name, "get_major_info");
        assert_eq!(mock.requests()[0].tool_choice, Some(ToolChoice::Auto));
    }
}
