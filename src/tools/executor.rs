//! Tool executor - manages tool registration and execution

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use super::{
    AnalyzeGradesTool, CreateStudyPlanTool, FindStudyResourcesTool, GetMajorInfoTool, GetMajorSuggestionsTool,
    ParseTranscriptTool, SearchMajorDatabaseTool, Tool, ToolContext, ToolError, truncate,
};
use crate::llm::{ToolCall, ToolDefinition, validate_tool_input};

/// What happened when one tool call ran
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub call_id: String,
    pub tool: String,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub elapsed: Duration,
    pub args: Value,
}

impl ToolOutcome {
    /// Result JSON or error text, cut to `max_chars`
    pub fn summary(&self, max_chars: usize) -> String {
        match (&self.result, &self.error) {
            (Some(result), _) if self.success => truncate(&result.to_string(), max_chars),
            (_, Some(error)) => truncate(error, max_chars),
            _ => String::new(),
        }
    }
}

/// Registry of the tools the agent may call
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create executor with standard tools
    pub fn standard() -> Self {
        let mut executor = Self::new();

        // Transcript
        executor.add_tool(Box::new(ParseTranscriptTool));
        executor.add_tool(Box::new(AnalyzeGradesTool));

        // Majors
        executor.add_tool(Box::new(GetMajorInfoTool));
        executor.add_tool(Box::new(GetMajorSuggestionsTool));
        executor.add_tool(Box::new(SearchMajorDatabaseTool));

        // Study help
        executor.add_tool(Box::new(FindStudyResourcesTool));
        executor.add_tool(Box::new(CreateStudyPlanTool));

        executor
    }

    /// Create an empty executor (for custom tool sets)
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Add a tool to the executor
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Tool definitions for the LLM, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Get tool definitions for specific tool names
    pub fn definitions_for(&self, tool_names: &[&str]) -> Vec<ToolDefinition> {
        tool_names
            .iter()
            .filter_map(|name| self.tools.get(*name))
            .map(|t| t.definition())
            .collect()
    }

    /// Execute a tool call; failures are reported in the outcome, never raised
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolOutcome {
        let start = Instant::now();

        let result = match self.tools.get(&call.name) {
            Some(tool) => match validate_tool_input(call, &tool.definition()) {
                Ok(()) => tool.execute(call.input.clone(), ctx).await,
                Err(e) => Err(ToolError::from(e)),
            },
            None => Err(ToolError::UnknownTool {
                name: call.name.clone(),
            }),
        };
        let elapsed = start.elapsed();

        match result {
            Ok(value) => {
                tracing::info!(
                    session_id = %ctx.session_id,
                    tool = %call.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "tool succeeded"
                );
                ToolOutcome {
                    call_id: call.id.clone(),
                    tool: call.name.clone(),
                    success: true,
                    result: Some(value),
                    error: None,
                    elapsed,
                    args: call.input.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %ctx.session_id,
                    tool = %call.name,
                    error = %e,
                    "tool failed"
                );
                ToolOutcome {
                    call_id: call.id.clone(),
                    tool: call.name.clone(),
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                    elapsed,
                    args: call.input.clone(),
                }
            }
        }
    }

    /// Execute multiple tool calls in order
    pub async fn execute_all(&self, tool_calls: &[ToolCall], ctx: &ToolContext) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            outcomes.push(self.execute(call, ctx).await);
        }

        outcomes
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the list of tool names
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::standard()
    }
}
