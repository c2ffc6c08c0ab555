//! Agent orchestrator - answers one message.
//!
//! Each message runs through a fixed sequence:
//! 1. Classify the intent
//! 2. Short-circuit crisis, clarification and greeting messages
//! 3. Loop: ask the LLM for the next tool call with the results so far (FRESH PROMPT)
//! 4. Execute the requested tools
//! 5. Synthesize the reply from everything gathered

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Value, json};

use super::router::{CRISIS_RESPONSE, IntentResult, IntentType, classify_intent};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::id::generate_call_id;
use crate::llm::{LlmGateway, Message, ToolCall, needs_tool_execution};
use crate::prompt::{PromptRenderer, SYSTEM_PROMPT, Template};
use crate::tools::{ToolContext, ToolExecutor, ToolOutcome};

const GREETING_TEMPERATURE: f32 = 0.8;
const DECISION_TEMPERATURE: f32 = 0.3;
const SYNTHESIS_TEMPERATURE: f32 = 0.7;
const DECISION_SUMMARY_CHARS: usize = 100;
const SYNTHESIS_OUTPUT_CHARS: usize = 500;

/// Reply used when the run fails part-way
pub const ERROR_RESPONSE: &str = "I encountered an error while processing your request. Could you try rephrasing or let me know if you need help?";

/// Where the agent is in answering a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    CallingTool,
    Synthesizing,
    Completed,
    Error,
}

/// Everything that happened while answering one message
#[derive(Debug, Clone)]
pub struct AgentState {
    pub session_id: String,
    pub user_message: String,
    pub intent: Option<IntentResult>,
    pub status: AgentStatus,
    pub plan: Option<String>,
    pub tool_results: Vec<ToolOutcome>,
    pub final_response: Option<String>,
    pub error_message: Option<String>,
    pub iterations: usize,
    pub execution_time: Duration,
}

/// Compact record of a run, for metadata and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub intent: Option<IntentType>,
    pub status: AgentStatus,
    pub num_tool_calls: usize,
    pub tools_used: Vec<String>,
    pub success: bool,
    /// Seconds
    pub execution_time: f64,
    pub had_errors: bool,
}

impl AgentState {
    pub fn new(session_id: &str, user_message: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_message: user_message.to_string(),
            intent: None,
            status: AgentStatus::Idle,
            plan: None,
            tool_results: Vec::new(),
            final_response: None,
            error_message: None,
            iterations: 0,
            execution_time: Duration::ZERO,
        }
    }

    pub fn intent_type(&self) -> Option<IntentType> {
        self.intent.as_ref().map(|i| i.intent)
    }

    /// Distinct tool names, sorted
    pub fn tools_used(&self) -> Vec<String> {
        self.tool_results
            .iter()
            .map(|r| r.tool.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn execution_summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            intent: self.intent_type(),
            status: self.status,
            num_tool_calls: self.tool_results.len(),
            tools_used: self.tools_used(),
            success: self.status == AgentStatus::Completed && self.final_response.is_some(),
            execution_time: self.execution_time.as_secs_f64(),
            had_errors: self.error_message.is_some() || self.tool_results.iter().any(|r| !r.success),
        }
    }

    fn complete(&mut self, response: String) {
        self.final_response = Some(response);
        self.status = AgentStatus::Completed;
    }
}

/// Step-by-step approach for each intent, shown to the LLM when it picks tools
pub fn plan_for(intent: IntentType) -> &'static str {
    match intent {
        IntentType::MajorDiscovery => {
            "1. Extract user's interests and favorite subjects\n\
             2. Call get_major_suggestions tool\n\
             3. Present top 3-5 matching majors with explanations"
        }
        IntentType::TranscriptAnalysis => {
            "1. Call parse_transcript tool to extract grades\n\
             2. Identify strongest and weakest subjects\n\
             3. Provide overview of academic profile"
        }
        IntentType::GapAnalysis => {
            "1. Parse transcript if not already done\n\
             2. Get major requirements using get_major_info\n\
             3. Call analyze_grades to compare\n\
             4. If gaps exist, call find_study_resources for weak subjects"
        }
        IntentType::ResourceRequest => {
            "1. Identify subject and specific topic from user message\n\
             2. Call find_study_resources tool\n\
             3. Present curated list with study plan"
        }
        IntentType::GeneralQuestion => {
            "1. Use general knowledge to answer\n\
             2. Call get_major_info if specific major mentioned\n\
             3. Provide comprehensive, cited answer"
        }
        _ => "Analyze message and respond appropriately",
    }
}

/// Runs the classify / tools / synthesize pipeline for one message
pub struct AgentOrchestrator {
    llm: LlmGateway,
    prompts: Arc<PromptRenderer>,
    executor: ToolExecutor,
    config: AgentConfig,
}

impl AgentOrchestrator {
    pub fn new(llm: LlmGateway, prompts: Arc<PromptRenderer>, executor: ToolExecutor, config: AgentConfig) -> Self {
        Self {
            llm,
            prompts,
            executor,
            config,
        }
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer `message`. Failures are recorded in the returned state, never raised.
    ///
    /// `history` is the conversation before this message, already windowed.
    pub async fn run(&self, message: &str, history: &[Message], ctx: &ToolContext) -> AgentState {
        let started = Instant::now();
        let mut state = AgentState::new(&ctx.session_id, message);

        if let Err(e) = self.process(&mut state, history, ctx).await {
            tracing::error!(session_id = %ctx.session_id, error = %e, "Agent run failed");
            state.status = AgentStatus::Error;
            state.error_message = Some(e.to_string());
            state.final_response = Some(ERROR_RESPONSE.to_string());
        }

        state.execution_time = started.elapsed();
        tracing::info!(
            session_id = %ctx.session_id,
            intent = state.intent_type().map(|i| i.as_str()).unwrap_or("none"),
            tool_calls = state.tool_results.len(),
            elapsed_ms = state.execution_time.as_millis() as u64,
            "Agent run finished"
        );
        state
    }

    async fn process(&self, state: &mut AgentState, history: &[Message], ctx: &ToolContext) -> Result<()> {
        state.status = AgentStatus::Thinking;
        let intent = classify_intent(&self.llm, &self.prompts, &state.user_message, history, ctx.uploads()).await;
        let kind = intent.intent;
        let clarification = intent.requires_clarification(!ctx.uploads().is_empty());
        state.intent = Some(intent);

        if kind == IntentType::CrisisSafety {
            state.complete(CRISIS_RESPONSE.to_string());
            return Ok(());
        }

        if let Some(question) = clarification {
            tracing::debug!(session_id = %ctx.session_id, intent = kind.as_str(), "Asking for clarification");
            state.complete(question.to_string());
            return Ok(());
        }

        if kind == IntentType::GreetingOrChitchat {
            let reply = self.greet(&state.user_message).await?;
            state.complete(reply);
            return Ok(());
        }

        state.plan = Some(plan_for(kind).to_string());
        self.gather(state, ctx).await?;

        state.status = AgentStatus::Synthesizing;
        let reply = self.synthesize(state).await?;
        state.complete(reply);
        Ok(())
    }

    async fn greet(&self, message: &str) -> Result<String> {
        let prompt = self
            .prompts
            .render_template(Template::Greeting, &json!({"message": message}))?;
        Ok(self.llm.text(SYSTEM_PROMPT, &prompt, GREETING_TEMPERATURE).await?)
    }

    /// Tool loop: ask for the next calls until the LLM stops or a limit is hit
    async fn gather(&self, state: &mut AgentState, ctx: &ToolContext) -> Result<()> {
        while state.iterations < self.config.max_iterations {
            if state.tool_results.len() >= self.config.max_tool_calls {
                tracing::warn!(session_id = %ctx.session_id, "Tool call limit reached");
                break;
            }
            state.iterations += 1;
            state.status = AgentStatus::CallingTool;

            let calls = self.decide_next_tools(state, ctx).await?;
            if calls.is_empty() {
                tracing::debug!(session_id = %ctx.session_id, iteration = state.iterations, "No more tools needed");
                break;
            }

            for call in calls {
                if state.tool_results.len() >= self.config.max_tool_calls {
                    break;
                }
                let call = ToolCall::new(
                    generate_call_id(&ctx.session_id, state.tool_results.len() + 1),
                    call.name,
                    call.input,
                );
                let outcome = self.executor.execute(&call, ctx).await;
                state.tool_results.push(outcome);
            }
        }
        Ok(())
    }

    async fn decide_next_tools(&self, state: &AgentState, ctx: &ToolContext) -> Result<Vec<ToolCall>> {
        let results: Vec<Value> = state
            .tool_results
            .iter()
            .map(|r| {
                json!({
                    "success": r.success,
                    "tool": r.tool,
                    "summary": r.summary(DECISION_SUMMARY_CHARS),
                })
            })
            .collect();

        let prompt = self.prompts.render_template(
            Template::ToolDecision,
            &json!({
                "intent": state.intent_type().map(|i| i.as_str()).unwrap_or("unknown"),
                "message": state.user_message,
                "plan": state.plan,
                "results": results,
                "files": upload_list(ctx),
            }),
        )?;

        let response = self
            .llm
            .with_tools(SYSTEM_PROMPT, &prompt, self.executor.definitions(), DECISION_TEMPERATURE)
            .await?;
        if !needs_tool_execution(&response) {
            return Ok(Vec::new());
        }
        Ok(response.tool_calls)
    }

    async fn synthesize(&self, state: &AgentState) -> Result<String> {
        let results: Vec<Value> = state
            .tool_results
            .iter()
            .map(|r| {
                json!({
                    "tool": r.tool,
                    "success": r.success,
                    "output": r.summary(SYNTHESIS_OUTPUT_CHARS),
                    "error": r.error,
                })
            })
            .collect();

        let prompt = self.prompts.render_template(
            Template::Synthesis,
            &json!({
                "message": state.user_message,
                "intent": state.intent_type().map(|i| i.as_str()).unwrap_or("unknown"),
                "results": results,
            }),
        )?;

        Ok(self.llm.text(SYSTEM_PROMPT, &prompt, SYNTHESIS_TEMPERATURE).await?)
    }
}

fn upload_list(ctx: &ToolContext) -> Vec<Value> {
    ctx.uploads()
        .iter()
        .map(|f| json!({"name": f.name, "path": f.path.display().to_string()}))
        .collect()
}
