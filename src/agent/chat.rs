//! Chat service - the front door for one user message.
//!
//! Keeps the session history in step with the agent, screens for crisis
//! language before any LLM call, and turns an `AgentState` into the reply,
//! metadata and follow-up suggestions the user sees.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use super::orchestrator::{AgentOrchestrator, AgentState, AgentStatus};
use super::router::{CRISIS_RESPONSE, IntentType, detect_crisis};
use crate::catalog::MajorCatalog;
use crate::config::Config;
use crate::error::Result;
use crate::llm::LlmGateway;
use crate::prompt::PromptRenderer;
use crate::session::ChatSession;
use crate::tools::{ToolContext, ToolExecutor};

const MAX_SUGGESTIONS: usize = 3;

/// Reply when the agent failed without producing its own apology
pub const GENERIC_ERROR_MESSAGE: &str = "I'm having trouble processing your request right now. This could be a temporary issue. Please try:
- Rephrasing your question
- Being more specific about what you need
- Checking if any files uploaded correctly

If the problem persists, feel free to start a new conversation.";

const UNEXPECTED_STATE_MESSAGE: &str = "I had trouble processing that. Could you try rephrasing?";

/// What the user gets back for one message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub success: bool,
    pub metadata: Value,
    pub suggestions: Vec<String>,
}

pub struct ChatService {
    orchestrator: AgentOrchestrator,
    tools: ToolContext,
    history_window: usize,
}

impl ChatService {
    /// Wire the agent from configuration with the built-in prompts and tool set
    pub fn new(llm: LlmGateway, catalog: Arc<MajorCatalog>, config: &Config) -> Result<Self> {
        let prompts = Arc::new(PromptRenderer::builtin()?);
        let tools = ToolContext::new(llm.clone(), catalog, prompts.clone(), config.grading.clone());
        let orchestrator = AgentOrchestrator::new(llm, prompts, ToolExecutor::standard(), config.agent.clone());
        Ok(Self::from_parts(orchestrator, tools))
    }

    pub fn from_parts(orchestrator: AgentOrchestrator, tools: ToolContext) -> Self {
        let history_window = orchestrator.config().history_window;
        Self {
            orchestrator,
            tools,
            history_window,
        }
    }

    pub fn catalog(&self) -> &MajorCatalog {
        &self.tools.catalog
    }

    /// Handle one message and record both sides of the exchange in `session`
    pub async fn process_message(&self, session: &mut ChatSession, message: &str) -> ChatResponse {
        if session.is_expired() {
            log::info!("Session {} expired, starting over", session.id);
            session.clear();
        }

        if detect_crisis(message) {
            tracing::warn!(session_id = %session.id, "Crisis keywords detected, sending helpline response");
            session.add_user_message(message);
            session.add_assistant_message(CRISIS_RESPONSE);
            return ChatResponse {
                message: CRISIS_RESPONSE.to_string(),
                success: true,
                metadata: json!({
                    "intent": IntentType::CrisisSafety,
                    "session_id": session.id,
                }),
                suggestions: Vec::new(),
            };
        }

        let history = session.recent_history(self.history_window).to_vec();
        let ctx = self.tools.for_session(&session.id, session.uploads());
        let state = self.orchestrator.run(message, &history, &ctx).await;
        session.add_user_message(message);

        let response = match (state.status, &state.final_response) {
            (AgentStatus::Completed, Some(reply)) => ChatResponse {
                message: reply.clone(),
                success: true,
                metadata: json!({
                    "intent": state.intent_type(),
                    "tools_used": state.tool_results.iter().map(|o| o.tool.as_str()).collect::<Vec<_>>(),
                    "execution_time": state.execution_time.as_secs_f64(),
                    "session_id": session.id,
                }),
                suggestions: suggestions_for(&state),
            },
            (AgentStatus::Error, reply) => ChatResponse {
                message: reply.clone().unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
                success: false,
                metadata: json!({
                    "error": state.error_message,
                    "session_id": session.id,
                }),
                suggestions: Vec::new(),
            },
            (status, _) => {
                log::warn!("Session {}: agent ended in unexpected state {:?}", session.id, status);
                ChatResponse {
                    message: UNEXPECTED_STATE_MESSAGE.to_string(),
                    success: false,
                    metadata: json!({"session_id": session.id}),
                    suggestions: Vec::new(),
                }
            }
        };

        session.add_assistant_message(&response.message);
        response
    }
}

/// Follow-up prompts offered after a reply
pub fn suggestions_for(state: &AgentState) -> Vec<String> {
    let suggestions: &[&str] = match state.intent_type() {
        Some(IntentType::MajorDiscovery) => &[
            "Tell me more about one of these majors",
            "Check if my grades meet the requirements",
            "What careers can I pursue with this major?",
        ],
        Some(IntentType::TranscriptAnalysis) => &[
            "Which major should I consider based on my grades?",
            "How can I improve my weakest subject?",
            "Am I ready for Computer Science?",
        ],
        Some(IntentType::GapAnalysis) if found_gaps(state) => &[
            "Show me resources to improve my weak subjects",
            "What's a realistic timeline to close these gaps?",
            "Are there alternative majors that fit my current grades?",
        ],
        Some(IntentType::GapAnalysis) => &[
            "What universities offer this major?",
            "What should I focus on to maintain my readiness?",
            "Tell me about career prospects in this field",
        ],
        Some(IntentType::ResourceRequest) => &[
            "Create a study schedule for me",
            "Are there any free courses available?",
            "What's the most important topic to focus on first?",
        ],
        Some(IntentType::GeneralQuestion) => &[
            "Help me find majors that match my interests",
            "Analyze my transcript",
            "What are the most popular majors?",
        ],
        _ => &[],
    };

    suggestions
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect()
}

fn found_gaps(state: &AgentState) -> bool {
    state.tool_results.iter().any(|r| {
        r.success
            && r.tool == "analyze_grades"
            && r.result
                .as_ref()
                .and_then(|v| v["gaps"].as_array())
                .is_some_and(|gaps| !gaps.is_empty())
    })
}
