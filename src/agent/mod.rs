//! Conversational agent
//!
//! `router` classifies a message, `orchestrator` runs the tool loop for it and
//! `chat` ties the result to a session.

pub mod chat;
pub mod orchestrator;
pub mod router;

pub use chat::{ChatResponse, ChatService, GENERIC_ERROR_MESSAGE, suggestions_for};
pub use orchestrator::{AgentOrchestrator, AgentState, AgentStatus, ERROR_RESPONSE, ExecutionSummary, plan_for};
pub use router::{
    CRISIS_KEYWORDS, CRISIS_RESPONSE, IntentContext, IntentResult, IntentType, classify_intent, detect_crisis,
    fallback_classification,
};
