//! Intent router - decides what kind of help a message asks for.
//!
//! A keyword screen for crisis language runs before anything else and never
//! touches the LLM. Everything else is classified by the LLM with a keyword
//! fallback when the call fails.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::llm::{LlmGateway, Message, Role};
use crate::prompt::{PromptRenderer, Template, intent_schema};
use crate::session::UploadedFile;

const CLASSIFY_TEMPERATURE: f32 = 0.2;
const DEFAULT_CONFIDENCE: f64 = 0.9;
const FALLBACK_CONFIDENCE: f64 = 0.6;
const CLARIFY_BELOW: f64 = 0.5;

/// Phrases that signal the student may be at risk
pub const CRISIS_KEYWORDS: &[&str] = &[
    "hurt myself",
    "kill myself",
    "suicide",
    "end my life",
    "want to die",
    "self harm",
    "self-harm",
    "cutting myself",
    "don't want to live",
    "no reason to live",
    "better off dead",
    "end it all",
    "not worth living",
    "take my own life",
];

/// Fixed reply when crisis language is detected
pub const CRISIS_RESPONSE: &str = "I'm really concerned about what you've shared. Your wellbeing matters more than any academic decision.

**Please reach out to someone who can help:**

🇵🇹 **Portugal:**
- SOS Voz Amiga: 213 544 545 (daily 15h-22h)
- Telefone da Amizade: 222 080 707

🌍 **International:**
- International Association for Suicide Prevention: https://www.iasp.info/resources/Crisis_Centres/

You're not alone. Please talk to a trusted adult, counselor, or call one of these helplines. They're there for you. 💙";

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "thanks"];
const GREETING_PHRASES: &[&str] = &["thank you"];
const DISCOVERY_PHRASES: &[&str] = &[
    "what major",
    "which major",
    "suggest major",
    "recommend major",
    "i like",
    "i love",
    "interested in",
];
const READINESS_PHRASES: &[&str] = &["am i ready", "do i qualify", "meet requirements", "good enough"];
const TRANSCRIPT_PHRASES: &[&str] = &["transcript", "grades", "report card", "my scores"];
const RESOURCE_PHRASES: &[&str] = &["study", "learn", "improve", "course", "resource", "how can i"];

/// Kind of help a message asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    CrisisSafety,
    MajorDiscovery,
    TranscriptAnalysis,
    GapAnalysis,
    ResourceRequest,
    GeneralQuestion,
    GreetingOrChitchat,
    Unknown,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::CrisisSafety => "crisis_safety",
            IntentType::MajorDiscovery => "major_discovery",
            IntentType::TranscriptAnalysis => "transcript_analysis",
            IntentType::GapAnalysis => "gap_analysis",
            IntentType::ResourceRequest => "resource_request",
            IntentType::GeneralQuestion => "general_question",
            IntentType::GreetingOrChitchat => "greeting_or_chitchat",
            IntentType::Unknown => "unknown",
        }
    }

    /// Parse a label from the LLM; anything unrecognised is `Unknown`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "crisis_safety" => IntentType::CrisisSafety,
            "major_discovery" => IntentType::MajorDiscovery,
            "transcript_analysis" => IntentType::TranscriptAnalysis,
            "gap_analysis" => IntentType::GapAnalysis,
            "resource_request" => IntentType::ResourceRequest,
            "general_question" => IntentType::GeneralQuestion,
            "greeting_or_chitchat" => IntentType::GreetingOrChitchat,
            _ => IntentType::Unknown,
        }
    }

    /// One-line description shown while the assistant works
    pub fn describe(&self) -> &'static str {
        match self {
            IntentType::MajorDiscovery => "Exploring which university majors match your interests",
            IntentType::TranscriptAnalysis => "Analyzing your academic transcript",
            IntentType::GapAnalysis => "Checking if your grades meet requirements for a specific major",
            IntentType::ResourceRequest => "Finding study resources to improve your skills",
            IntentType::GeneralQuestion => "Answering questions about universities and majors",
            IntentType::GreetingOrChitchat => "Having a casual conversation",
            IntentType::Unknown => "Understanding your request",
            IntentType::CrisisSafety => "Processing your message",
        }
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities pulled out of the message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntentContext {
    pub major: Option<String>,
    pub subjects: Vec<String>,
    pub interests: Vec<String>,
    pub has_transcript: bool,
}

/// Classification of one message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentResult {
    pub intent: IntentType,
    pub confidence: f64,
    pub reasoning: String,
    pub context: IntentContext,
    pub requires_transcript: bool,
    pub requires_major: bool,
}

impl IntentResult {
    pub fn crisis() -> Self {
        Self {
            intent: IntentType::CrisisSafety,
            confidence: 1.0,
            reasoning: "Crisis keywords detected".to_string(),
            context: IntentContext::default(),
            requires_transcript: false,
            requires_major: false,
        }
    }

    /// Question to ask back instead of answering, if the request is not actionable yet
    pub fn requires_clarification(&self, has_uploads: bool) -> Option<&'static str> {
        if self.confidence < CLARIFY_BELOW {
            return Some("I'm not quite sure what you're looking for. Could you rephrase that?");
        }
        if self.intent == IntentType::GapAnalysis && self.context.major.is_none() {
            return Some("Which major would you like me to check your readiness for?");
        }
        if self.requires_transcript && !has_uploads {
            return Some("I'll need to see your transcript to help with that. Could you upload your grades PDF?");
        }
        None
    }
}

/// Case-insensitive scan for crisis phrases
pub fn detect_crisis(message: &str) -> bool {
    let lower = message.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Classify a message. Never fails: LLM problems fall back to keyword rules.
///
/// `history` should already be cut to the window the router is allowed to see.
pub async fn classify_intent(
    llm: &LlmGateway,
    prompts: &PromptRenderer,
    message: &str,
    history: &[Message],
    uploads: &[UploadedFile],
) -> IntentResult {
    if detect_crisis(message) {
        tracing::warn!("Crisis keywords detected in message");
        return IntentResult::crisis();
    }

    match llm_classification(llm, prompts, message, history, uploads).await {
        Ok(result) => {
            tracing::info!(
                intent = result.intent.as_str(),
                confidence = result.confidence,
                "Classified intent"
            );
            result
        }
        Err(e) => {
            tracing::error!(error = %e, "Intent classification failed, using keyword fallback");
            fallback_classification(message, uploads)
        }
    }
}

async fn llm_classification(
    llm: &LlmGateway,
    prompts: &PromptRenderer,
    message: &str,
    history: &[Message],
    uploads: &[UploadedFile],
) -> Result<IntentResult> {
    let history: Vec<Value> = history
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            json!({"role": role, "content": m.content})
        })
        .collect();
    let files: Vec<Value> = uploads
        .iter()
        .map(|f| json!({"name": f.name, "path": f.path.display().to_string()}))
        .collect();

    let prompt = prompts.render_template(
        Template::Router,
        &json!({"history": history, "files": files, "message": message}),
    )?;
    let output = llm.structured(&prompt, &intent_schema(), CLASSIFY_TEMPERATURE).await?;

    Ok(intent_from_output(&output, !uploads.is_empty()))
}

fn intent_from_output(output: &Value, has_uploads: bool) -> IntentResult {
    let intent = IntentType::parse(output["intent"].as_str().unwrap_or("unknown"));
    let confidence = output["confidence"]
        .as_f64()
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);
    let entities = &output["extracted_entities"];

    let major = entities["major_mentioned"]
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let has_reference = entities["has_transcript_reference"].as_bool().unwrap_or(false);

    let requires_transcript =
        matches!(intent, IntentType::TranscriptAnalysis | IntentType::GapAnalysis) || has_reference;
    let requires_major = intent == IntentType::GapAnalysis && major.is_some();

    IntentResult {
        intent,
        confidence,
        reasoning: output["reasoning"].as_str().unwrap_or_default().to_string(),
        context: IntentContext {
            major,
            subjects: strings(&entities["subjects_mentioned"]),
            interests: strings(&entities["interests"]),
            has_transcript: has_uploads,
        },
        requires_transcript,
        requires_major,
    }
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Keyword rules used when the LLM cannot classify
pub fn fallback_classification(message: &str, uploads: &[UploadedFile]) -> IntentResult {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let any = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

    let has_transcript = !uploads.is_empty() || any(TRANSCRIPT_PHRASES);

    let intent = if GREETING_WORDS.iter().any(|g| words.contains(g)) || any(GREETING_PHRASES) {
        IntentType::GreetingOrChitchat
    } else if any(DISCOVERY_PHRASES) {
        IntentType::MajorDiscovery
    } else if any(READINESS_PHRASES) && has_transcript {
        IntentType::GapAnalysis
    } else if has_transcript {
        IntentType::TranscriptAnalysis
    } else if any(RESOURCE_PHRASES) {
        IntentType::ResourceRequest
    } else {
        IntentType::GeneralQuestion
    };

    IntentResult {
        intent,
        confidence: FALLBACK_CONFIDENCE,
        reasoning: "Classified using keyword fallback due to LLM error".to_string(),
        context: IntentContext {
            has_transcript: !uploads.is_empty(),
            ..Default::default()
        },
        requires_transcript: has_transcript,
        requires_major: false,
    }
}
