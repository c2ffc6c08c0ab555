//! Tool system for the agent loop
//!
//! Tools are the functions the LLM can call through function calling. Each
//! one takes JSON input, works against the majors catalog, the grade
//! services or the session's uploads, and returns JSON for the synthesis
//! step. They run with a `ToolContext` scoped to one chat session.

mod analyze_grades;
pub(crate) mod context;
mod create_study_plan;
mod executor;
mod find_study_resources;
mod get_major_info;
mod get_major_suggestions;
mod parse_transcript;
mod search_major_database;

pub use context::{ToolContext, ToolError, TranscriptCache};
pub use executor::{ToolExecutor, ToolOutcome};

pub use analyze_grades::AnalyzeGradesTool;
pub use create_study_plan::CreateStudyPlanTool;
pub use find_study_resources::FindStudyResourcesTool;
pub use get_major_info::GetMajorInfoTool;
pub use get_major_suggestions::GetMajorSuggestionsTool;
pub use parse_transcript::ParseTranscriptTool;
pub use search_major_database::SearchMajorDatabaseTool;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::llm::ToolDefinition;
use crate::services::transcript::grade_value;

/// A tool that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches LLM tool_use name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Cut `text` to `max_chars` characters, marking the cut with "..."
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

pub(crate) fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput { message: e.to_string() })
}

/// Number that may arrive as JSON text; anything unusable reads as absent
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(grade_value))
}

pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n as usize))
}

/// List of strings; null reads as empty and a bare string as a one-item list
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Optional text; blank reads as absent
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_number")]
        grade: Option<f64>,
        #[serde(default, deserialize_with = "lenient_count")]
        top_n: Option<usize>,
        #[serde(default, deserialize_with = "string_list")]
        interests: Vec<String>,
        #[serde(default, deserialize_with = "optional_text")]
        topic: Option<String>,
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_lenient_fields() {
        let sample: Sample = parse_input(json!({
            "grade": "14,5",
            "top_n": "3",
            "interests": ["math", " ", 42],
            "topic": "  "
        }))
        .unwrap();
        assert_eq!(sample.grade, Some(14.5));
        assert_eq!(sample.top_n, Some(3));
        assert_eq!(sample.interests, vec!["math", "42"]);
        assert!(sample.topic.is_none());
    }

    #[test]
    fn test_lenient_fields_missing_or_null() {
        let sample: Sample = parse_input(json!({"interests": null, "top_n": 0})).unwrap();
        assert!(sample.grade.is_none());
        assert!(sample.top_n.is_none());
        assert!(sample.interests.is_empty());

        let single: Sample = parse_input(json!({"interests": "robots"})).unwrap();
        assert_eq!(single.interests, vec!["robots"]);
    }

    #[test]
    fn test_parse_input_reports_type_errors() {
        #[derive(Debug, Deserialize)]
        struct Needs {
            #[allow(dead_code)]
            query: String,
        }
        let err = parse_input::<Needs>(json!({"query": 5})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }
}
