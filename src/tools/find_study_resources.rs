//! find_study_resources tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, optional_text, parse_input};
use crate::services::recommend_study_resources;
use crate::services::resources::DEFAULT_LEVEL;

pub struct FindStudyResourcesTool;

#[derive(Debug, Deserialize)]
struct Input {
    subject: String,
    #[serde(default, deserialize_with = "optional_text")]
    topic: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    level: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    goal: Option<String>,
}

#[async_trait]
impl Tool for FindStudyResourcesTool {
    fn name(&self) -> &'static str {
        "find_study_resources"
    }

    fn description(&self) -> &'static str {
        "Generates personalized study resource recommendations (courses, videos, practice sites) for a specific \
         subject or topic. Resources are tailored to the student's level and goals."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "subject": {
                    "type": "string",
                    "description": "Subject area (e.g., 'Math', 'Physics', 'Portuguese')"
                },
                "topic": {
                    "type": "string",
                    "description": "Specific topic within the subject (e.g., 'Calculus', 'Mechanics'). Optional but helps narrow recommendations."
                },
                "level": {
                    "type": "string",
                    "description": "Student's current level: high_school, university_prep, beginner, or intermediate"
                },
                "goal": {
                    "type": "string",
                    "description": "Student's goal (e.g., 'improve from 13 to 16', 'prepare for university entrance exam')"
                }
            },
            "required": ["subject"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let input: Input = parse_input(input)?;
        let subject = input.subject.trim();
        if subject.is_empty() {
            return Err(ToolError::InvalidInput {
                message: "subject is empty".to_string(),
            });
        }

        let resources = recommend_study_resources(
            &ctx.llm,
            &ctx.prompts,
            subject,
            input.topic.as_deref(),
            input.level.as_deref().unwrap_or(DEFAULT_LEVEL),
            input.goal.as_deref(),
        )
        .await;

        Ok(json!({
            "count": resources.len(),
            "resources": resources,
            "subject": subject,
            "topic": input.topic,
        }))
    }
}
