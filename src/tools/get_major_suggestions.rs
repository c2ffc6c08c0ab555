//! get_major_suggestions tool - rank majors by interests and favourite subjects

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, lenient_count, optional_text, parse_input, string_list};
use crate::services::matching::{DEFAULT_TOP_N, match_interests_to_majors};

pub struct GetMajorSuggestionsTool;

#[derive(Debug, Deserialize)]
struct Input {
    #[serde(default, deserialize_with = "string_list")]
    interests: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    favorite_subjects: Vec<String>,
    #[serde(default, deserialize_with = "optional_text")]
    career_goals: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    top_n: Option<usize>,
}

#[async_trait]
impl Tool for GetMajorSuggestionsTool {
    fn name(&self) -> &'static str {
        "get_major_suggestions"
    }

    fn description(&self) -> &'static str {
        "Suggests suitable university majors based on student's interests, favorite subjects, hobbies, and \
         career goals. Matches against major descriptions and keywords."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "interests": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of student interests, hobbies, or favorite activities"
                },
                "favorite_subjects": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of favorite school subjects"
                },
                "career_goals": {
                    "type": "string",
                    "description": "Student's career aspirations or dream jobs (optional)"
                },
                "top_n": {
                    "type": "integer",
                    "description": "Number of major suggestions to return"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let input: Input = parse_input(input)?;
        log::info!("Generating major suggestions for {} interests", input.interests.len());

        let matches = match_interests_to_majors(
            &ctx.catalog,
            &input.interests,
            &input.favorite_subjects,
            input.career_goals.as_deref(),
            input.top_n.unwrap_or(DEFAULT_TOP_N),
        );

        if matches.is_empty() {
            return Err(ToolError::NotFound {
                message: "No matching majors found. Try broader or different interests.".to_string(),
            });
        }

        let suggestions: Vec<Value> = matches
            .iter()
            .map(|m| {
                json!({
                    "name": m.major.name,
                    "id": m.major.id,
                    "score": (m.score * 100.0).round() / 100.0,
                    "description": m.major.description,
                    "reasons": m.reasons,
                    "career_paths": m.major.career_paths,
                    "requirements": m.major.requirements,
                    "keywords": m.matching_keywords,
                })
            })
            .collect();

        log::info!("Generated {} major suggestions", suggestions.len());

        Ok(json!({
            "suggestions": suggestions,
            "total_matches": matches.len(),
        }))
    }
}
