//! get_major_info tool - details of one major from the catalog

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, parse_input};

const SIMILAR_MAJORS: usize = 3;

pub struct GetMajorInfoTool;

#[derive(Debug, Deserialize)]
struct Input {
    major_name: String,
    #[serde(default)]
    include_similar: bool,
}

#[async_trait]
impl Tool for GetMajorInfoTool {
    fn name(&self) -> &'static str {
        "get_major_info"
    }

    fn description(&self) -> &'static str {
        "Retrieves comprehensive information about a specific university major from the curated database. \
         Returns major description, typical requirements, career paths, and related information."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "major_name": {
                    "type": "string",
                    "description": "Name of the major to look up (e.g., 'Computer Science', 'Engineering', 'Medicine')"
                },
                "include_similar": {
                    "type": "boolean",
                    "description": "If true, also return similar/related majors"
                }
            },
            "required": ["major_name"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let input: Input = parse_input(input)?;
        log::info!("Getting info for major: {}", input.major_name);

        let Some(major) = ctx.catalog.find_by_name(&input.major_name, true) else {
            log::warn!("Major '{}' not found in catalog", input.major_name);
            return Err(ToolError::NotFound {
                message: format!(
                    "Major '{}' not found. Try: Computer Science, Engineering, Medicine, Business, or similar common majors. \
                     Use get_major_suggestions to find majors based on your interests.",
                    input.major_name
                ),
            });
        };

        let mut result = json!({
            "major": major,
            "source": "curated_data",
        });

        if input.include_similar {
            let similar: Vec<Value> = ctx
                .catalog
                .similar(major, SIMILAR_MAJORS)
                .into_iter()
                .map(|(m, _)| json!({"name": m.name, "id": m.id}))
                .collect();
            result["similar_majors"] = Value::Array(similar);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::context::tests::test_context;

    #[tokio::test]
    async fn test_finds_major_by_portuguese_name() {
        let (_, ctx) = test_context();
        let result = GetMajorInfoTool
            .execute(json!({"major_name": "medicina"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["major"]["id"], "medicine");
        assert_eq!(result["major"]["requirements"]["Biology"], 18.0);
        assert_eq!(result["source"], "curated_data");
        assert!(result.get("similar_majors").is_none());
    }

    #[tokio::test]
    async fn test_include_similar() {
        let (_, ctx) = test_context();
        let result = GetMajorInfoTool
            .execute(json!({"major_name": "Computer Science", "include_similar": true}), &ctx)
            .await
            .unwrap();

        let similar = result["similar_majors"].as_array().unwrap();
        assert!(!similar.is_empty() && similar.len() <= 3);
        assert_eq!(similar[0]["id"], "computer_engineering");
        assert!(similar.iter().all(|m| m["id"] != "computer_science"));
    }

    #[tokio::test]
    async fn test_unknown_major_suggests_alternatives() {
        let (_, ctx) = test_context();
        let err = GetMajorInfoTool
            .execute(json!({"major_name": "Astrology"}), &ctx)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Major 'Astrology' not found."));
        assert!(message.contains("get_major_suggestions"));
    }
}
