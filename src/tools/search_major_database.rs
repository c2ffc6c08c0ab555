//! search_major_database tool - free-text search over the catalog

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, lenient_count, parse_input, truncate};

const DEFAULT_MAX_RESULTS: usize = 10;
const DESCRIPTION_CHARS: usize = 150;
const KEYWORDS_SHOWN: usize = 5;

pub struct SearchMajorDatabaseTool;

#[derive(Debug, Deserialize)]
struct Input {
    query: String,
    #[serde(default, deserialize_with = "lenient_count")]
    max_results: Option<usize>,
}

#[async_trait]
impl Tool for SearchMajorDatabaseTool {
    fn name(&self) -> &'static str {
        "search_major_database"
    }

    fn description(&self) -> &'static str {
        "Searches the major database by name, keywords, or description. Useful when the user mentions a major \
         but the exact name is uncertain."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (e.g., 'computer', 'engineering', 'medical')"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default 10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let input: Input = parse_input(input)?;
        log::info!("Searching majors for: {}", input.query);

        let results: Vec<Value> = ctx
            .catalog
            .search(&input.query)
            .into_iter()
            .take(input.max_results.unwrap_or(DEFAULT_MAX_RESULTS))
            .map(|major| {
                json!({
                    "name": major.name,
                    "id": major.id,
                    "description": truncate(&major.description, DESCRIPTION_CHARS),
                    "keywords": major.keywords.iter().take(KEYWORDS_SHOWN).collect::<Vec<_>>(),
                })
            })
            .collect();

        log::info!("Found {} results for '{}'", results.len(), input.query);

        Ok(json!({
            "count": results.len(),
            "results": results,
            "query": input.query,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::context::tests::test_context;

    #[tokio::test]
    async fn test_search_engineering() {
        let (_, ctx) = test_context();
        let result = SearchMajorDatabaseTool
            .execute(json!({"query": "Engineering"}), &ctx)
            .await
            .unwrap();

        let ids: Vec<&str> = result["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"computer_engineering"));
        assert!(ids.contains(&"civil_engineering"));
        assert_eq!(result["count"], ids.len());
        assert_eq!(result["query"], "Engineering");
        assert!(
            result["results"]
                .as_array()
                .unwrap()
                .iter()
                .all(|r| r["keywords"].as_array().unwrap().len() <= 5)
        );
    }

    #[tokio::test]
    async fn test_max_results() {
        let (_, ctx) = test_context();
        let result = SearchMajorDatabaseTool
            .execute(json!({"query": "math", "max_results": 2}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["count"], 2);
    }

    #[tokio::test]
    async fn test_blank_query_finds_nothing() {
        let (_, ctx) = test_context();
        let result = SearchMajorDatabaseTool
            .execute(json!({"query": "   "}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["count"], 0);
    }
}
