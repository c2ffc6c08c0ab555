//! create_personalized_study_plan tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, lenient_count, lenient_number, optional_text, parse_input};
use crate::services::create_study_plan;

pub struct CreateStudyPlanTool;

#[derive(Debug, Deserialize)]
struct Input {
    subject: String,
    #[serde(default, deserialize_with = "optional_text")]
    topic: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    current_grade: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    target_grade: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    available_time_per_week: Option<usize>,
}

#[async_trait]
impl Tool for CreateStudyPlanTool {
    fn name(&self) -> &'static str {
        "create_personalized_study_plan"
    }

    fn description(&self) -> &'static str {
        "Creates a study plan for one subject with curated resources, a step-by-step approach and a realistic \
         timeline, based on the student's current and target grade."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "subject": {
                    "type": "string",
                    "description": "Subject to study (e.g., 'Math')"
                },
                "topic": {
                    "type": "string",
                    "description": "Specific topic (e.g., 'Calculus'), optional"
                },
                "current_grade": {
                    "type": "number",
                    "description": "Student's current grade (0-20 scale)"
                },
                "target_grade": {
                    "type": "number",
                    "description": "Desired grade (0-20 scale)"
                },
                "available_time_per_week": {
                    "type": "integer",
                    "description": "Hours available per week for study"
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
        for grade in [input.current_grade, input.target_grade].into_iter().flatten() {
            if !ctx.grading.is_valid(grade) {
                return Err(ToolError::InvalidInput {
                    message: format!("grade {} is outside 0-{}", grade, ctx.grading.max_grade),
                });
            }
        }

        let plan = create_study_plan(
            &ctx.llm,
            &ctx.prompts,
            subject,
            input.topic.as_deref(),
            input.current_grade,
            input.target_grade,
            input.available_time_per_week.map(|h| u32::try_from(h).unwrap_or(u32::MAX)),
        )
        .await;

        Ok(json!({
            "plan": plan.plan,
            "resources": plan.resources,
            "estimated_time": plan.estimated_time,
            "priority_order": plan.priority_order,
            "subject": plan.subject,
            "topic": plan.topic,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::tools::context::tests::test_context;

    #[tokio::test]
    async fn test_plan_with_grades_as_text() {
        let (mock, ctx) = test_context();
        mock.push_error(LlmError::InvalidResponse("offline".to_string()));
        mock.push_text("Start with functions, then limits.");

        let result = CreateStudyPlanTool
            .execute(
                json!({
                    "subject": "Math",
                    "topic": "Calculus",
                    "current_grade": "12",
                    "target_grade": 16,
                    "available_time_per_week": 4
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result["plan"], "Start with functions, then limits.");
        assert_eq!(result["estimated_time"], "4-6 months with consistent effort");
        assert_eq!(result["resources"].as_array().unwrap().len(), 2);
        assert_eq!(result["priority_order"].as_array().unwrap().len(), 2);
        assert!(mock.requests()[1].last_user_text().unwrap().contains("4 hours/week"));
    }

    #[tokio::test]
    async fn test_huge_weekly_hours_saturate() {
        let (mock, ctx) = test_context();
        mock.push_error(LlmError::InvalidResponse("offline".to_string()));
        mock.push_text("Practise every day.");

        CreateStudyPlanTool
            .execute(
                json!({"subject": "Physics", "available_time_per_week": 4_294_967_297u64}),
                &ctx,
            )
            .await
            .unwrap();

        let prompt = mock.requests()[1].last_user_text().unwrap().to_string();
        assert!(prompt.contains("4294967295 hours/week"));
        assert!(!prompt.contains(" 1 hours/week"));
    }

    #[tokio::test]
    async fn test_rejects_out_of_scale_grade() {
        let (mock, ctx) = test_context();
        let err = CreateStudyPlanTool
            .execute(json!({"subject": "Math", "target_grade": 40}), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput { .. }));
        assert_eq!(mock.call_count(), 0);
    }
}
