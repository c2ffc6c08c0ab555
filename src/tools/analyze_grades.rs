//! analyze_grades tool - transcript statistics and gap analysis against a major
//!
//! The readiness verdict and the gap list are computed deterministically. The
//! LLM only writes the per-subject recommendations; when it fails, they are
//! derived from the gaps instead.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{Tool, ToolContext, ToolError, optional_text, parse_input, truncate};
use crate::error::Ready4UniError;
use crate::prompt::{Template, gap_analysis_schema};
use crate::services::transcript::grade_value;
use crate::services::{GradeGap, analyze_transcript, compare_grades_to_requirements};

const GAP_ANALYSIS_TEMPERATURE: f32 = 0.3;
const MAX_SUBJECT_CHARS: usize = 30;
const MAX_RECOMMENDATION_CHARS: usize = 150;
const MAX_RECOMMENDATIONS: usize = 3;

pub struct AnalyzeGradesTool;

#[derive(Debug, Deserialize)]
struct Input {
    student_grades: Map<String, Value>,
    #[serde(default, deserialize_with = "optional_text")]
    major_name: Option<String>,
}

#[async_trait]
impl Tool for AnalyzeGradesTool {
    fn name(&self) -> &'static str {
        "analyze_grades"
    }

    fn description(&self) -> &'static str {
        "Analyzes a student's grades and, when a major is given, compares them against that major's typical \
         requirements. Identifies which subjects meet requirements and which need improvement."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "student_grades": {
                    "type": "object",
                    "description": "Dictionary mapping subjects to grades on the 0-20 scale (e.g., {\"Math\": 13, \"Physics\": 15})"
                },
                "major_name": {
                    "type": "string",
                    "description": "Name of the target major to compare against"
                }
            },
            "required": ["student_grades"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let input: Input = parse_input(input)?;
        log::info!(
            "Analyzing grades{}",
            input.major_name.as_deref().map(|m| format!(" for {}", m)).unwrap_or_default()
        );

        let grades = clean_grades(&input.student_grades);
        if grades.is_empty() {
            return Err(ToolError::InvalidInput {
                message: "No valid grades provided".to_string(),
            });
        }

        let analysis = analyze_transcript(&grades, &ctx.grading)?;
        let mut result = json!({
            "analysis": {
                "gpa": (analysis.gpa * 100.0).round() / 100.0,
                "overall_quality": analysis.overall_quality,
                "strengths": analysis.strengths,
                "weaknesses": analysis.weaknesses,
                "passing_all": analysis.passing_all,
            }
        });

        let Some(major_name) = input.major_name else {
            result["recommendations"] = json!(
                analysis
                    .weaknesses
                    .iter()
                    .take(2)
                    .map(|s| format!("Consider strengthening {}", s))
                    .collect::<Vec<_>>()
            );
            return Ok(result);
        };

        let (gaps, readiness) = match compare_grades_to_requirements(&ctx.catalog, &grades, &major_name, &ctx.grading) {
            Ok(comparison) => comparison,
            Err(e) => {
                log::warn!("Could not perform gap analysis: {}", e);
                result["major"] = json!(major_name);
                result["gaps"] = json!([]);
                result["readiness"] = json!("unknown");
                result["recommendations"] = json!([
                    format!("Could not find requirement data for {}", major_name),
                    "Please verify the major name or try a different major",
                ]);
                return Ok(result);
            }
        };

        let mut gaps: Vec<GradeGap> = gaps.into_iter().filter(GradeGap::is_gap).collect();
        gaps.sort_by_key(|g| g.priority);

        let major = ctx
            .catalog
            .find_by_name(&major_name, true)
            .map(|m| m.name.clone())
            .unwrap_or(major_name);

        result["major"] = json!(major);
        result["readiness"] = json!(readiness);
        result["gaps"] = json!(
            gaps.iter()
                .map(|g| json!({
                    "subject": g.subject,
                    "current_grade": g.student_grade,
                    "required_grade": g.required_grade,
                    "gap": g.gap,
                    "severity": g.severity,
                    "priority": g.priority,
                    "assumed": g.assumed,
                }))
                .collect::<Vec<_>>()
        );

        match llm_gap_analysis(ctx, &major, &grades).await {
            Ok(llm_analysis) => {
                let summary = llm_analysis
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let mut recommendations: Vec<String> = llm_analysis
                    .get("analysis")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .take(MAX_RECOMMENDATIONS)
                    .map(|item| {
                        item.get("recommendation")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| {
                                format!(
                                    "Improve {}",
                                    item.get("subject").and_then(Value::as_str).unwrap_or("this subject")
                                )
                            })
                    })
                    .collect();
                if recommendations.is_empty() && !summary.is_empty() {
                    recommendations.push(summary.clone());
                }
                if recommendations.is_empty() {
                    recommendations.push("Focus on your weakest subjects".to_string());
                }

                result["recommendations"] = json!(recommendations);
                result["summary"] = json!(summary);
                result["llm_analysis"] = llm_analysis;
            }
            Err(e) => {
                log::warn!("LLM gap analysis failed, using fallback: {}", e);
                result["recommendations"] = json!(fallback_recommendations(&gaps, &major));
            }
        }

        log::info!("Gap analysis complete: {}, {} gaps", readiness, gaps.len());
        Ok(result)
    }
}

/// Numeric grades only; null or unparseable values are skipped
fn clean_grades(raw: &Map<String, Value>) -> BTreeMap<String, f64> {
    raw.iter()
        .filter_map(|(subject, value)| match grade_value(value) {
            Some(grade) => Some((subject.trim().to_string(), grade)),
            None => {
                if !value.is_null() {
                    log::warn!("Skipping invalid grade for {}: {}", subject, value);
                }
                None
            }
        })
        .filter(|(subject, _)| !subject.is_empty())
        .collect()
}

async fn llm_gap_analysis(
    ctx: &ToolContext,
    major: &str,
    grades: &BTreeMap<String, f64>,
) -> Result<Value, Ready4UniError> {
    let requirements = ctx
        .catalog
        .find_by_name(major, true)
        .map(|m| m.requirements.clone())
        .unwrap_or_default();

    let prompt = ctx.prompts.render_template(
        Template::GapAnalysis,
        &json!({
            "major_name": major,
            "student_grades": serde_json::to_string(grades)?,
            "major_requirements": serde_json::to_string(&requirements)?,
        }),
    )?;

    let mut analysis = ctx
        .llm
        .structured(&prompt, &gap_analysis_schema(), GAP_ANALYSIS_TEMPERATURE)
        .await?;
    sanitize_gap_analysis(&mut analysis);
    Ok(analysis)
}

/// Keep subjects to a bare name and recommendations short
fn sanitize_gap_analysis(analysis: &mut Value) {
    let Some(items) = analysis.get_mut("analysis").and_then(Value::as_array_mut) else {
        return;
    };

    for item in items {
        if let Some(subject) = item.get("subject").and_then(Value::as_str)
            && subject.chars().count() > MAX_SUBJECT_CHARS
        {
            let short: String = subject
                .split_whitespace()
                .next()
                .unwrap_or(subject)
                .chars()
                .take(MAX_SUBJECT_CHARS)
                .collect();
            item["subject"] = json!(short);
        }
        if let Some(recommendation) = item.get("recommendation").and_then(Value::as_str)
            && recommendation.chars().count() > MAX_RECOMMENDATION_CHARS
        {
            item["recommendation"] = json!(truncate(recommendation, MAX_RECOMMENDATION_CHARS));
        }
    }
}

fn fallback_recommendations(gaps: &[GradeGap], major: &str) -> Vec<String> {
    if gaps.is_empty() {
        return vec![
            format!("Your grades meet all requirements for {}!", major),
            "Continue maintaining your strong performance".to_string(),
        ];
    }
    gaps.iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|g| format!("Focus on {} (need to improve by {:.1} points)", g.subject, g.gap))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::tools::context::tests::test_context;

    #[tokio::test]
    async fn test_without_major_recommends_weakest() {
        let (mock, ctx) = test_context();
        let result = AnalyzeGradesTool
            .execute(
                json!({"student_grades": {"Math": 11, "Physics": "12,5", "History": 18, "PE": null}}),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result["analysis"]["strengths"], json!(["History"]));
        assert_eq!(result["analysis"]["weaknesses"], json!(["Math", "Physics"]));
        assert_eq!(result["analysis"]["gpa"], 13.83);
        assert_eq!(
            result["recommendations"],
            json!(["Consider strengthening Math", "Consider strengthening Physics"])
        );
        assert!(result.get("gaps").is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_gap_analysis_with_llm_recommendations() {
        let (mock, ctx) = test_context();
        mock.push_structured(json!({
            "overall_readiness": "needs_improvement",
            "analysis": [
                {"subject": "Math (Matemática A, 12th grade final exam)", "recommendation": "x".repeat(200)},
                {"subject": "Physics", "recommendation": "Practise mechanics problems weekly"}
            ],
            "summary": "You are close."
        }));

        let result = AnalyzeGradesTool
            .execute(
                json!({
                    "student_grades": {"Matemática": 13, "Física": 15, "Português": 14},
                    "major_name": "engenharia informática"
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result["major"], "Computer Science");
        assert_eq!(result["readiness"], "needs_improvement");
        let gaps = result["gaps"].as_array().unwrap();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0]["subject"], "Math");
        assert_eq!(gaps[0]["gap"], 3.0);
        assert_eq!(gaps[0]["severity"], "significant");

        let recommendations = result["recommendations"].as_array().unwrap();
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0].as_str().unwrap().chars().count(), 153);
        assert_eq!(result["llm_analysis"]["analysis"][0]["subject"], "Math");
        assert_eq!(result["summary"], "You are close.");

        let request = &mock.requests()[0];
        assert_eq!(request.temperature, Some(0.3));
        assert!(request.last_user_text().unwrap().contains("readiness for Computer Science"));
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_gap_list() {
        let (mock, ctx) = test_context();
        mock.push_error(LlmError::InvalidResponse("offline".to_string()));

        let result = AnalyzeGradesTool
            .execute(
                json!({"student_grades": {"Biology": 15, "Chemistry": 16, "Math": 14}, "major_name": "Medicine"}),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(
            result["recommendations"],
            json!([
                "Focus on Biology (need to improve by 3.0 points)",
                "Focus on Math (need to improve by 3.0 points)",
                "Focus on Portuguese (need to improve by 4.0 points)"
            ])
        );
        assert_eq!(result["readiness"], "significant_gaps");
    }

    #[tokio::test]
    async fn test_all_requirements_met_fallback() {
        let (mock, ctx) = test_context();
        mock.push_error(LlmError::InvalidResponse("offline".to_string()));

        let result = AnalyzeGradesTool
            .execute(
                json!({"student_grades": {"Portuguese": 17, "History": 16, "Philosophy": 15}, "major_name": "Law"}),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result["readiness"], "ready");
        assert_eq!(result["recommendations"][0], "Your grades meet all requirements for Law!");
    }

    #[tokio::test]
    async fn test_unknown_major() {
        let (mock, ctx) = test_context();
        let result = AnalyzeGradesTool
            .execute(json!({"student_grades": {"Math": 15}, "major_name": "Astrology"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result["readiness"], "unknown");
        assert_eq!(result["gaps"], json!([]));
        assert_eq!(result["recommendations"][0], "Could not find requirement data for Astrology");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_empty_or_out_of_range() {
        let (_, ctx) = test_context();

        let err = AnalyzeGradesTool
            .execute(json!({"student_grades": {"Math": "abc"}}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));

        let err = AnalyzeGradesTool
            .execute(json!({"student_grades": {"Math": 25}}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Service(Ready4UniError::InvalidInput(_))));
    }
}
