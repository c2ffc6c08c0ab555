//! Study resource recommendations and study plans.
//!
//! Both operations always produce something: when the LLM fails the
//! resource list falls back to two generic free sources and the plan to a
//! fixed sentence.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::llm::LlmGateway;
use crate::prompt::{PromptRenderer, SYSTEM_PROMPT, Template, resource_schema};

pub const DEFAULT_LEVEL: &str = "high_school";
const DEFAULT_GOAL: &str = "improve understanding and grades";

const RESOURCE_TEMPERATURE: f32 = 0.7;
const PLAN_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyResource {
    pub name: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub language: String,
    #[serde(default = "default_free")]
    pub free: bool,
    pub description: String,
    /// How to find it; never a made-up URL
    pub search_hint: String,
}

fn default_free() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyPlan {
    pub subject: String,
    pub topic: Option<String>,
    pub resources: Vec<StudyResource>,
    pub plan: String,
    pub estimated_time: String,
    /// Resource names, free ones first
    pub priority_order: Vec<String>,
}

/// Two reliable free sources for any subject
pub fn fallback_resources(subject: &str) -> Vec<StudyResource> {
    log::warn!("Using fallback resources for {}", subject);
    vec![
        StudyResource {
            name: format!("Khan Academy: {}", subject),
            provider: "Khan Academy".to_string(),
            resource_type: "video_course".to_string(),
            language: "PT/EN".to_string(),
            free: true,
            description: "Comprehensive video lessons with practice exercises".to_string(),
            search_hint: format!("Visit pt.khanacademy.org and search for {}", subject),
        },
        StudyResource {
            name: format!("{} - YouTube Educational Channels", subject),
            provider: "YouTube".to_string(),
            resource_type: "video_course".to_string(),
            language: "PT".to_string(),
            free: true,
            description: "Various educational channels covering the topic".to_string(),
            search_hint: format!("Search YouTube for '{} aulas' or '{} explicação'", subject, subject),
        },
    ]
}

/// Ask the LLM for study resources; never fails.
pub async fn recommend_study_resources(
    llm: &LlmGateway,
    prompts: &PromptRenderer,
    subject: &str,
    topic: Option<&str>,
    level: &str,
    goal: Option<&str>,
) -> Vec<StudyResource> {
    log::info!("Generating resources for {}{}", subject, topic.map(|t| format!(" - {}", t)).unwrap_or_default());

    let context = json!({
        "subject": subject,
        "topic": topic.unwrap_or("general"),
        "level": level,
        "goal": goal.unwrap_or(DEFAULT_GOAL),
    });

    let prompt = match prompts.render_template(Template::Resources, &context) {
        Ok(prompt) => prompt,
        Err(e) => {
            log::error!("Resource prompt failed: {}", e);
            return fallback_resources(subject);
        }
    };

    let output = match llm.structured(&prompt, &resource_schema(), RESOURCE_TEMPERATURE).await {
        Ok(output) => output,
        Err(e) => {
            log::error!("Resource generation failed: {}", e);
            return fallback_resources(subject);
        }
    };

    let resources: Vec<StudyResource> = output
        .get("resources")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| match serde_json::from_value::<StudyResource>(item.clone()) {
            Ok(resource) => Some(resource),
            Err(_) => {
                log::warn!(
                    "Skipping incomplete resource: {}",
                    item.get("name").and_then(Value::as_str).unwrap_or("Unknown")
                );
                None
            }
        })
        .collect();

    if resources.is_empty() {
        return fallback_resources(subject);
    }

    log::info!("Generated {} resource recommendations", resources.len());
    resources
}

/// Resources, a short narrative plan and a time estimate for closing a grade gap.
pub async fn create_study_plan(
    llm: &LlmGateway,
    prompts: &PromptRenderer,
    subject: &str,
    topic: Option<&str>,
    current_grade: Option<f64>,
    target_grade: Option<f64>,
    hours_per_week: Option<u32>,
) -> StudyPlan {
    log::info!("Creating study plan for {}", subject);

    let gap = match (current_grade, target_grade) {
        (Some(current), Some(target)) => Some((current, target, target - current)),
        _ => None,
    };

    let (level, goal) = match gap {
        Some((current, _, gap)) if gap <= 1.0 => (
            "university_prep",
            format!("maintain and refine knowledge (currently {}/20)", fmt_grade(current)),
        ),
        Some((current, target, gap)) if gap <= 3.0 => (
            "high_school",
            format!("improve from {}/20 to {}/20", fmt_grade(current), fmt_grade(target)),
        ),
        Some((current, target, _)) => (
            "beginner",
            format!(
                "build foundations to improve from {}/20 to {}/20",
                fmt_grade(current),
                fmt_grade(target)
            ),
        ),
        None => (DEFAULT_LEVEL, DEFAULT_GOAL.to_string()),
    };

    let resources = recommend_study_resources(llm, prompts, subject, topic, level, Some(&goal)).await;

    let time = hours_per_week
        .map(|h| format!("{} hours/week", h))
        .unwrap_or_else(|| "flexible schedule".to_string());
    let context = json!({
        "goal": goal,
        "subject": subject,
        "topic": topic,
        "time": time,
        "resource_count": resources.len(),
    });

    let plan = match prompts.render_template(Template::StudyPlan, &context) {
        Ok(prompt) => llm.text(SYSTEM_PROMPT, &prompt, PLAN_TEMPERATURE).await.ok(),
        Err(e) => {
            log::error!("Study plan prompt failed: {}", e);
            None
        }
    }
    .unwrap_or_else(|| {
        format!(
            "Start with foundational {} concepts, practice regularly with exercises, and gradually work through more advanced material. Consistency is key!",
            topic.unwrap_or(subject)
        )
    });

    let estimated_time = match gap {
        Some((_, _, gap)) if gap <= 1.0 => "2-4 weeks with regular practice",
        Some((_, _, gap)) if gap <= 3.0 => "2-3 months with 1 hour/day",
        Some(_) => "4-6 months with consistent effort",
        None => "2-3 months with regular practice",
    }
    .to_string();

    let mut ordered: Vec<&StudyResource> = resources.iter().collect();
    ordered.sort_by(|a, b| (!a.free, &a.resource_type).cmp(&(!b.free, &b.resource_type)));
    let priority_order = ordered.iter().map(|r| r.name.clone()).collect();

    StudyPlan {
        subject: subject.to_string(),
        topic: topic.map(str::to_string),
        resources,
        plan,
        estimated_time,
        priority_order,
    }
}

/// 13.0 -> "13", 13.5 -> "13.5"
fn fmt_grade(grade: f64) -> String {
    if grade.fract() == 0.0 {
        format!("{:.0}", grade)
    } else {
        format!("{}", grade)
    }
}
