//! Turning transcript text into a grade map with the LLM.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{Ready4UniError, Result};
use crate::llm::LlmGateway;
use crate::prompt::{PromptRenderer, Template, transcript_schema};

/// Minimum amount of text, after trimming, worth sending to the LLM
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

const EXTRACTION_TEMPERATURE: f32 = 0.1;
const RAW_TEXT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentInfo {
    pub name: Option<String>,
    pub school: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedTranscript {
    pub grades: BTreeMap<String, f64>,
    pub student_info: StudentInfo,
    /// Average as printed on the transcript, if any
    pub gpa: Option<f64>,
    /// high, medium or low
    pub confidence: String,
    /// Leading slice of the source text
    pub raw_text: String,
    /// Subjects whose extracted grade was outside 0-20
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

/// Extract grades and student details from transcript text.
pub async fn parse_transcript_text(llm: &LlmGateway, prompts: &PromptRenderer, text: &str) -> Result<ParsedTranscript> {
    if text.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
        return Err(Ready4UniError::Transcript("PDF appears to be empty or unreadable".to_string()));
    }

    log::debug!("Parsing {} characters of transcript text", text.len());

    let prompt = prompts.render_template(Template::TranscriptExtraction, &json!({ "text": text }))?;
    let parsed = llm
        .structured(&prompt, &transcript_schema(), EXTRACTION_TEMPERATURE)
        .await?;

    let mut grades = BTreeMap::new();
    let mut dropped = Vec::new();
    for item in parsed.get("grades").and_then(Value::as_array).into_iter().flatten() {
        let Some(subject) = item.get("subject").and_then(Value::as_str).map(str::trim) else {
            continue;
        };
        let Some(grade) = item.get("grade").and_then(grade_value) else {
            continue;
        };
        if subject.is_empty() {
            continue;
        }
        if (0.0..=20.0).contains(&grade) {
            grades.insert(subject.to_string(), grade);
        } else {
            log::warn!("Dropping out-of-range grade for {}: {}", subject, grade);
            dropped.push(subject.to_string());
        }
    }

    if grades.is_empty() {
        return Err(Ready4UniError::Transcript("No grades found in the transcript".to_string()));
    }

    let confidence = parsed
        .get("parsing_confidence")
        .and_then(Value::as_str)
        .unwrap_or("medium")
        .to_string();

    log::info!("Parsed {} grades with {} confidence", grades.len(), confidence);

    Ok(ParsedTranscript {
        grades,
        student_info: StudentInfo {
            name: string_field(&parsed, "student_name"),
            school: string_field(&parsed, "school"),
            year: string_field(&parsed, "academic_year"),
        },
        gpa: parsed.get("gpa").and_then(Value::as_f64),
        confidence,
        raw_text: text.chars().take(RAW_TEXT_PREVIEW_CHARS).collect(),
        dropped,
    })
}

/// A grade given as a number or as text such as "14,5"
pub(crate) fn grade_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
