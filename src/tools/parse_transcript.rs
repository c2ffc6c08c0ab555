//! parse_transcript tool - grades from an uploaded transcript PDF

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, parse_input};
use crate::pdf;
use crate::services::{ParsedTranscript, parse_transcript_text};

pub struct ParseTranscriptTool;

#[derive(Debug, Deserialize)]
struct Input {
    file_path: String,
}

#[async_trait]
impl Tool for ParseTranscriptTool {
    fn name(&self) -> &'static str {
        "parse_transcript"
    }

    fn description(&self) -> &'static str {
        "Extracts and parses grade information from an uploaded high school transcript PDF. \
         Returns structured grade data for all subjects."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the uploaded PDF file. MUST be a path listed under Uploaded files."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let input: Input = parse_input(input)?;
        let upload = ctx.resolve_upload(&input.file_path)?;
        log::info!("Parsing transcript: {}", upload.path.display());

        if let Some(parsed) = ctx.cached_transcript(&upload.sha256).await {
            log::debug!("Transcript cache hit for {}", upload.name);
            return Ok(transcript_json(&parsed, &upload.name, true));
        }

        let text = pdf::extract_text(&upload.path).await?;
        let parsed = parse_transcript_text(&ctx.llm, &ctx.prompts, &text).await?;
        ctx.cache_transcript(&upload.sha256, parsed.clone()).await;

        Ok(transcript_json(&parsed, &upload.name, false))
    }
}

fn transcript_json(parsed: &ParsedTranscript, file: &str, cached: bool) -> Value {
    json!({
        "file": file,
        "grades": parsed.grades,
        "student_info": parsed.student_info,
        "gpa": parsed.gpa,
        "confidence": parsed.confidence,
        "dropped": parsed.dropped,
        "raw_text": parsed.raw_text,
        "cached": cached,
    })
}
