//! Prompt System - Built-in prompt templates and their rendering
//!
//! Templates use Handlebars syntax and are compiled once into a
//! `PromptRenderer`. JSON schemas for structured output live alongside them.

mod render;
mod templates;

pub use render::PromptRenderer;
pub use templates::{
    SYSTEM_PROMPT, Template, gap_analysis_schema, intent_schema, resource_schema, transcript_schema,
};
