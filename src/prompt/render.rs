//! Prompt Renderer - Render templates with context variables using Handlebars
//!
//! The built-in templates from `templates.rs` are registered by name so the
//! agent and services render them without re-parsing every call.

use std::collections::HashMap;

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

use super::templates::Template;
use crate::error::{Ready4UniError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PromptRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRenderer")
            .field("templates", &self.handlebars.get_templates().len())
            .finish()
    }
}

impl PromptRenderer {
    /// Create an empty renderer
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Missing variables render as empty strings
        handlebars.set_strict_mode(false);
        // Prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Renderer with every built-in template registered
    pub fn builtin() -> Result<Self> {
        let mut renderer = Self::new();
        for template in Template::ALL {
            renderer.register_template(template.name(), template.source())?;
        }
        Ok(renderer)
    }

    /// Render a template string with string variables
    pub fn render(&self, template: &str, context: &HashMap<String, String>) -> Result<String> {
        self.render_with(template, context)
    }

    /// Render a template string with a JSON context
    pub fn render_json(&self, template: &str, context: &Value) -> Result<String> {
        self.render_with(template, context)
    }

    /// Render a template string with any serializable context
    pub fn render_with<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| Ready4UniError::Prompt(format!("Failed to render template: {}", e)))
    }

    /// Register a named template for later use
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| Ready4UniError::Prompt(format!("Failed to register template '{}': {}", name, e)))
    }

    /// Render a previously registered template
    pub fn render_named<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| Ready4UniError::Prompt(format!("Failed to render template '{}': {}", name, e)))
    }

    /// Render one of the built-in templates
    pub fn render_template<T: Serialize>(&self, template: Template, context: &T) -> Result<String> {
        self.render_named(template.name(), context)
    }

    /// Check if a named template is registered
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.get_template(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_renderer_is_empty() {
        let renderer = PromptRenderer::new();
        assert!(!renderer.has_template("router"));
    }

    #[test]
    fn test_builtin_registers_all_templates() {
        let renderer = PromptRenderer::builtin().unwrap();
        for template in Template::ALL {
            assert!(renderer.has_template(template.name()), "{} missing", template.name());
        }
    }

    #[test]
    fn test_render_simple() {
        let renderer = PromptRenderer::new();
        let mut context = HashMap::new();
        context.insert("name".to_string(), "World".to_string());

        let result = renderer.render("Hello, {{name}}!", &context).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_render_missing_variable_empty_string() {
        let renderer = PromptRenderer::new();
        let context: HashMap<String, String> = HashMap::new();

        let result = renderer.render("Hello, {{name}}!", &context).unwrap();
        assert_eq!(result, "Hello, !");
    }

    #[test]
    fn test_render_does_not_escape() {
        let renderer = PromptRenderer::new();
        let result = renderer
            .render_json("Grades: {{grades}}", &json!({"grades": "{\"Math\": 13} & <Physics>"}))
            .unwrap();
        assert_eq!(result, "Grades: {\"Math\": 13} & <Physics>");
    }

    #[test]
    fn test_render_with_serializable() {
        #[derive(Serialize)]
        struct Context {
            subject: String,
            hours: u32,
        }

        let renderer = PromptRenderer::new();
        let context = Context {
            subject: "Math".to_string(),
            hours: 5,
        };

        let result = renderer.render_with("{{subject}} for {{hours}}h", &context).unwrap();
        assert_eq!(result, "Math for 5h");
    }

    #[test]
    fn test_render_named_not_found() {
        let renderer = PromptRenderer::new();
        assert!(renderer.render_named("nonexistent", &json!({})).is_err());
    }

    #[test]
    fn test_register_invalid_template() {
        let mut renderer = PromptRenderer::new();
        assert!(renderer.register_template("broken", "{{#each items}}").is_err());
    }

    #[test]
    fn test_render_router_template() {
        let renderer = PromptRenderer::builtin().unwrap();
        let prompt = renderer
            .render_template(
                Template::Router,
                &json!({
                    "history": [{"role": "User", "content": "I like math"}],
                    "files": [{"name": "grades.pdf", "path": "/tmp/grades.pdf"}],
                    "message": "Am I ready for Computer Science?"
                }),
            )
            .unwrap();

        assert!(prompt.contains("User: I like math"));
        assert!(prompt.contains("grades.pdf (at /tmp/grades.pdf)"));
        assert!(prompt.contains("\"Am I ready for Computer Science?\""));
    }

    #[test]
    fn test_render_router_template_without_context() {
        let renderer = PromptRenderer::builtin().unwrap();
        let prompt = renderer
            .render_template(Template::Router, &json!({"history": [], "files": [], "message": "hi"}))
            .unwrap();
        assert!(prompt.contains("No previous context."));
    }
}
