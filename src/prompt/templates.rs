//! Built-in prompts and structured-output schemas.

use serde_json::{Value, json};

/// Persona shared by every free-form answer
pub const SYSTEM_PROMPT: &str = r#"You are Ready4Uni, a friendly university counselling assistant for secondary-school students choosing a university major.

Always answer in English, whatever language the student writes in.

What you can do:
1. Suggest majors from the student's interests, favourite subjects and career goals.
2. Read an uploaded transcript (PDF) and summarise academic strengths and weaknesses.
3. Compare grades with the typical entry requirements of a major.
4. Recommend study resources and build study plans for weak subjects.

Grades use the Portuguese 0-20 scale, where 10 is passing. You work from a curated database of common majors.

How to answer:
- Be encouraging and honest about gaps.
- Quote concrete numbers ("your Math grade of 13/20 is 3 points below the usual 16/20 for Computer Science").
- Say whether information comes from the curated database or general knowledge.
- Explain why a major fits instead of only listing names.
- Prefer free or affordable resources.
- The decision belongs to the student; help them reason about it."#;

/// Named built-in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Router,
    Greeting,
    ToolDecision,
    Synthesis,
    TranscriptExtraction,
    GapAnalysis,
    Resources,
    StudyPlan,
}

impl Template {
    pub const ALL: [Template; 8] = [
        Template::Router,
        Template::Greeting,
        Template::ToolDecision,
        Template::Synthesis,
        Template::TranscriptExtraction,
        Template::GapAnalysis,
        Template::Resources,
        Template::StudyPlan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Template::Router => "router",
            Template::Greeting => "greeting",
            Template::ToolDecision => "tool_decision",
            Template::Synthesis => "synthesis",
            Template::TranscriptExtraction => "transcript_extraction",
            Template::GapAnalysis => "gap_analysis",
            Template::Resources => "resources",
            Template::StudyPlan => "study_plan",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Template::Router => ROUTER,
            Template::Greeting => GREETING,
            Template::ToolDecision => TOOL_DECISION,
            Template::Synthesis => SYNTHESIS,
            Template::TranscriptExtraction => TRANSCRIPT_EXTRACTION,
            Template::GapAnalysis => GAP_ANALYSIS,
            Template::Resources => RESOURCES,
            Template::StudyPlan => STUDY_PLAN,
        }
    }
}

const ROUTER: &str = r#"Classify the student's message into exactly one intent:

- major_discovery: wants to find majors that fit their interests ("I love math and physics, what should I study?")
- transcript_analysis: wants their uploaded grades or transcript looked at ("Can you look at my report card?")
- gap_analysis: asks whether their grades are enough for a specific major ("Are my grades good enough for Medicine?")
- resource_request: wants study material or ways to improve ("How can I get better at calculus?")
- general_question: anything else about universities, majors, admissions or careers
- greeting_or_chitchat: greetings, thanks, small talk

Use the conversation history: right after an upload, "analyse this" means transcript_analysis. When several intents appear, pick the explicit one. When unsure, use general_question.

Also extract any major mentioned, school subjects, interests, and whether the student refers to their own grades or transcript.

{{#if history}}Recent conversation:
{{#each history}}{{this.role}}: {{this.content}}
{{/each}}
{{/if}}{{#if files}}Uploaded files: {{#each files}}{{#if @index}}, {{/if}}{{this.name}} (at {{this.path}}){{/each}}

{{/if}}{{#unless history}}{{#unless files}}No previous context.

{{/unless}}{{/unless}}Current message:
"{{message}}""#;

const GREETING: &str = r#"The student said: "{{message}}"

Reply warmly and briefly. If it is a greeting, introduce yourself as Ready4Uni and mention that you can:
- find university majors that match their interests
- analyse a transcript and check readiness for a major
- recommend study resources"#;

const TOOL_DECISION: &str = r#"Intent: {{intent}}
Student message: "{{message}}"
Plan:
{{plan}}
{{#if results}}
Tools already called:
{{#each results}}- {{#if this.success}}ok{{else}}failed{{/if}} {{this.tool}}: {{this.summary}}
{{/each}}{{/if}}
{{#if files}}Uploaded files: {{#each files}}{{#if @index}}, {{/if}}{{this.name}} (at {{this.path}}){{/each}}
{{else}}No files have been uploaded.
{{/if}}
Decide which tool, if any, to call next.

- If you already have enough information to answer, call no tool.
- Call parse_transcript only with a path listed under "Uploaded files". Never invent a file name.
- Use get_major_info for details about a named major and search_major_database when the name is uncertain.
- Use analyze_grades to compare grades with a major's requirements.
- Use get_major_suggestions to propose majors from interests.
- Use find_study_resources or create_personalized_study_plan for study help."#;

const SYNTHESIS: &str = r#"Student's question: "{{message}}"
Intent: {{intent}}
{{#if results}}
Information gathered:
{{#each results}}
{{#if this.success}}{{this.tool}}:
```
{{this.output}}
```
{{else}}{{this.tool}} failed: {{this.error}}
{{/if}}{{/each}}{{/if}}
Write the reply to the student using the information above.

- Be encouraging and supportive.
- Use the concrete data: grades, majors, requirements.
- Present gaps as things to work on and give next steps.
- Use bullet points when listing several items.
- If a tool failed, work around it without mentioning technical errors."#;

const TRANSCRIPT_EXTRACTION: &str = r#"Extract the grades from this Portuguese secondary-school transcript.

Transcript text:
{{text}}

- Extract every subject grade on the 0-20 scale. "13/20" or "15 valores" means the number.
- Common subject names: Matemática (Math), Física (Physics), Português (Portuguese), Química (Chemistry), Biologia (Biology), História (History), Geografia (Geography), Inglês (English), Filosofia (Philosophy), Educação Física (PE).
- Record the student's name, school and academic year when present.
- Set parsing_confidence to high when the text is clear, medium with some ambiguity, low when it is hard to read."#;

const GAP_ANALYSIS: &str = r#"Assess a student's readiness for {{major_name}}.

Student grades (0-20):
{{student_grades}}

Typical entry requirements for {{major_name}}:
{{major_requirements}}

For each required subject compute gap = required - student and classify it: meets_requirement when the student is at or above the requirement, close when 1-2 points below, significant_gap when 3 or more below. Give a short study recommendation per subject, list strengths and the subjects to prioritise, and finish with an encouraging, honest summary. Subject names must be the bare subject (e.g. "Math")."#;

const RESOURCES: &str = r#"Recommend study resources for a secondary-school student in Portugal.

Subject: {{subject}}
Topic: {{topic}}
Level: {{level}}
Goal: {{goal}}

- Recommend 3 to 5 resources, favouring free ones.
- Include Portuguese-language resources when they exist and say when something is English-only.
- Good sources: Khan Academy (has Portuguese content), YouTube educational channels, Coursera, edX, interactive practice sites.
- Do not invent URLs; give a search hint instead.
- Explain why each resource helps."#;

const STUDY_PLAN: &str = r#"Write a short study plan for a student who wants to {{goal}} in {{subject}}{{#if topic}} (specifically {{topic}}){{/if}}.

Available time: {{time}}
Resources available: {{resource_count}} curated resources

In 3-4 sentences cover where to start, how to progress through the topics, how to practise and a realistic timeline. Keep it encouraging and actionable."#;

/// Schema for intent classification output
pub fn intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "intent": {
                "type": "string",
                "enum": [
                    "major_discovery",
                    "transcript_analysis",
                    "gap_analysis",
                    "resource_request",
                    "general_question",
                    "greeting_or_chitchat"
                ],
                "description": "The primary intent of the message"
            },
            "confidence": {"type": "number", "description": "Confidence between 0.0 and 1.0"},
            "reasoning": {"type": "string", "description": "One sentence explaining the choice"},
            "extracted_entities": {
                "type": "object",
                "properties": {
                    "major_mentioned": {"type": "string"},
                    "subjects_mentioned": {"type": "array", "items": {"type": "string"}},
                    "interests": {"type": "array", "items": {"type": "string"}},
                    "has_transcript_reference": {"type": "boolean"}
                }
            }
        },
        "required": ["intent", "confidence", "reasoning"]
    })
}

/// Schema for transcript extraction output
pub fn transcript_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "student_name": {"type": "string"},
            "school": {"type": "string"},
            "academic_year": {"type": "string"},
            "grades": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "subject": {"type": "string"},
                        "grade": {"type": "number"}
                    },
                    "required": ["subject", "grade"]
                }
            },
            "gpa": {"type": "number"},
            "parsing_confidence": {"type": "string", "enum": ["high", "medium", "low"]},
            "notes": {"type": "string"}
        },
        "required": ["grades"]
    })
}

/// Schema for the LLM-written gap recommendations
pub fn gap_analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overall_readiness": {
                "type": "string",
                "enum": ["ready", "mostly_ready", "needs_improvement", "significant_gaps"]
            },
            "analysis": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "subject": {"type": "string", "description": "Bare subject name, at most 30 characters"},
                        "student_grade": {"type": "number"},
                        "required_grade": {"type": "number"},
                        "gap": {"type": "number"},
                        "status": {"type": "string", "enum": ["meets_requirement", "close", "significant_gap"]},
                        "recommendation": {"type": "string", "description": "At most 100 characters"}
                    }
                }
            },
            "strengths": {"type": "array", "items": {"type": "string"}},
            "priority_subjects": {"type": "array", "items": {"type": "string"}},
            "summary": {"type": "string"}
        },
        "required": ["overall_readiness", "analysis", "summary"]
    })
}

/// Schema for study resource recommendations
pub fn resource_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "subject": {"type": "string"},
            "resources": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["video_course", "online_course", "practice_platform", "textbook", "youtube_channel"]
                        },
                        "name": {"type": "string"},
                        "provider": {"type": "string"},
                        "language": {"type": "string"},
                        "free": {"type": "boolean"},
                        "description": {"type": "string"},
                        "search_hint": {"type": "string"}
                    },
                    "required": ["type", "name", "provider", "language", "description", "search_hint"]
                }
            },
            "study_plan": {"type": "string"},
            "estimated_time": {"type": "string"}
        },
        "required": ["subject", "resources"]
    })
}
