//! Domain services behind the agent tools
//!
//! `matching` and `grades` are pure functions over the catalog. `transcript`
//! and `resources` go through the LLM gateway.

pub mod grades;
pub mod matching;
pub mod resources;
pub mod transcript;

pub use grades::{
    GradeGap, GradeQuality, GradingScale, GapSummary, Readiness, Severity, TranscriptAnalysis, analyze_transcript,
    compare_grades_to_requirements, identify_grade_gaps,
};
pub use matching::{MajorMatch, match_interests_to_majors};
pub use resources::{StudyPlan, StudyResource, create_study_plan, fallback_resources, recommend_study_resources};
pub use transcript::{ParsedTranscript, StudentInfo, parse_transcript_text};
