//! Transcript analysis and grade-gap scoring on the Portuguese 0-20 scale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::MajorCatalog;
use crate::catalog::subjects::find_matching_grade;
use crate::error::{Ready4UniError, Result};

/// Grade thresholds used across the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GradingScale {
    /// Lowest passing grade; also assumed for required subjects missing from a transcript.
    pub passing_grade: f64,

    /// Top of the scale.
    pub max_grade: f64,

    /// Grades at or above this count as strengths, below as weaknesses.
    pub strength_threshold: f64,
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            passing_grade: 10.0,
            max_grade: 20.0,
            strength_threshold: 14.0,
        }
    }
}

impl GradingScale {
    pub fn is_valid(&self, grade: f64) -> bool {
        (0.0..=self.max_grade).contains(&grade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeQuality {
    Excellent,
    Good,
    Adequate,
    NeedsImprovement,
}

impl GradeQuality {
    fn from_gpa(gpa: f64) -> Self {
        if gpa >= 17.0 {
            Self::Excellent
        } else if gpa >= 15.0 {
            Self::Good
        } else if gpa >= 12.0 {
            Self::Adequate
        } else {
            Self::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Meets,
    Close,
    Significant,
}

/// Overall readiness for a major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    MostlyReady,
    NeedsImprovement,
    SignificantGaps,
    Unknown,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::MostlyReady => "mostly_ready",
            Self::NeedsImprovement => "needs_improvement",
            Self::SignificantGaps => "significant_gaps",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary statistics for a set of grades
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptAnalysis {
    pub grades: BTreeMap<String, f64>,
    pub gpa: f64,
    pub strengths: Vec<String>,
    /// Weakest first.
    pub weaknesses: Vec<String>,
    pub passing_all: bool,
    pub overall_quality: GradeQuality,
}

/// One required subject compared against the student's grade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeGap {
    pub subject: String,
    pub student_grade: f64,
    pub required_grade: f64,
    /// required - student; positive means below requirement
    pub gap: f64,
    pub severity: Severity,
    /// 1 is most urgent, 4 means the requirement is met
    pub priority: u8,
    /// The subject was absent and the passing grade was assumed
    pub assumed: bool,
}

impl GradeGap {
    fn new(subject: &str, student_grade: f64, required_grade: f64, assumed: bool) -> Self {
        let gap = required_grade - student_grade;
        let severity = if gap <= 0.0 {
            Severity::Meets
        } else if gap <= 2.0 {
            Severity::Close
        } else {
            Severity::Significant
        };
        let priority = if gap > 4.0 {
            1
        } else if gap > 2.0 {
            2
        } else if gap > 0.0 {
            3
        } else {
            4
        };
        Self {
            subject: subject.to_string(),
            student_grade,
            required_grade,
            gap,
            severity,
            priority,
            assumed,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.gap > 0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GapEntry {
    pub subject: String,
    pub current: f64,
    pub required: f64,
    pub gap: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrengthEntry {
    pub subject: String,
    pub grade: f64,
    pub required: f64,
    pub excess: f64,
}

/// Gap report for one major
#[derive(Debug, Clone, Serialize)]
pub struct GapSummary {
    pub major: String,
    pub readiness: Readiness,
    pub total_gaps: usize,
    pub gaps: Vec<GapEntry>,
    pub strengths: Vec<StrengthEntry>,
    pub priority_subjects: Vec<String>,
}

/// GPA, strengths, weaknesses and overall quality of a transcript.
pub fn analyze_transcript(grades: &BTreeMap<String, f64>, scale: &GradingScale) -> Result<TranscriptAnalysis> {
    if grades.is_empty() {
        return Err(Ready4UniError::InvalidInput("No grades provided for analysis".to_string()));
    }

    if let Some((subject, grade)) = grades.iter().find(|(_, g)| !scale.is_valid(**g)) {
        return Err(Ready4UniError::InvalidInput(format!(
            "Invalid grade for {}: {} (must be 0-{})",
            subject, grade, scale.max_grade
        )));
    }

    let gpa = grades.values().sum::<f64>() / grades.len() as f64;

    let mut ranked: Vec<(&String, f64)> = grades.iter().map(|(s, g)| (s, *g)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let strengths = ranked
        .iter()
        .take(3)
        .filter(|(_, g)| *g >= scale.strength_threshold)
        .map(|(s, _)| s.to_string())
        .collect();
    let weaknesses = ranked
        .iter()
        .rev()
        .take(3)
        .filter(|(_, g)| *g < scale.strength_threshold)
        .map(|(s, _)| s.to_string())
        .collect();

    let passing_all = grades.values().all(|g| *g >= scale.passing_grade);
    let overall_quality = GradeQuality::from_gpa(gpa);

    log::info!("Transcript analysis: GPA {:.1}, {:?}", gpa, overall_quality);

    Ok(TranscriptAnalysis {
        grades: grades.clone(),
        gpa,
        strengths,
        weaknesses,
        passing_all,
        overall_quality,
    })
}

/// Compare a student's grades with a major's requirements.
///
/// The major is found by fuzzy name. A required subject missing from the
/// transcript is scored as the passing grade.
pub fn compare_grades_to_requirements(
    catalog: &MajorCatalog,
    grades: &BTreeMap<String, f64>,
    major_name: &str,
    scale: &GradingScale,
) -> Result<(Vec<GradeGap>, Readiness)> {
    let major = catalog
        .find_by_name(major_name, true)
        .ok_or_else(|| Ready4UniError::MajorNotFound(format!("'{}' is not in the database", major_name)))?;

    if major.requirements.is_empty() {
        return Err(Ready4UniError::Catalog(format!("No requirements data for major '{}'", major.name)));
    }

    let gaps: Vec<GradeGap> = major
        .requirements
        .iter()
        .map(|(subject, required)| match find_matching_grade(grades, subject) {
            Some(grade) => GradeGap::new(subject, grade, *required, false),
            None => {
                log::warn!("Subject '{}' required but not in transcript", subject);
                GradeGap::new(subject, scale.passing_grade, *required, true)
            }
        })
        .collect();

    let readiness = readiness_for(&gaps);
    log::info!(
        "Gap analysis for {}: {}, {} gaps",
        major.name,
        readiness,
        gaps.iter().filter(|g| g.is_gap()).count()
    );

    Ok((gaps, readiness))
}

fn readiness_for(gaps: &[GradeGap]) -> Readiness {
    let actual: Vec<&GradeGap> = gaps.iter().filter(|g| g.is_gap()).collect();
    if actual.is_empty() {
        return Readiness::Ready;
    }
    if actual.iter().all(|g| g.severity == Severity::Close) {
        return Readiness::MostlyReady;
    }
    let significant = actual.iter().filter(|g| g.severity == Severity::Significant).count();
    if significant >= 2 {
        Readiness::SignificantGaps
    } else {
        Readiness::NeedsImprovement
    }
}

/// Gap report with gaps ordered by priority and the top three subjects to work on.
pub fn identify_grade_gaps(
    catalog: &MajorCatalog,
    grades: &BTreeMap<String, f64>,
    major_name: &str,
    scale: &GradingScale,
) -> Result<GapSummary> {
    let (gaps, readiness) = compare_grades_to_requirements(catalog, grades, major_name, scale)?;
    let major = catalog
        .find_by_name(major_name, true)
        .map(|m| m.name.clone())
        .unwrap_or_else(|| major_name.to_string());

    let (mut actual, meeting): (Vec<GradeGap>, Vec<GradeGap>) = gaps.into_iter().partition(GradeGap::is_gap);
    actual.sort_by_key(|g| g.priority);

    Ok(GapSummary {
        major,
        readiness,
        total_gaps: actual.len(),
        priority_subjects: actual.iter().take(3).map(|g| g.subject.clone()).collect(),
        gaps: actual
            .iter()
            .map(|g| GapEntry {
                subject: g.subject.clone(),
                current: g.student_grade,
                required: g.required_grade,
                gap: g.gap,
                severity: g.severity,
            })
            .collect(),
        strengths: meeting
            .iter()
            .map(|g| StrengthEntry {
                subject: g.subject.clone(),
                grade: g.student_grade,
                required: g.required_grade,
                excess: -g.gap,
            })
            .collect(),
    })
}
