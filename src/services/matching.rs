//! Interest-to-major matching
//!
//! Scores every major against what the student said they like. Weights:
//! interests 0.4, favourite subjects 0.3, career goal 0.3, plus up to 0.1 for
//! interests mentioned in the description.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::subjects::normalize_subject_name;
use crate::catalog::{Major, MajorCatalog};

pub const DEFAULT_TOP_N: usize = 5;

const INTEREST_WEIGHT: f64 = 0.4;
const SUBJECT_WEIGHT: f64 = 0.3;
const CAREER_WEIGHT: f64 = 0.3;
const DESCRIPTION_WEIGHT: f64 = 0.1;

/// A scored major
#[derive(Debug, Clone, Serialize)]
pub struct MajorMatch<'a> {
    pub major: &'a Major,
    pub score: f64,
    pub reasons: Vec<String>,
    pub matching_keywords: BTreeSet<String>,
}

/// Rank majors for a student's interests, favourite subjects and career goal.
///
/// Only majors with a positive score are returned, best first; ties keep
/// dataset order.
pub fn match_interests_to_majors<'a>(
    catalog: &'a MajorCatalog,
    interests: &[String],
    favorite_subjects: &[String],
    career_goals: Option<&str>,
    top_n: usize,
) -> Vec<MajorMatch<'a>> {
    let interests: Vec<String> = interests.iter().map(|i| i.trim().to_lowercase()).collect();
    let interest_set: BTreeSet<&str> = interests.iter().map(String::as_str).collect();

    let mut subjects: BTreeSet<String> = BTreeSet::new();
    for subject in favorite_subjects {
        subjects.insert(subject.trim().to_lowercase());
        subjects.insert(normalize_subject_name(subject));
    }

    let career = career_goals.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty());

    let mut matches: Vec<MajorMatch<'a>> = catalog
        .majors()
        .iter()
        .filter_map(|major| {
            let mut score = 0.0;
            let mut reasons = Vec::new();
            let mut matching_keywords = BTreeSet::new();

            let keywords: BTreeSet<String> = major.keywords.iter().map(|k| k.to_lowercase()).collect();
            let interest_hits: BTreeSet<String> = interest_set
                .iter()
                .filter(|i| keywords.contains(**i))
                .map(|i| i.to_string())
                .collect();
            if !interest_hits.is_empty() {
                score += INTEREST_WEIGHT * interest_hits.len() as f64 / interests.len().max(1) as f64;
                reasons.push(format!("Matches your interests: {}", join(&interest_hits)));
                matching_keywords.extend(interest_hits);
            }

            if !subjects.is_empty() && !major.requirements.is_empty() {
                let required: BTreeSet<String> = major.requirements.keys().map(|k| k.to_lowercase()).collect();
                let subject_hits: BTreeSet<String> = subjects.intersection(&required).cloned().collect();
                if !subject_hits.is_empty() {
                    score += SUBJECT_WEIGHT * subject_hits.len() as f64 / major.requirements.len() as f64;
                    reasons.push(format!("Aligns with your strong subjects: {}", join(&subject_hits)));
                    matching_keywords.extend(subject_hits);
                }
            }

            if let Some(career) = &career {
                let aligned = major.career_paths.iter().map(|p| p.to_lowercase()).any(|p| {
                    p.contains(career.as_str()) || career.contains(p.as_str())
                });
                if aligned {
                    score += CAREER_WEIGHT;
                    reasons.push("Matches your career goals".to_string());
                }
            }

            if !interests.is_empty() {
                let description = major.description.to_lowercase();
                let hits = interests.iter().filter(|i| !i.is_empty() && description.contains(i.as_str())).count();
                if hits > 0 {
                    score += DESCRIPTION_WEIGHT * (hits as f64 / interests.len() as f64).min(1.0);
                }
            }

            if score <= 0.0 {
                return None;
            }
            if reasons.is_empty() {
                reasons.push("General interest alignment".to_string());
            }

            Some(MajorMatch {
                major,
                score,
                reasons,
                matching_keywords,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    log::info!("Matched {} majors, returning top {}", matches.len(), top_n);
    matches.truncate(top_n);
    matches
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
