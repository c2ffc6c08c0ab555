//! Subject name normalization
//!
//! Transcripts use Portuguese subject names ("Matemática A", "Física e
//! Química A") while major requirements use English ("Math", "Physics").
//! Everything is compared through a lowercase canonical key.

use std::collections::BTreeMap;

const SUBJECT_ALIASES: &[(&str, &str)] = &[
    ("matematica", "math"),
    ("matemática", "math"),
    ("matemática a", "math"),
    ("matematica a", "math"),
    ("mat a", "math"),
    ("mathematics", "math"),
    ("maths", "math"),
    ("fisica", "physics"),
    ("física", "physics"),
    ("fisica e quimica", "physics"),
    ("física e química", "physics"),
    ("física e química a", "physics"),
    ("fisica e quimica a", "physics"),
    ("fis quim a", "physics"),
    ("portugues", "portuguese"),
    ("português", "portuguese"),
    ("port", "portuguese"),
    ("ingles", "english"),
    ("inglês", "english"),
    ("ing", "english"),
    ("biologia", "biology"),
    ("biologia e geologia", "biology"),
    ("bio geo", "biology"),
    ("geologia", "geology"),
    ("historia", "history"),
    ("história", "history"),
    ("história a", "history"),
    ("historia a", "history"),
    ("geografia", "geography"),
    ("geografia a", "geography"),
    ("filosofia", "philosophy"),
    ("filos", "philosophy"),
    ("economia", "economics"),
    ("economia a", "economics"),
    ("quimica", "chemistry"),
    ("química", "chemistry"),
];

/// Canonical lowercase key for a subject name.
///
/// Known Portuguese names map to their English equivalent; anything else is
/// returned lowercased and trimmed.
pub fn normalize_subject_name(subject: &str) -> String {
    let key = subject.trim().to_lowercase();
    SUBJECT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(key)
}

/// Copy of `grades` that keeps every original key and adds the canonical key
/// alongside it when they differ.
pub fn normalize_grade_map(grades: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut normalized = grades.clone();
    for (subject, grade) in grades {
        let canonical = normalize_subject_name(subject);
        if &canonical != subject {
            normalized.entry(canonical).or_insert(*grade);
        }
    }
    normalized
}

/// Find the student's grade for `target_subject`.
///
/// Compares canonical names first, then falls back to an exact key lookup.
pub fn find_matching_grade(grades: &BTreeMap<String, f64>, target_subject: &str) -> Option<f64> {
    let target = normalize_subject_name(target_subject);
    grades
        .iter()
        .find(|(subject, _)| normalize_subject_name(subject) == target)
        .map(|(_, grade)| *grade)
        .or_else(|| grades.get(target_subject).copied())
}
