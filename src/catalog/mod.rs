//! Majors catalog - the static dataset every deterministic tool runs against
//!
//! The bundled `data/majors.json` is compiled into the binary; a different
//! file can be supplied through `data.majors-path`.

pub mod subjects;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DataConfig;
use crate::error::{Ready4UniError, Result};

const BUNDLED_MAJORS: &str = include_str!("../../data/majors.json");

const REQUIRED_FIELDS: [&str; 4] = ["id", "name", "description", "requirements"];

/// One university major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Major {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pt: Option<String>,
    pub description: String,
    /// Typical minimum entry grade per subject on the 0-20 scale
    pub requirements: BTreeMap<String, f64>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub career_paths: Vec<String>,
    #[serde(default)]
    pub universities: Vec<String>,
}

impl Major {
    fn keyword_set(&self) -> HashSet<String> {
        self.keywords.iter().map(|k| k.to_lowercase()).collect()
    }

    fn names_lowercase(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.name.to_lowercase()).chain(self.name_pt.iter().map(|n| n.to_lowercase()))
    }
}

/// Validated, ordered list of majors
#[derive(Debug, Clone)]
pub struct MajorCatalog {
    majors: Vec<Major>,
}

impl MajorCatalog {
    /// The dataset shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_MAJORS)
    }

    /// Load the configured dataset, falling back to the bundled one
    pub fn from_config(data: &DataConfig) -> Result<Self> {
        match &data.majors_path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Ready4UniError::Catalog(format!("Majors data file not readable at {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&content)?;
        log::info!("Loaded {} majors from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content)
            .map_err(|e| Ready4UniError::Catalog(format!("Invalid JSON in majors data: {}", e)))?;

        let entries = raw
            .as_array()
            .ok_or_else(|| Ready4UniError::Catalog("majors data must contain a list of major objects".to_string()))?;

        if entries.is_empty() {
            return Err(Ready4UniError::Catalog("majors data is empty".to_string()));
        }

        let mut majors = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let missing: Vec<&str> = REQUIRED_FIELDS
                .iter()
                .copied()
                .filter(|field| entry.get(field).is_none())
                .collect();
            if !missing.is_empty() {
                return Err(Ready4UniError::Catalog(format!(
                    "Major at index {} is missing required fields: {:?}",
                    idx, missing
                )));
            }

            let major: Major = serde_json::from_value(entry.clone())
                .map_err(|e| Ready4UniError::Catalog(format!("Major at index {} is malformed: {}", idx, e)))?;
            majors.push(major);
        }

        Self::new(majors)
    }

    /// Build a catalog from already-parsed majors, checking ids and grade ranges
    pub fn new(majors: Vec<Major>) -> Result<Self> {
        if majors.is_empty() {
            return Err(Ready4UniError::Catalog("majors data is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for major in &majors {
            if !seen.insert(major.id.as_str()) {
                return Err(Ready4UniError::Catalog(format!("duplicate major id: {}", major.id)));
            }
            if let Some((subject, grade)) = major.requirements.iter().find(|(_, g)| !(0.0..=20.0).contains(*g)) {
                return Err(Ready4UniError::Catalog(format!(
                    "{}: requirement for {} is {} (must be 0-20)",
                    major.id, subject, grade
                )));
            }
        }

        Ok(Self { majors })
    }

    pub fn majors(&self) -> &[Major] {
        &self.majors
    }

    pub fn len(&self) -> usize {
        self.majors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.majors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.majors.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Major> {
        self.majors.iter().find(|m| m.id == id)
    }

    /// Look a major up by name.
    ///
    /// An exact case-insensitive match on name, Portuguese name or id always
    /// wins. With `fuzzy`, the first major whose name or Portuguese name
    /// contains `name` is returned otherwise.
    pub fn find_by_name(&self, name: &str, fuzzy: bool) -> Option<&Major> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let exact = self
            .majors
            .iter()
            .find(|m| m.id.to_lowercase() == needle || m.names_lowercase().any(|n| n == needle));
        if exact.is_some() || !fuzzy {
            return exact;
        }

        self.majors
            .iter()
            .find(|m| m.names_lowercase().any(|n| n.contains(&needle)))
    }

    /// Majors whose name, keywords or description match `query`
    pub fn search(&self, query: &str) -> Vec<&Major> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.majors
            .iter()
            .filter(|m| {
                m.name.to_lowercase().contains(&query)
                    || m.keywords.iter().map(|k| k.to_lowercase()).any(|k| k.contains(&query) || query.contains(&k))
                    || m.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Majors sharing keywords with `reference`, by Jaccard similarity
    pub fn similar(&self, reference: &Major, top_n: usize) -> Vec<(&Major, f64)> {
        let ref_keywords = reference.keyword_set();

        let mut similarities: Vec<(&Major, f64)> = self
            .majors
            .iter()
            .filter(|m| m.id != reference.id)
            .filter_map(|m| {
                let keywords = m.keyword_set();
                let overlap = ref_keywords.intersection(&keywords).count();
                if overlap == 0 {
                    return None;
                }
                let union = ref_keywords.union(&keywords).count();
                Some((m, overlap as f64 / union as f64))
            })
            .collect();

        similarities.sort_by(|a, b| b.1.total_cmp(&a.1));
        similarities.truncate(top_n);
        similarities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn major(id: &str, name: &str, keywords: &[&str]) -> Major {
        Major {
            id: id.to_string(),
            name: name.to_string(),
            name_pt: None,
            description: format!("Study of {}", name.to_lowercase()),
            requirements: BTreeMap::from([("Math".to_string(), 14.0)]),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            career_paths: vec![],
            universities: vec![],
        }
    }

    #[test]
    fn test_bundled_dataset_loads() {
        let catalog = MajorCatalog::bundled().unwrap();
        assert!(catalog.len() >= 10);
        assert!(catalog.majors().iter().all(|m| !m.requirements.is_empty()));
        assert!(catalog.find_by_name("Computer Science", false).is_some());
    }

    #[test]
    fn test_from_json_rejects_non_list() {
        let err = MajorCatalog::from_json(r#"{"id": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("list of major objects"));
    }

    #[test]
    fn test_from_json_rejects_empty() {
        let err = MajorCatalog::from_json("[]").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_from_json_reports_missing_fields() {
        let err = MajorCatalog::from_json(r#"[{"id": "law", "name": "Law"}]"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("index 0"));
        assert!(msg.contains("description"));
        assert!(msg.contains("requirements"));
    }

    #[test]
    fn test_new_rejects_duplicate_ids_and_bad_grades() {
        let dup = vec![major("law", "Law", &[]), major("law", "Law 2", &[])];
        assert!(MajorCatalog::new(dup).is_err());

        let mut bad = major("law", "Law", &[]);
        bad.requirements.insert("History".to_string(), 25.0);
        assert!(MajorCatalog::new(vec![bad]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("majors.json");
        let json = serde_json::to_string(&vec![major("law", "Law", &["justice"])]).unwrap();
        std::fs::write(&path, json).unwrap();

        let catalog = MajorCatalog::load(&path).unwrap();
        assert_eq!(catalog.names(), vec!["Law"]);
        assert!(catalog.get("law").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(MajorCatalog::load(Path::new("/nonexistent/majors.json")).is_err());
    }

    #[test]
    fn test_find_by_name_exact_beats_fuzzy() {
        let catalog = MajorCatalog::new(vec![
            major("computer_engineering", "Computer Engineering", &[]),
            major("engineering", "Engineering", &[]),
        ])
        .unwrap();

        assert_eq!(catalog.find_by_name("engineering", true).unwrap().id, "engineering");
        assert_eq!(catalog.find_by_name("computer", true).unwrap().id, "computer_engineering");
        assert!(catalog.find_by_name("computer", false).is_none());
        assert!(catalog.find_by_name("   ", true).is_none());
    }

    #[test]
    fn test_find_by_portuguese_name_and_id() {
        let mut medicine = major("medicine", "Medicine", &[]);
        medicine.name_pt = Some("Medicina".to_string());
        let catalog = MajorCatalog::new(vec![medicine]).unwrap();

        assert!(catalog.find_by_name("medicina", false).is_some());
        assert!(catalog.find_by_name("MEDICINE", false).is_some());
        assert!(catalog.find_by_name("medic", true).is_some());
    }

    #[test]
    fn test_search_matches_name_keywords_description() {
        let catalog = MajorCatalog::new(vec![
            major("cs", "Computer Science", &["programming", "algorithms"]),
            major("bio", "Biology", &["genetics"]),
            major("law", "Law", &["justice"]),
        ])
        .unwrap();

        let ids = |q: &str| catalog.search(q).iter().map(|m| m.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids("computer"), vec!["cs"]);
        assert_eq!(ids("I enjoy programming games"), vec!["cs"]);
        assert_eq!(ids("gene"), vec!["bio"]);
        assert_eq!(ids("study of"), vec!["cs", "bio", "law"]);
        assert!(ids("  ").is_empty());
    }

    #[test]
    fn test_similar_uses_jaccard_and_excludes_self() {
        let catalog = MajorCatalog::new(vec![
            major("cs", "Computer Science", &["programming", "math", "algorithms"]),
            major("ce", "Computer Engineering", &["programming", "math", "hardware"]),
            major("math", "Mathematics", &["math", "proofs"]),
            major("art", "Fine Arts", &["painting"]),
        ])
        .unwrap();

        let cs = catalog.get("cs").unwrap();
        let similar = catalog.similar(cs, 3);

        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].0.id, "ce");
        assert!((similar[0].1 - 0.5).abs() < 1e-9);
        assert_eq!(similar[1].0.id, "math");
        assert!(similar.iter().all(|(m, _)| m.id != "cs" && m.id != "art"));
    }
}
