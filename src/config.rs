//! Subject and pathway configuration.
//!
//! The configuration is an explicit value handed to every engine call. It can
//! be edited at runtime through [`Curriculum`], loaded from a TOML file, or
//! taken from the built-in defaults.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "pathways.toml";
pub const DEFAULT_AT_RISK_THRESHOLD: u32 = 60;
pub const DEFAULT_EXCELLING_THRESHOLD: u32 = 90;

const DEFAULT_SUBJECTS: [&str; 6] = [
    "English Language",
    "Social Studies",
    "Mathematics",
    "Integrated Science",
    "Zambian Languages",
    "Creative and Technology Studies",
];

const DEFAULT_PATHWAYS: [(&str, &[&str]); 4] = [
    ("STEM", &["Mathematics", "Integrated Science"]),
    (
        "Humanities and Social Sciences",
        &["English Language", "Social Studies"],
    ),
    (
        "Linguistic and Cultural Studies",
        &["Zambian Languages", "English Language"],
    ),
    ("Creative and Design", &["Creative and Technology Studies"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectSet(Vec<String>);

impl SubjectSet {
    pub fn new<I, S>(subjects: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = SubjectSet(Vec::new());
        for subject in subjects {
            set.push(subject.into())?;
        }
        Ok(set)
    }

    fn push(&mut self, subject: String) -> Result<()> {
        if self.contains(&subject) {
            return Err(AnalyticsError::DuplicateSubject(subject));
        }
        self.0.push(subject);
        Ok(())
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.0.iter().any(|s| s == subject)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    pub name: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

impl Pathway {
    pub fn new<I, S>(name: impl Into<String>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pathway {
            name: name.into(),
            requires: requires.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayDefinition(Vec<Pathway>);

impl PathwayDefinition {
    pub fn new(pathways: Vec<Pathway>) -> Result<Self> {
        let mut seen = HashSet::new();
        for pathway in &pathways {
            if !seen.insert(pathway.name.as_str()) {
                return Err(AnalyticsError::DuplicatePathway(pathway.name.clone()));
            }
        }
        Ok(PathwayDefinition(pathways))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pathway> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Pathway> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate_against(&self, subjects: &SubjectSet) -> Result<()> {
        for pathway in &self.0 {
            if let Some(subject) = pathway.requires.iter().find(|s| !subjects.contains(s)) {
                return Err(AnalyticsError::UnknownPathwaySubject {
                    pathway: pathway.name.clone(),
                    subject: subject.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Curriculum {
    subjects: SubjectSet,
    pathways: PathwayDefinition,
}

impl Curriculum {
    pub fn new(subjects: SubjectSet, pathways: PathwayDefinition) -> Result<Self> {
        pathways.validate_against(&subjects)?;
        Ok(Curriculum { subjects, pathways })
    }

    pub fn subjects(&self) -> &SubjectSet {
        &self.subjects
    }

    pub fn pathways(&self) -> &PathwayDefinition {
        &self.pathways
    }

    pub fn add_subject(&mut self, subject: impl Into<String>) -> Result<()> {
        self.subjects.push(subject.into())
    }

    pub fn remove_subject(&mut self, subject: &str) -> Result<()> {
        if !self.subjects.contains(subject) {
            return Err(AnalyticsError::UnknownSubject(subject.to_string()));
        }
        if let Some(pathway) = self
            .pathways
            .iter()
            .find(|p| p.requires.iter().any(|s| s == subject))
        {
            return Err(AnalyticsError::SubjectInUse {
                subject: subject.to_string(),
                pathway: pathway.name.clone(),
            });
        }
        self.subjects.0.retain(|s| s != subject);
        Ok(())
    }

    pub fn add_pathway(&mut self, pathway: Pathway) -> Result<()> {
        if self.pathways.get(&pathway.name).is_some() {
            return Err(AnalyticsError::DuplicatePathway(pathway.name));
        }
        if let Some(subject) = pathway
            .requires
            .iter()
            .find(|s| !self.subjects.contains(s))
        {
            return Err(AnalyticsError::UnknownPathwaySubject {
                pathway: pathway.name.clone(),
                subject: subject.clone(),
            });
        }
        self.pathways.0.push(pathway);
        Ok(())
    }

    pub fn remove_pathway(&mut self, name: &str) -> Result<Pathway> {
        let index = self
            .pathways
            .0
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| AnalyticsError::UnknownPathway(name.to_string()))?;
        Ok(self.pathways.0.remove(index))
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Curriculum {
            subjects: SubjectSet(DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect()),
            pathways: PathwayDefinition(
                DEFAULT_PATHWAYS
                    .iter()
                    .map(|(name, requires)| Pathway::new(*name, requires.iter().copied()))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortThresholds {
    #[serde(default = "default_at_risk")]
    pub at_risk_threshold: u32,
    #[serde(default = "default_excelling")]
    pub excelling_threshold: u32,
}

fn default_at_risk() -> u32 {
    DEFAULT_AT_RISK_THRESHOLD
}

fn default_excelling() -> u32 {
    DEFAULT_EXCELLING_THRESHOLD
}

impl Default for CohortThresholds {
    fn default() -> Self {
        CohortThresholds {
            at_risk_threshold: DEFAULT_AT_RISK_THRESHOLD,
            excelling_threshold: DEFAULT_EXCELLING_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub curriculum: Curriculum,
    pub cohort: CohortThresholds,
}

#[derive(Deserialize)]
struct ConfigFile {
    subjects: Option<Vec<String>>,
    pathways: Option<Vec<Pathway>>,
    #[serde(default)]
    cohort: CohortThresholds,
}

pub fn parse_config(contents: &str) -> anyhow::Result<AppConfig> {
    let file: ConfigFile = toml::from_str(contents).context("failed to parse configuration")?;
    let defaults = Curriculum::default();

    let subjects = match file.subjects {
        Some(subjects) => SubjectSet::new(subjects)?,
        None => defaults.subjects,
    };
    let pathways = match file.pathways {
        Some(pathways) => PathwayDefinition::new(pathways)?,
        None => defaults.pathways,
    };

    Ok(AppConfig {
        curriculum: Curriculum::new(subjects, pathways)?,
        cohort: file.cohort,
    })
}

/// Loads `path` if given, otherwise `pathways.toml` from the working
/// directory when it exists, otherwise the built-in defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = Path::new(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using default curriculum");
                return Ok(AppConfig::default());
            }
            candidate.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = parse_config(&contents).with_context(|| format!("invalid {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        subjects = config.curriculum.subjects().len(),
        pathways = config.curriculum.pathways().len(),
        "loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_curriculum_is_consistent() {
        let curriculum = Curriculum::default();
        assert_eq!(curriculum.subjects().len(), 6);
        assert_eq!(curriculum.pathways().len(), 4);
        assert!(curriculum
            .pathways()
            .validate_against(curriculum.subjects())
            .is_ok());
    }

    #[test]
    fn subject_set_rejects_duplicates() {
        let err = SubjectSet::new(["Mathematics", "Mathematics"]).unwrap_err();
        assert_eq!(err, AnalyticsError::DuplicateSubject("Mathematics".to_string()));
    }

    #[test]
    fn pathway_definition_rejects_duplicate_names() {
        let err = PathwayDefinition::new(vec![
            Pathway::new("STEM", ["Mathematics"]),
            Pathway::new("STEM", ["Integrated Science"]),
        ])
        .unwrap_err();
        assert_eq!(err, AnalyticsError::DuplicatePathway("STEM".to_string()));
    }

    #[test]
    fn unknown_requirement_is_a_configuration_error() {
        let subjects = SubjectSet::new(["Mathematics"]).unwrap();
        let pathways =
            PathwayDefinition::new(vec![Pathway::new("STEM", ["Mathematics", "Physics"])])
                .unwrap();
        let err = Curriculum::new(subjects, pathways).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err,
            AnalyticsError::UnknownPathwaySubject {
                pathway: "STEM".to_string(),
                subject: "Physics".to_string(),
            }
        );
    }

    #[test]
    fn runtime_edits_keep_curriculum_consistent() {
        let mut curriculum = Curriculum::default();
        curriculum.add_subject("Physical Education").unwrap();
        curriculum
            .add_pathway(Pathway::new("Sports Science", ["Physical Education"]))
            .unwrap();

        let err = curriculum.remove_subject("Physical Education").unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::SubjectInUse {
                subject: "Physical Education".to_string(),
                pathway: "Sports Science".to_string(),
            }
        );

        curriculum.remove_pathway("Sports Science").unwrap();
        curriculum.remove_subject("Physical Education").unwrap();
        assert!(!curriculum.subjects().contains("Physical Education"));
        assert_eq!(
            curriculum.remove_pathway("Sports Science").unwrap_err(),
            AnalyticsError::UnknownPathway("Sports Science".to_string())
        );
    }

    #[test]
    fn add_pathway_rejects_unknown_subject() {
        let mut curriculum = Curriculum::default();
        let err = curriculum
            .add_pathway(Pathway::new("Music", ["Music Theory"]))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(curriculum.pathways().len(), 4);
    }

    #[test]
    fn parses_toml_configuration() {
        let config = parse_config(
            r#"
            subjects = ["Mathematics", "Science"]

            [[pathways]]
            name = "STEM"
            requires = ["Mathematics", "Science"]

            [[pathways]]
            name = "Open"

            [cohort]
            at_risk_threshold = 55
            "#,
        )
        .unwrap();

        assert_eq!(
            config.curriculum.subjects().as_slice(),
            &["Mathematics".to_string(), "Science".to_string()]
        );
        assert_eq!(config.curriculum.pathways().len(), 2);
        assert!(config.curriculum.pathways().get("Open").unwrap().requires.is_empty());
        assert_eq!(config.cohort.at_risk_threshold, 55);
        assert_eq!(config.cohort.excelling_threshold, DEFAULT_EXCELLING_THRESHOLD);
    }

    #[test]
    fn example_file_matches_defaults() {
        let config = parse_config(include_str!("../pathways.example.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn toml_with_dangling_requirement_fails() {
        let result = parse_config(
            r#"
            subjects = ["Mathematics"]

            [[pathways]]
            name = "STEM"
            requires = ["Science"]
            "#,
        );
        assert!(result.is_err());
    }
}
