use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::SubjectSet;
use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub register_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub age: i64,
    pub scores: BTreeMap<String, f64>,
}

impl StudentRecord {
    pub fn new(first_name: &str, last_name: &str, age: i64) -> Self {
        StudentRecord {
            register_number: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            name: display_name(first_name, last_name),
            age,
            scores: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, subject: &str, score: f64) -> Self {
        self.scores.insert(subject.to_string(), score);
        self
    }

    pub fn score(&self, subject: &str) -> Result<f64> {
        self.scores
            .get(subject)
            .copied()
            .ok_or_else(|| AnalyticsError::MissingScore {
                student: self.name.clone(),
                subject: subject.to_string(),
            })
    }

    pub fn subject_scores(&self, subjects: &SubjectSet) -> Result<Vec<SubjectScore>> {
        subjects
            .iter()
            .map(|subject| -> Result<SubjectScore> {
                Ok(SubjectScore {
                    subject: subject.to_string(),
                    score: self.score(subject)?,
                })
            })
            .collect()
    }
}

pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    pub subject: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayGroup {
    pub pathway: String,
    pub students: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayCount {
    pub pathway: String,
    pub count: usize,
}

/// Pathway groupings for a cohort. Pathways without qualifiers are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClassificationResult {
    pub groupings: Vec<PathwayGroup>,
}

impl ClassificationResult {
    pub fn students_in(&self, pathway: &str) -> Option<&[String]> {
        self.groupings
            .iter()
            .find(|g| g.pathway == pathway)
            .map(|g| g.students.as_slice())
    }

    pub fn counts(&self) -> Vec<PathwayCount> {
        self.groupings
            .iter()
            .map(|g| PathwayCount {
                pathway: g.pathway.clone(),
                count: g.students.len(),
            })
            .collect()
    }

    pub fn count(&self, pathway: &str) -> usize {
        self.students_in(pathway).map_or(0, <[String]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.groupings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContent {
    pub name: String,
    pub overall_average: f64,
    pub strengths: Vec<SubjectScore>,
    pub weaknesses: Vec<SubjectScore>,
    pub pathways: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMember {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub overall_average: f64,
}

/// Result of a cohort filter. `total_students` tells an empty selection
/// apart from an empty roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSelection {
    pub total_students: usize,
    pub members: Vec<CohortMember>,
}

impl CohortSelection {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn roster_is_empty(&self) -> bool {
        self.total_students == 0
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub average: f64,
}
