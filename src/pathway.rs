use std::collections::HashSet;

use crate::config::{Pathway, PathwayDefinition, SubjectSet};
use crate::error::Result;
use crate::models::{ClassificationResult, PathwayGroup, StudentRecord};

pub const PATHWAY_QUALIFYING_SCORE: f64 = 70.0;

pub fn mastered_subjects<'a>(
    student: &StudentRecord,
    subjects: &'a SubjectSet,
) -> Result<HashSet<&'a str>> {
    let mut mastered = HashSet::new();
    for subject in subjects.iter() {
        if student.score(subject)? >= PATHWAY_QUALIFYING_SCORE {
            mastered.insert(subject);
        }
    }
    Ok(mastered)
}

pub fn qualifies(mastered: &HashSet<&str>, pathway: &Pathway) -> bool {
    pathway
        .requires
        .iter()
        .all(|subject| mastered.contains(subject.as_str()))
}

pub fn qualifying_pathways(
    student: &StudentRecord,
    subjects: &SubjectSet,
    pathways: &PathwayDefinition,
) -> Result<Vec<String>> {
    pathways.validate_against(subjects)?;
    let mastered = mastered_subjects(student, subjects)?;
    Ok(pathways
        .iter()
        .filter(|pathway| qualifies(&mastered, pathway))
        .map(|pathway| pathway.name.clone())
        .collect())
}

/// Groups students by the pathways they qualify for.
///
/// A pathway's group appears when its first qualifier is seen, so groups are
/// ordered by first qualifier; students within a group keep input order.
/// The whole call fails if the configuration is inconsistent or any student
/// lacks a configured score.
pub fn classify(
    students: &[StudentRecord],
    subjects: &SubjectSet,
    pathways: &PathwayDefinition,
) -> Result<ClassificationResult> {
    pathways.validate_against(subjects)?;

    let mut groupings: Vec<PathwayGroup> = Vec::new();

    for student in students {
        let mastered = mastered_subjects(student, subjects)?;
        for pathway in pathways.iter().filter(|p| qualifies(&mastered, p)) {
            match groupings.iter_mut().find(|g| g.pathway == pathway.name) {
                Some(group) => group.students.push(student.name.clone()),
                None => groupings.push(PathwayGroup {
                    pathway: pathway.name.clone(),
                    students: vec![student.name.clone()],
                }),
            }
        }
    }

    tracing::debug!(
        students = students.len(),
        pathways = groupings.len(),
        "classified cohort"
    );

    Ok(ClassificationResult { groupings })
}
