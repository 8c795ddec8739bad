use serde::Serialize;

use crate::config::SubjectSet;
use crate::error::{AnalyticsError, Result};
use crate::models::{CohortMember, CohortSelection, StudentRecord};
use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    AtRisk,
    Excelling,
}

impl Direction {
    pub fn matches(self, average: f64, threshold: u32) -> bool {
        let threshold = f64::from(threshold);
        match self {
            Direction::AtRisk => average < threshold,
            Direction::Excelling => average >= threshold,
        }
    }
}

pub fn filter_by_threshold(
    students: &[StudentRecord],
    subjects: &SubjectSet,
    threshold: u32,
    direction: Direction,
) -> Result<CohortSelection> {
    if threshold > 100 {
        return Err(AnalyticsError::ThresholdOutOfRange(threshold));
    }

    let mut members = Vec::new();
    for student in students {
        let overall_average = report::overall_average(student, subjects)?;
        if direction.matches(overall_average, threshold) {
            members.push(CohortMember {
                student: student.clone(),
                overall_average,
            });
        }
    }

    tracing::debug!(
        ?direction,
        threshold,
        selected = members.len(),
        total = students.len(),
        "filtered cohort"
    );

    Ok(CohortSelection {
        total_students: students.len(),
        members,
    })
}

pub fn filter_by_age(
    students: &[StudentRecord],
    min_age: Option<i64>,
    max_age: Option<i64>,
) -> Vec<StudentRecord> {
    students
        .iter()
        .filter(|s| min_age.map_or(true, |min| s.age >= min))
        .filter(|s| max_age.map_or(true, |max| s.age <= max))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    NoRoster,
    NoneInAgeRange,
    Selected(CohortSelection),
}

/// Age filter followed by the threshold filter, keeping "nothing uploaded"
/// and "nobody in the age range" apart from an empty selection.
pub fn segment(
    students: &[StudentRecord],
    subjects: &SubjectSet,
    threshold: u32,
    direction: Direction,
    min_age: Option<i64>,
    max_age: Option<i64>,
) -> Result<Segment> {
    if students.is_empty() {
        return Ok(Segment::NoRoster);
    }
    let in_range = filter_by_age(students, min_age, max_age);
    if in_range.is_empty() {
        return Ok(Segment::NoneInAgeRange);
    }
    filter_by_threshold(&in_range, subjects, threshold, direction).map(Segment::Selected)
}

pub fn find_student<'a>(students: &'a [StudentRecord], name: &str) -> Option<&'a StudentRecord> {
    students.iter().find(|s| s.name == name)
}
