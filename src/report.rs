use std::fmt::{self, Write};

use chrono::NaiveDate;

use crate::cohort::{self, Direction};
use crate::config::{PathwayDefinition, SubjectSet};
use crate::error::{AnalyticsError, Result};
use crate::models::{ReportContent, StudentRecord, SubjectAverage, SubjectScore};
use crate::pathway;

pub const STRENGTH_SCORE: f64 = 80.0;
pub const WEAKNESS_SCORE: f64 = 60.0;

pub fn overall_average(student: &StudentRecord, subjects: &SubjectSet) -> Result<f64> {
    if subjects.is_empty() {
        return Err(AnalyticsError::NoSubjects);
    }
    let mut total = 0.0;
    for subject in subjects.iter() {
        total += student.score(subject)?;
    }
    Ok(total / subjects.len() as f64)
}

pub fn generate_report(
    student: &StudentRecord,
    subjects: &SubjectSet,
    pathways: &PathwayDefinition,
) -> Result<ReportContent> {
    let overall_average = overall_average(student, subjects)?;
    let scores = student.subject_scores(subjects)?;

    let strengths = scores
        .iter()
        .filter(|s| s.score >= STRENGTH_SCORE)
        .cloned()
        .collect();
    let weaknesses = scores
        .iter()
        .filter(|s| s.score < WEAKNESS_SCORE)
        .cloned()
        .collect();

    Ok(ReportContent {
        name: student.name.clone(),
        overall_average,
        strengths,
        weaknesses,
        pathways: pathway::qualifying_pathways(student, subjects, pathways)?,
    })
}

impl fmt::Display for ReportContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report for {}:", self.name)?;
        writeln!(f)?;
        writeln!(f, "Overall Performance: {:.2}%", self.overall_average)?;
        writeln!(f)?;

        writeln!(f, "Strengths:")?;
        for strength in &self.strengths {
            writeln!(f, "- {}: {}%", strength.subject, strength.score)?;
        }
        writeln!(f)?;

        writeln!(f, "Areas for Improvement:")?;
        for weakness in &self.weaknesses {
            writeln!(f, "- {}: {}%", weakness.subject, weakness.score)?;
        }
        writeln!(f)?;

        writeln!(f, "Potential Pathways:")?;
        for pathway in &self.pathways {
            writeln!(f, "- {pathway}")?;
        }
        Ok(())
    }
}

pub fn subject_averages(
    students: &[StudentRecord],
    subjects: &SubjectSet,
) -> Result<Vec<SubjectAverage>> {
    if students.is_empty() {
        return Ok(Vec::new());
    }

    subjects
        .iter()
        .map(|subject| -> Result<SubjectAverage> {
            let mut total = 0.0;
            for student in students {
                total += student.score(subject)?;
            }
            Ok(SubjectAverage {
                subject: subject.to_string(),
                average: total / students.len() as f64,
            })
        })
        .collect()
}

/// Markdown document for one student, ready for export.
///
/// `body` is either the generated report text or a custom note.
pub fn student_document(
    student: &StudentRecord,
    subjects: &SubjectSet,
    body: &str,
) -> Result<String> {
    let average = overall_average(student, subjects)?;
    let scores: Vec<SubjectScore> = student.subject_scores(subjects)?;

    let mut output = String::new();
    let _ = writeln!(output, "# Student Report: {}", student.name);
    let _ = writeln!(output);
    let _ = writeln!(output, "Age: {}", student.age);
    let _ = writeln!(output, "Overall Average: {average:.2}%");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Subject | Score |");
    let _ = writeln!(output, "|---|---|");
    for score in &scores {
        let _ = writeln!(output, "| {} | {}% |", score.subject, score.score);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", body.trim_end());

    Ok(output)
}

/// Markdown class report: subject averages, pathway distribution and the
/// at-risk and excelling segments.
pub fn build_class_report(
    students: &[StudentRecord],
    subjects: &SubjectSet,
    pathways: &PathwayDefinition,
    at_risk_threshold: u32,
    excelling_threshold: u32,
    generated_on: NaiveDate,
) -> Result<String> {
    let averages = subject_averages(students, subjects)?;
    let classification = pathway::classify(students, subjects, pathways)?;
    let at_risk = cohort::filter_by_threshold(students, subjects, at_risk_threshold, Direction::AtRisk)?;
    let excelling = cohort::filter_by_threshold(
        students,
        subjects,
        excelling_threshold,
        Direction::Excelling,
    )?;

    let mut output = String::new();
    let _ = writeln!(output, "# Class Overview Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} students",
        generated_on,
        students.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Average Scores by Subject");

    if averages.is_empty() {
        let _ = writeln!(output, "No students uploaded yet.");
    } else {
        for average in &averages {
            let _ = writeln!(output, "- {}: {:.2}%", average.subject, average.average);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Pathway Distribution");

    if classification.is_empty() {
        let _ = writeln!(output, "No students qualify for any pathway.");
    } else {
        for group in &classification.groupings {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                group.pathway,
                group.students.len(),
                group.students.join(", ")
            );
        }
    }

    for (title, threshold, selection, empty_label) in [
        (
            format!("At-Risk Students (average below {at_risk_threshold})"),
            at_risk_threshold,
            &at_risk,
            "No at-risk students found.",
        ),
        (
            format!("Excelling Students (average {excelling_threshold} or above)"),
            excelling_threshold,
            &excelling,
            "No excelling students found.",
        ),
    ] {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {title}");
        let _ = writeln!(output, "Threshold {threshold}: {} students", selection.len());

        if selection.roster_is_empty() {
            let _ = writeln!(output, "No students uploaded yet.");
        } else if selection.is_empty() {
            let _ = writeln!(output, "{empty_label}");
        } else {
            for member in &selection.members {
                let _ = writeln!(
                    output,
                    "- {} (age {}) average {:.2}%",
                    member.student.name, member.student.age, member.overall_average
                );
            }
        }
    }

    Ok(output)
}
