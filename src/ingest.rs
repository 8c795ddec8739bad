//! CSV ingestion boundary. Rows are parsed into typed [`StudentRecord`]s here
//! so the engine never sees loosely typed data.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{bail, Context};

use crate::config::SubjectSet;
use crate::error::RangeWarning;
use crate::models::{display_name, StudentRecord};

pub const SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const SANE_AGE_RANGE: RangeInclusive<i64> = 1..=120;

const REGISTER_NUMBER: &str = "Register Number";
const FIRST_NAME: &str = "First Name";
const LAST_NAME: &str = "Last Name";
const NAME: &str = "Name";
const AGE: &str = "Age";

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub students: Vec<StudentRecord>,
    pub warnings: Vec<RangeWarning>,
}

pub fn load_students(path: &Path, subjects: &SubjectSet) -> anyhow::Result<Roster> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let roster =
        read_students(file, subjects).with_context(|| format!("failed to load {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        students = roster.students.len(),
        warnings = roster.warnings.len(),
        "loaded roster"
    );
    Ok(roster)
}

pub fn read_students<R: Read>(reader: R, subjects: &SubjectSet) -> anyhow::Result<Roster> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let register_col = column(REGISTER_NUMBER);
    let first_col = column(FIRST_NAME);
    let last_col = column(LAST_NAME);
    let name_col = column(NAME);
    let age_col = column(AGE).context("missing 'Age' column")?;
    if name_col.is_none() && (first_col.is_none() || last_col.is_none()) {
        bail!("expected a 'Name' column or both 'First Name' and 'Last Name'");
    }
    let subject_cols: Vec<(&str, usize)> = subjects
        .iter()
        .filter_map(|subject| column(subject).map(|idx| (subject, idx)))
        .collect();

    let mut students = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let record = result.with_context(|| format!("malformed row at line {line}"))?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let first_name = field(first_col).unwrap_or_default();
        let last_name = field(last_col).unwrap_or_default();
        let name = match field(name_col) {
            Some(name) => name,
            None => display_name(&first_name, &last_name),
        };

        let age_text = field(Some(age_col)).with_context(|| format!("missing age at line {line}"))?;
        let age = parse_age(&age_text)
            .with_context(|| format!("invalid age '{age_text}' at line {line}"))?;

        let mut scores = BTreeMap::new();
        for (subject, col) in &subject_cols {
            if let Some(text) = field(Some(*col)) {
                let score = parse_score(&text).with_context(|| {
                    format!("invalid {subject} score '{text}' at line {line}")
                })?;
                scores.insert(subject.to_string(), score);
            }
        }

        students.push(StudentRecord {
            register_number: field(register_col),
            first_name,
            last_name,
            name,
            age,
            scores,
        });
    }

    warn_on_duplicate_names(&students);
    let warnings = scan_ranges(&students, subjects);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    Ok(Roster { students, warnings })
}

// Spreadsheet exports often write whole ages as "12.0".
fn parse_age(text: &str) -> anyhow::Result<i64> {
    if let Ok(age) = text.parse::<i64>() {
        return Ok(age);
    }
    let value: f64 = text.parse()?;
    if !value.is_finite() || value.fract() != 0.0 {
        bail!("age must be a whole number");
    }
    Ok(value as i64)
}

fn parse_score(text: &str) -> anyhow::Result<f64> {
    let score: f64 = text.parse()?;
    if !score.is_finite() {
        bail!("score must be a finite number");
    }
    Ok(score)
}

pub fn scan_ranges(students: &[StudentRecord], subjects: &SubjectSet) -> Vec<RangeWarning> {
    let mut warnings = Vec::new();
    for student in students {
        if !SANE_AGE_RANGE.contains(&student.age) {
            warnings.push(RangeWarning::Age {
                student: student.name.clone(),
                age: student.age,
            });
        }
        for subject in subjects.iter() {
            if let Some(&score) = student.scores.get(subject) {
                if !SCORE_RANGE.contains(&score) {
                    warnings.push(RangeWarning::Score {
                        student: student.name.clone(),
                        subject: subject.to_string(),
                        score,
                    });
                }
            }
        }
    }
    warnings
}

fn warn_on_duplicate_names(students: &[StudentRecord]) {
    let mut seen = HashSet::new();
    for student in students {
        if !seen.insert(student.name.as_str()) {
            tracing::warn!(
                name = %student.name,
                "duplicate student name; lookups by name return the first row"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn subjects() -> SubjectSet {
        SubjectSet::new(["Mathematics", "Integrated Science"]).unwrap()
    }

    #[test]
    fn reads_rows_and_derives_names() {
        let csv = "\
Register Number,First Name,Last Name,Age,Mathematics,Integrated Science
R001,Emma,Smith,12,88,71
R002,Liam,Jones,11,64.5,90
";
        let roster = read_students(csv.as_bytes(), &subjects()).unwrap();

        assert_eq!(roster.students.len(), 2);
        let emma = &roster.students[0];
        assert_eq!(emma.name, "Emma Smith");
        assert_eq!(emma.register_number.as_deref(), Some("R001"));
        assert_eq!(emma.age, 12);
        assert_eq!(emma.score("Mathematics"), Ok(88.0));
        assert_eq!(roster.students[1].score("Mathematics"), Ok(64.5));
        assert!(roster.warnings.is_empty());
    }

    #[test]
    fn explicit_name_column_wins() {
        let csv = "\
Name,First Name,Last Name,Age,Mathematics,Integrated Science
Em Smith,Emma,Smith,12,88,71
";
        let roster = read_students(csv.as_bytes(), &subjects()).unwrap();
        assert_eq!(roster.students[0].name, "Em Smith");
        assert_eq!(roster.students[0].first_name, "Emma");
    }

    #[test]
    fn blank_and_absent_subjects_stay_unset() {
        let csv = "\
First Name,Last Name,Age,Mathematics
Ava,Lee,12,
";
        let roster = read_students(csv.as_bytes(), &subjects()).unwrap();
        assert!(roster.students[0].scores.is_empty());
        assert!(roster.students[0].score("Integrated Science").is_err());
    }

    #[test]
    fn unparsable_score_reports_line() {
        let csv = "\
First Name,Last Name,Age,Mathematics,Integrated Science
Ava,Lee,12,eighty,70
";
        let err = read_students(csv.as_bytes(), &subjects()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("Mathematics"), "{message}");
    }

    #[test]
    fn requires_identity_columns() {
        let csv = "Age,Mathematics\n12,80\n";
        assert!(read_students(csv.as_bytes(), &subjects()).is_err());

        let csv = "First Name,Last Name,Mathematics\nAva,Lee,80\n";
        assert!(read_students(csv.as_bytes(), &subjects()).is_err());
    }

    #[test]
    fn out_of_range_values_warn_but_load() {
        let csv = "\
First Name,Last Name,Age,Mathematics,Integrated Science
Ava,Lee,250,104,-3
";
        let roster = read_students(csv.as_bytes(), &subjects()).unwrap();

        assert_eq!(roster.students.len(), 1);
        assert_eq!(
            roster.warnings,
            vec![
                RangeWarning::Age {
                    student: "Ava Lee".to_string(),
                    age: 250
                },
                RangeWarning::Score {
                    student: "Ava Lee".to_string(),
                    subject: "Mathematics".to_string(),
                    score: 104.0
                },
                RangeWarning::Score {
                    student: "Ava Lee".to_string(),
                    subject: "Integrated Science".to_string(),
                    score: -3.0
                },
            ]
        );
    }

    #[test]
    fn implausible_ages_warn_instead_of_failing() {
        let csv = "\
First Name,Last Name,Age,Mathematics,Integrated Science
Ava,Lee,-1,80,70
Noah,Hall,12.0,75,75
";
        let roster = read_students(csv.as_bytes(), &subjects()).unwrap();

        assert_eq!(roster.students.len(), 2);
        assert_eq!(roster.students[0].age, -1);
        assert_eq!(roster.students[1].age, 12);
        assert_eq!(
            roster.warnings,
            vec![RangeWarning::Age {
                student: "Ava Lee".to_string(),
                age: -1
            }]
        );
    }

    #[test]
    fn fractional_age_is_rejected() {
        let csv = "First Name,Last Name,Age,Mathematics\nAva,Lee,12.5,80\n";
        let err = read_students(csv.as_bytes(), &subjects()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        for value in ["NaN", "inf", "-inf"] {
            let csv = format!(
                "First Name,Last Name,Age,Mathematics,Integrated Science\nAva,Lee,12,{value},70\n"
            );
            let err = read_students(csv.as_bytes(), &subjects()).unwrap_err();
            let message = format!("{err:#}");
            assert!(message.contains("line 2"), "{message}");
            assert!(message.contains("Mathematics"), "{message}");
        }
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(
            &path,
            "First Name,Last Name,Age,Mathematics,Integrated Science\nMia,Clark,13,90,91\n",
        )
        .unwrap();

        let roster = load_students(&path, &subjects()).unwrap();
        assert_eq!(roster.students[0].name, "Mia Clark");

        assert!(load_students(&dir.path().join("absent.csv"), &subjects()).is_err());
    }
}
