use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::ReportContent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentNote {
    pub student: String,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

/// Free-text notes keyed by student name, kept in first-saved order.
///
/// Owned by the caller and passed in explicitly; the engine never holds one.
#[derive(Debug, Clone, Default)]
pub struct NoteBook {
    notes: Vec<StudentNote>,
}

impl NoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, student: &str, text: impl Into<String>) {
        let text = text.into();
        let updated_at = Utc::now();
        match self.notes.iter_mut().find(|n| n.student == student) {
            Some(note) => {
                note.text = text;
                note.updated_at = updated_at;
            }
            None => self.notes.push(StudentNote {
                student: student.to_string(),
                text,
                updated_at,
            }),
        }
    }

    pub fn get(&self, student: &str) -> Option<&str> {
        self.notes
            .iter()
            .find(|n| n.student == student)
            .map(|n| n.text.as_str())
    }

    pub fn remove(&mut self, student: &str) -> Option<StudentNote> {
        let index = self.notes.iter().position(|n| n.student == student)?;
        Some(self.notes.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StudentNote> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl FromIterator<StudentNote> for NoteBook {
    fn from_iter<I: IntoIterator<Item = StudentNote>>(iter: I) -> Self {
        let mut book = NoteBook::new();
        for note in iter {
            match book.notes.iter_mut().find(|n| n.student == note.student) {
                Some(existing) => *existing = note,
                None => book.notes.push(note),
            }
        }
        book
    }
}

pub fn export_notes(book: &NoteBook) -> String {
    let mut output = String::new();
    for note in book.iter() {
        let _ = writeln!(output, "Notes for {}:", note.student);
        let _ = writeln!(output, "{}", note.text);
        let _ = writeln!(output);
    }
    output
}

pub fn report_body(book: &NoteBook, report: &ReportContent) -> String {
    match book.get(&report.name) {
        Some(note) => note.to_string(),
        None => report.to_string(),
    }
}
