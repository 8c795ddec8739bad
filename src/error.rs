use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("configuration error: pathway '{pathway}' requires '{subject}', which is not a configured subject")]
    UnknownPathwaySubject { pathway: String, subject: String },

    #[error("configuration error: subject '{0}' is listed more than once")]
    DuplicateSubject(String),

    #[error("configuration error: pathway '{0}' is defined more than once")]
    DuplicatePathway(String),

    #[error("configuration error: no subjects are configured")]
    NoSubjects,

    #[error("configuration error: subject '{subject}' is still required by pathway '{pathway}'")]
    SubjectInUse { subject: String, pathway: String },

    #[error("configuration error: unknown subject '{0}'")]
    UnknownSubject(String),

    #[error("configuration error: unknown pathway '{0}'")]
    UnknownPathway(String),

    #[error("missing data: student '{student}' has no score for '{subject}'")]
    MissingScore { student: String, subject: String },

    #[error("threshold {0} is outside 0..=100")]
    ThresholdOutOfRange(u32),
}

impl AnalyticsError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownPathwaySubject { .. }
                | Self::DuplicateSubject(_)
                | Self::DuplicatePathway(_)
                | Self::NoSubjects
                | Self::SubjectInUse { .. }
                | Self::UnknownSubject(_)
                | Self::UnknownPathway(_)
        )
    }

    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::MissingScore { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RangeWarning {
    Score {
        student: String,
        subject: String,
        score: f64,
    },
    Age {
        student: String,
        age: i64,
    },
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeWarning::Score {
                student,
                subject,
                score,
            } => write!(
                f,
                "{student}: {subject} score {score} is outside 0-100"
            ),
            RangeWarning::Age { student, age } => {
                write!(f, "{student}: age {age} is outside the expected range")
            }
        }
    }
}
