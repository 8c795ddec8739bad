//! Pathway classification, student reports and cohort segmentation for
//! classroom score records.
//!
//! The engine functions ([`pathway::classify`], [`report::generate_report`],
//! [`cohort::filter_by_threshold`]) are pure: they take the roster and the
//! curriculum by reference and return fresh values.

pub mod cohort;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod notes;
pub mod pathway;
pub mod report;

pub use cohort::{filter_by_threshold, Direction};
pub use config::{Curriculum, Pathway, PathwayDefinition, SubjectSet};
pub use error::{AnalyticsError, RangeWarning};
pub use models::{ClassificationResult, CohortSelection, ReportContent, StudentRecord};
pub use pathway::{classify, PATHWAY_QUALIFYING_SCORE};
pub use report::generate_report;
