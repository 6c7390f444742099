//! # Grading workflow toolkit
//!
//! Matches instructor feedback files to student submissions across assignment
//! revisions. Submission folders and feedback files are scanned from disk,
//! keyed by a derived student identity, reconciled into copy plans and
//! applied idempotently using lock-marker files.

pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod lock;
pub mod mover;
pub mod paths;
pub mod reconcile;
pub mod report;
pub mod scan;
pub mod submission;
pub mod workflows;

// Re-export main API types
pub use collection::{SubmissionList, SubmissionListCollection, SubmissionSlot};
pub use config::{AppConfig, MatchSettings};
pub use context::{Consolidation, GradingContext};
pub use error::{ConfigError, GradeError, GradeResult, IdentityError, KeyNotFound};
pub use identity::{IdentityExtractor, StudentKey};
pub use lock::{CopyOutcome, LockMarker};
pub use mover::MoveOutcome;
pub use reconcile::{ReconciliationResult, apply, reconcile, split_keys};
pub use report::{Report, ReportGroup};
pub use submission::{FeedbackRef, Submission};
