//! Directory scanning: submission folders, feedback files and the shared tree walk

pub mod feedback;
pub mod submissions;
pub mod walk;

pub use feedback::{FeedbackIndex, FeedbackScanner, FeedbackStrictness, FolderIndex};
pub use submissions::{ScanIssue, SubmissionScanner};
pub use walk::{TreeWalker, WalkEntry};
