//! End-to-end instructor operations
//!
//! Each workflow validates its inputs, logs what it does and returns a
//! [`Report`](crate::report::Report). Only invalid inputs or configuration
//! are errors; per-student problems end up in the report.

mod distribute;
mod organize;
mod revision;
mod template;

pub use distribute::{distribute_feedback, longest_common_substring_len};
pub use organize::{organize, template_to_students};
pub use revision::{copy_feedback_to_revision, copy_revision_feedback};
pub use template::{copy_template, copy_template_to_subdirs, replace_feedback_files};

use std::path::Path;

use crate::error::{GradeError, GradeResult};

pub(crate) fn check_file(path: &Path) -> GradeResult<()> {
	if !path.exists() {
		return Err(GradeError::PathNotFound(path.to_path_buf()));
	}
	if !path.is_file() {
		return Err(GradeError::NotAFile(path.to_path_buf()));
	}
	Ok(())
}
