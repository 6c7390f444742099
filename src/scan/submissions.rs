//! Scan a tree for `Last,First,Assignment,Timestamp` submission directories

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collection::SubmissionListCollection;
use crate::error::{GradeError, GradeResult};
use crate::lock::LockMarker;
use crate::scan::walk::TreeWalker;
use crate::submission::{Submission, is_valid_name};

/// Non-fatal problems met while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScanIssue {
	/// Looked like a submission but could not be parsed
	Unparsable { path: PathBuf, reason: String },
	/// A direct child of the root that is not shaped like a submission
	NotASubmission(PathBuf),
	MultipleFeedbackFiles { student: String, files: Vec<PathBuf> },
}

/// Builds a [`SubmissionListCollection`] from a directory tree.
#[derive(Debug, Clone)]
pub struct SubmissionScanner {
	locks: LockMarker,
}

impl SubmissionScanner {
	pub fn new(locks: LockMarker) -> Self {
		Self { locks }
	}

	pub fn scan(&self, root: &Path) -> GradeResult<SubmissionListCollection> {
		self.scan_with_issues(root).map(|(collection, _)| collection)
	}

	/// Like [`scan`](Self::scan), also returning every warning raised.
	pub fn scan_with_issues(&self, root: &Path) -> GradeResult<(SubmissionListCollection, Vec<ScanIssue>)> {
		check_dir(root)?;
		info!("Scanner: scanning {}", root.display());

		let mut collection = SubmissionListCollection::new();
		let mut issues = Vec::new();

		for entry in TreeWalker::new(root).into_entries().filter(|e| e.is_dir) {
			let name = entry
				.path
				.file_name()
				.map(|n| n.to_string_lossy().into_owned())
				.unwrap_or_default();

			if !is_valid_name(&name) {
				if entry.depth == 1 {
					warn!("Scanner: found a non-submission folder {}", entry.path.display());
					issues.push(ScanIssue::NotASubmission(entry.path));
				} else {
					debug!("Scanner: skipping nested folder {}", entry.path.display());
				}
				continue;
			}

			match Submission::parse_entry(&entry.path, &self.locks) {
				Ok(submission) => {
					debug!(
						"Scanner: submission {} {}",
						submission.full_name(),
						submission.timestamp_string()
					);
					if submission.feedback.is_multiple() {
						issues.push(ScanIssue::MultipleFeedbackFiles {
							student: submission.full_name(),
							files: submission.feedback.paths().to_vec(),
						});
					}
					collection.add(submission);
				}
				Err(e) => {
					warn!("Scanner: found an unparsable folder {}: {e}", entry.path.display());
					issues.push(ScanIssue::Unparsable {
						path: entry.path,
						reason: e.to_string(),
					});
				}
			}
		}

		info!(
			"Scanner: {} students, {} issues under {}",
			collection.len(),
			issues.len(),
			root.display()
		);
		Ok((collection, issues))
	}
}

pub(crate) fn check_dir(path: &Path) -> GradeResult<()> {
	if !path.exists() {
		return Err(GradeError::PathNotFound(path.to_path_buf()));
	}
	if !path.is_dir() {
		return Err(GradeError::NotADirectory(path.to_path_buf()));
	}
	Ok(())
}
