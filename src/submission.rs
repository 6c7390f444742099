//! One student's submission directory and the feedback files found in it

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use globset::GlobBuilder;
use thiserror::Error;
use tracing::{debug, warn};

use crate::identity::StudentKey;
use crate::lock::LockMarker;
use crate::mover::{MoveOutcome, move_into};
use crate::paths::{base_name, rebase_descendant};

/// Format of the timestamp segment in submission directory names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Feedback documents attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedbackRef {
	#[default]
	None,
	Single(PathBuf),
	/// More than one candidate; kept sorted
	Multiple(Vec<PathBuf>),
}

impl FeedbackRef {
	pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
		match paths.len() {
			0 => FeedbackRef::None,
			1 => FeedbackRef::Single(paths.remove(0)),
			_ => {
				paths.sort();
				FeedbackRef::Multiple(paths)
			}
		}
	}

	pub fn paths(&self) -> &[PathBuf] {
		match self {
			FeedbackRef::None => &[],
			FeedbackRef::Single(path) => std::slice::from_ref(path),
			FeedbackRef::Multiple(paths) => paths,
		}
	}

	pub fn is_multiple(&self) -> bool {
		matches!(self, FeedbackRef::Multiple(_))
	}

	fn rebase(&mut self, old: &Path, new: &Path) {
		match self {
			FeedbackRef::None => {}
			FeedbackRef::Single(path) => {
				if let Some(moved) = rebase_descendant(path, old, new) {
					*path = moved;
				}
			}
			FeedbackRef::Multiple(paths) => {
				for path in paths.iter_mut() {
					if let Some(moved) = rebase_descendant(path, old, new) {
						*path = moved;
					}
				}
			}
		}
	}
}

/// Why a directory could not be turned into a [`Submission`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
	#[error("does not exist")]
	Missing,
	#[error("not a directory")]
	NotADirectory,
	#[error("name is not `Last,First,Assignment[,Timestamp]`")]
	InvalidName,
	#[error("could not list directory: {0}")]
	Unreadable(String),
}

/// One on-disk directory holding one version of one student's work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
	pub path: PathBuf,
	pub last_name: String,
	pub first_name: String,
	pub assignment: String,
	/// `NaiveDateTime::MIN` when the name carried no usable timestamp
	pub timestamp: NaiveDateTime,
	pub feedback: FeedbackRef,
}

/// Lightweight shape check on a directory name: somewhere in it, three
/// consecutive non-empty comma-separated segments.
pub fn is_valid_name(name: &str) -> bool {
	let segments: Vec<&str> = name.trim().split(',').collect();
	segments
		.windows(3)
		.any(|w| w.iter().all(|s| !s.is_empty()))
}

/// Parse a `YYYY-MM-DD_HH-MM-SS` timestamp, falling back to the minimum instant.
pub fn parse_timestamp(raw: Option<&str>) -> NaiveDateTime {
	raw.and_then(|s| NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok())
		.unwrap_or(NaiveDateTime::MIN)
}

impl Submission {
	/// Build a submission from a directory named
	/// `Last,First,Assignment[,YYYY-MM-DD_HH-MM-SS]`.
	///
	/// Feedback is any direct file matching `*<last name>*.doc*`
	/// (case-insensitive) that is not a lock marker.
	pub fn parse_entry(path: &Path, locks: &LockMarker) -> Result<Self, EntryError> {
		if !path.exists() {
			return Err(EntryError::Missing);
		}
		if !path.is_dir() {
			return Err(EntryError::NotADirectory);
		}
		let name = base_name(path);
		if !is_valid_name(&name) {
			return Err(EntryError::InvalidName);
		}

		let mut parts = name.split(',').map(str::trim);
		let (Some(last), Some(first), Some(assignment)) = (parts.next(), parts.next(), parts.next())
		else {
			return Err(EntryError::InvalidName);
		};
		let timestamp = parse_timestamp(parts.next());

		let feedback = find_feedback_files(path, last, locks)?;
		let submission = Self {
			path: path.to_path_buf(),
			last_name: last.to_string(),
			first_name: first.to_string(),
			assignment: assignment.to_string(),
			timestamp,
			feedback: FeedbackRef::from_paths(feedback),
		};
		if submission.feedback.is_multiple() {
			warn!(
				"Submission: {} had multiple feedback files: {:?}",
				submission.full_name(),
				submission.feedback.paths()
			);
		}
		Ok(submission)
	}

	/// `Last, First` for display.
	pub fn full_name(&self) -> String {
		format!("{}, {}", self.last_name, self.first_name)
	}

	pub fn key(&self) -> StudentKey {
		StudentKey::from_names(&self.last_name, &self.first_name)
	}

	pub fn timestamp_string(&self) -> String {
		self.timestamp.format(TIMESTAMP_FORMAT).to_string()
	}

	/// Notify this submission that directory `old` now lives at `new`.
	///
	/// The path and every feedback path are rewritten only when `old` is a
	/// strict component prefix of them.
	pub fn fixup(&mut self, old: &Path, new: &Path) {
		if let Some(moved) = rebase_descendant(&self.path, old, new) {
			self.path = moved;
		}
		self.feedback.rebase(old, new);
	}

	/// Move this submission's directory into `new_dir`.
	///
	/// Only the path of the submission itself is updated; callers owning a
	/// collection must fix up the other submissions afterwards.
	pub fn move_to(&mut self, new_dir: &Path) -> MoveOutcome {
		let outcome = move_into(&self.path, new_dir);
		if let MoveOutcome::Moved { from, to } = &outcome {
			self.feedback.rebase(from, to);
			self.path = to.clone();
		}
		outcome
	}
}

fn find_feedback_files(dir: &Path, last_name: &str, locks: &LockMarker) -> Result<Vec<PathBuf>, EntryError> {
	let pattern = format!("*{}*.doc*", globset::escape(&last_name.to_lowercase()));
	let matcher = GlobBuilder::new(&pattern)
		.case_insensitive(true)
		.literal_separator(true)
		.build()
		.map_err(|_| EntryError::InvalidName)?
		.compile_matcher();

	let entries = fs::read_dir(dir).map_err(|e| EntryError::Unreadable(e.to_string()))?;
	let mut found = Vec::new();
	for entry in entries.flatten() {
		let path = entry.path();
		if !path.is_file() || locks.is_lock_file(&path) {
			continue;
		}
		if matcher.is_match(entry.file_name()) {
			found.push(path);
		}
	}
	found.sort();
	debug!("Submission: {} feedback file(s) in {}", found.len(), dir.display());
	Ok(found)
}
