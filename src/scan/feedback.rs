//! Scan for instructor feedback files and LMS submission folders

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::MatchSettings;
use crate::error::GradeResult;
use crate::identity::{IdentityExtractor, StudentKey, compile_pattern};
use crate::lock::LockMarker;
use crate::paths::base_name;
use crate::scan::submissions::check_dir;
use crate::scan::walk::TreeWalker;

/// Feedback file per student, ordered by key.
pub type FeedbackIndex = BTreeMap<StudentKey, PathBuf>;

/// Submission folder per student, ordered by key.
pub type FolderIndex = BTreeMap<StudentKey, PathBuf>;

/// How closely a feedback file name must follow the LMS naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStrictness {
	/// Exactly as the LMS bulk download names them: `name_sid_fileid_...`
	Strict,
	/// Tolerates manual renames: only the student name must lead
	Loose,
}

/// Finds feedback files and submission folders using the configured patterns.
#[derive(Debug, Clone)]
pub struct FeedbackScanner {
	strict: Regex,
	loose: Regex,
	identity: IdentityExtractor,
	locks: LockMarker,
	ignored: Vec<String>,
	folder_marker: String,
}

impl FeedbackScanner {
	pub fn new(settings: &MatchSettings, identity: IdentityExtractor, locks: LockMarker) -> GradeResult<Self> {
		let tail = format!(
			"{}{}{}",
			settings.feedback_marker, settings.optional_submission_number, settings.file_extension
		);
		Ok(Self {
			strict: compile_pattern(&format!("(?i){}{tail}", settings.strict_student_name))?,
			loose: compile_pattern(&format!("(?i){}.*{tail}", settings.student_name))?,
			identity,
			locks,
			ignored: settings
				.ignored_names()
				.iter()
				.filter(|n| !n.is_empty())
				.map(|n| n.to_string())
				.collect(),
			folder_marker: settings.submission_folder_marker.clone(),
		})
	}

	/// Whether `file_name` looks like a feedback file.
	pub fn is_feedback_file(&self, file_name: &str, strictness: FeedbackStrictness) -> bool {
		match strictness {
			FeedbackStrictness::Strict => self.strict.is_match(file_name),
			FeedbackStrictness::Loose => self.loose.is_match(file_name),
		}
	}

	/// Tool-owned output (backups, new-feedback dir, upload archive) and lock markers.
	pub fn is_ignored(&self, path: &Path) -> bool {
		let text = path.to_string_lossy();
		self.ignored.iter().any(|name| text.contains(name.as_str())) || self.locks.is_lock_file(path)
	}

	/// Every feedback file below `root`, one per student.
	///
	/// Files are visited in sorted order; when two files map to the same
	/// student the later one wins and a warning is logged.
	pub fn scan_feedback_files(&self, root: &Path, strictness: FeedbackStrictness) -> GradeResult<FeedbackIndex> {
		check_dir(root)?;
		info!("Feedback: scanning {} ({strictness:?})", root.display());

		let mut index = FeedbackIndex::new();
		let walker = TreeWalker::new(root).dir_filter(|p: &Path| !self.is_ignored(p));
		for entry in walker.into_entries().filter(|e| !e.is_dir) {
			if self.is_ignored(&entry.path) {
				continue;
			}
			let name = base_name(&entry.path);
			if !self.is_feedback_file(&name, strictness) {
				continue;
			}
			let key = match self.identity.extract_key(&name) {
				Ok(key) => key,
				Err(e) => {
					warn!("Feedback: skipping {}: {e}", entry.path.display());
					continue;
				}
			};
			if index.contains_key(&key) {
				warn!("Feedback: multiple feedback files for {key}, keeping {name}");
			}
			debug!("Feedback: {key} -> {}", entry.path.display());
			index.insert(key, entry.path);
		}
		Ok(index)
	}

	/// Direct child directories of `root` named `<student><marker>`.
	pub fn submission_folders(&self, root: &Path) -> GradeResult<FolderIndex> {
		check_dir(root)?;
		let mut folders = FolderIndex::new();
		for entry in TreeWalker::new(root).max_depth(1).into_entries() {
			if !entry.is_dir || self.is_ignored(&entry.path) {
				continue;
			}
			let name = base_name(&entry.path);
			let Some(student) = name.strip_suffix(self.folder_marker.as_str()) else {
				continue;
			};
			match self.identity.extract_key(student) {
				Ok(key) => {
					debug!("Feedback: submission folder {key} -> {name}");
					folders.insert(key, entry.path);
				}
				Err(e) => warn!("Feedback: skipping folder {name}: {e}"),
			}
		}
		Ok(folders)
	}
}
