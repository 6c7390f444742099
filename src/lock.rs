//! Lock markers: empty sentinel files recording that a target was already written

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::paths::{base_name, sanitize_file_name};

/// Result of a guarded copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CopyOutcome {
	Copied,
	/// A marker was already present; the target was left untouched
	AlreadyLocked,
	/// The target already existed before any copy was attempted
	TargetExists,
	/// The copy failed and the marker was rolled back
	Failed(String),
}

impl CopyOutcome {
	pub fn is_copied(&self) -> bool {
		matches!(self, CopyOutcome::Copied)
	}
}

/// Naming and lifecycle of lock markers.
///
/// The marker for `dir/file.docx` is `dir/<sanitized "file.docx" + suffix>.txt`.
/// Its existence is the only signal; markers are never removed except to roll
/// back a copy that failed after the marker was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockMarker {
	suffix: String,
}

impl LockMarker {
	pub fn new(suffix: impl Into<String>) -> Self {
		Self {
			suffix: suffix.into(),
		}
	}

	pub fn suffix(&self) -> &str {
		&self.suffix
	}

	pub fn marker_path(&self, target: &Path) -> PathBuf {
		let name = sanitize_file_name(&format!("{}{}", base_name(target), self.suffix));
		target.with_file_name(format!("{name}.txt"))
	}

	pub fn is_locked(&self, target: &Path) -> bool {
		self.marker_path(target).exists()
	}

	/// Whether `path` is itself a marker. Scanners use this to skip them.
	pub fn is_lock_file(&self, path: &Path) -> bool {
		let suffix = sanitize_file_name(&self.suffix);
		!suffix.is_empty() && base_name(path).contains(&suffix)
	}

	/// Create the marker for `target`, creating parent directories as needed.
	pub fn lock(&self, target: &Path) -> io::Result<PathBuf> {
		let marker = self.marker_path(target);
		if let Some(parent) = marker.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::File::create(&marker)?;
		debug!("Lock: created {}", marker.display());
		Ok(marker)
	}

	pub fn unlock(&self, target: &Path) -> io::Result<()> {
		fs::remove_file(self.marker_path(target))
	}

	/// Copy `src` to `dest` at most once.
	///
	/// A locked target is left alone. Otherwise the marker is created first,
	/// then the file is copied; if the copy fails the marker is removed so a
	/// later run retries. Never returns [`CopyOutcome::TargetExists`].
	pub fn copy_with_lock(&self, src: &Path, dest: &Path) -> CopyOutcome {
		if self.is_locked(dest) {
			debug!("Lock: already copied {}", dest.display());
			return CopyOutcome::AlreadyLocked;
		}

		if let Err(e) = self.lock(dest) {
			warn!("Lock: could not create marker for {}: {e}", dest.display());
			return CopyOutcome::Failed(e.to_string());
		}

		match fs::copy(src, dest) {
			Ok(_) => {
				info!("Lock: copied {} -> {}", src.display(), dest.display());
				CopyOutcome::Copied
			}
			Err(e) => {
				warn!("Lock: copy {} -> {} failed: {e}", src.display(), dest.display());
				if let Err(rollback) = self.unlock(dest) {
					warn!("Lock: rollback of marker for {} failed: {rollback}", dest.display());
				}
				CopyOutcome::Failed(e.to_string())
			}
		}
	}
}
