//! Directory moves that never overwrite

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

/// Result of moving one submission directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MoveOutcome {
	Moved { from: PathBuf, to: PathBuf },
	/// Already a direct child of the destination
	Unchanged,
	/// Something already exists at the destination; nothing was moved
	Collision(PathBuf),
	Failed { reason: String },
}

impl MoveOutcome {
	pub fn is_moved(&self) -> bool {
		matches!(self, MoveOutcome::Moved { .. })
	}
}

/// Move `path` into `new_dir`, keeping its base name.
pub fn move_into(path: &Path, new_dir: &Path) -> MoveOutcome {
	let Some(name) = path.file_name() else {
		return MoveOutcome::Failed {
			reason: format!("no file name: {}", path.display()),
		};
	};
	if path.parent() == Some(new_dir) {
		return MoveOutcome::Unchanged;
	}

	let dest = new_dir.join(name);
	if dest.exists() {
		warn!("Mover: destination already exists, skipping {}", dest.display());
		return MoveOutcome::Collision(dest);
	}

	if let Err(e) = fs::create_dir_all(new_dir).and_then(|_| fs::rename(path, &dest)) {
		warn!("Mover: move {} -> {} failed: {e}", path.display(), dest.display());
		return MoveOutcome::Failed {
			reason: e.to_string(),
		};
	}

	info!("Mover: moved {} -> {}", path.display(), dest.display());
	MoveOutcome::Moved {
		from: path.to_path_buf(),
		to: dest,
	}
}
