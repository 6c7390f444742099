use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::GradeResult;
use crate::paths::base_name;
use crate::report::{Report, ReportGroup};
use crate::scan::TreeWalker;
use crate::scan::submissions::check_dir;

/// Length of the longest common substring of `a` and `b`, ignoring case.
pub fn longest_common_substring_len(a: &str, b: &str) -> usize {
	let a: Vec<char> = a.to_lowercase().chars().collect();
	let b: Vec<char> = b.to_lowercase().chars().collect();
	let mut previous = vec![0usize; b.len() + 1];
	let mut current = vec![0usize; b.len() + 1];
	let mut best = 0;
	for ca in &a {
		for (j, cb) in b.iter().enumerate() {
			current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
			best = best.max(current[j + 1]);
		}
		std::mem::swap(&mut previous, &mut current);
	}
	best
}

/// Student directory whose name shares the longest substring with `file_name`.
/// Later directories win ties.
fn best_match<'a>(file_name: &str, dirs: &'a [PathBuf]) -> Option<(&'a PathBuf, usize)> {
	dirs.iter()
		.map(|dir| (dir, longest_common_substring_len(&base_name(dir), file_name)))
		.fold(None, |best, next| match best {
			Some((_, len)) if len > next.1 => best,
			_ => Some(next),
		})
}

/// Move each file directly inside `from` into the best-matching student
/// directory directly inside `to`.
///
/// When `confirm` is given it is asked `(file, dir)` before every move.
pub fn distribute_feedback(
	from: &Path,
	to: &Path,
	mut confirm: Option<&mut dyn FnMut(&Path, &Path) -> bool>,
) -> GradeResult<Report> {
	check_dir(from)?;
	check_dir(to)?;
	info!("Distribute: moving feedback from {} into {}", from.display(), to.display());

	let files: Vec<PathBuf> = TreeWalker::new(from)
		.max_depth(1)
		.into_entries()
		.filter(|e| !e.is_dir)
		.map(|e| e.path)
		.collect();
	let dirs: Vec<PathBuf> = TreeWalker::new(to)
		.max_depth(1)
		.into_entries()
		.filter(|e| e.is_dir)
		.map(|e| e.path)
		.collect();

	let mut report = Report::new(format!("Moved feedback into {}", to.display()));
	for file in &files {
		let name = base_name(file);
		let Some((dir, len)) = best_match(&name, &dirs).filter(|(_, len)| *len > 0) else {
			warn!("Distribute: no student directory resembles {name}");
			report.push(ReportGroup::Skipped, name);
			continue;
		};
		debug!("Distribute: {name} -> {} ({len} chars in common)", dir.display());

		if let Some(ask) = confirm.as_mut()
			&& !ask(file.as_path(), dir.as_path())
		{
			report.push(ReportGroup::Skipped, name);
			continue;
		}

		let dest = dir.join(&name);
		if dest.exists() {
			warn!("Distribute: {} already exists", dest.display());
			report.push(ReportGroup::AlreadyDone, name);
			continue;
		}
		match fs::rename(file, &dest) {
			Ok(()) => report.push(ReportGroup::Copied, name),
			Err(e) => {
				warn!("Distribute: moving {} failed: {e}", file.display());
				report.push(ReportGroup::Failed, name);
			}
		}
	}
	Ok(report)
}
