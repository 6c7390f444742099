//! Pair original feedback with revised submissions, student by student

use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collection::{SubmissionList, SubmissionListCollection};
use crate::identity::StudentKey;
use crate::lock::{CopyOutcome, LockMarker};
use crate::paths::{base_name, dotted_extension};

/// Three-way split of two key sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySplit<K> {
	/// In both, in `right` order
	pub both: Vec<K>,
	/// Only in `left`, in `left` order
	pub left_only: Vec<K>,
	/// Only in `right`, in `right` order
	pub right_only: Vec<K>,
}

pub fn split_keys<K, L, R>(left: L, right: R) -> KeySplit<K>
where
	K: Eq + Hash + Clone,
	L: IntoIterator<Item = K>,
	R: IntoIterator<Item = K>,
{
	let left: Vec<K> = left.into_iter().collect();
	let right: Vec<K> = right.into_iter().collect();
	let left_set: HashSet<&K> = left.iter().collect();
	let right_set: HashSet<&K> = right.iter().collect();

	let mut split = KeySplit {
		both: Vec::new(),
		left_only: Vec::new(),
		right_only: Vec::new(),
	};
	for key in &right {
		if left_set.contains(key) {
			split.both.push(key.clone());
		} else {
			split.right_only.push(key.clone());
		}
	}
	split.left_only = left.iter().filter(|k| !right_set.contains(k)).cloned().collect();
	split
}

/// A student as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRef {
	pub key: StudentKey,
	pub name: String,
}

impl StudentRef {
	fn of(key: &StudentKey, list: &SubmissionList) -> Self {
		Self {
			key: key.clone(),
			name: list.full_name(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyInstruction {
	pub source: PathBuf,
	pub target: PathBuf,
}

/// A student present on both sides with at least one original feedback file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedEntry {
	pub student: StudentRef,
	pub revised_dir: PathBuf,
	pub instructions: Vec<CopyInstruction>,
	/// More than one original feedback file was found
	pub multiple: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
	pub matched: Vec<MatchedEntry>,
	/// Originals with no revision submitted
	pub left_only: Vec<StudentRef>,
	/// Revisions with no original feedback
	pub right_only: Vec<StudentRef>,
}

/// The outcome of carrying out one [`CopyInstruction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
	pub student: StudentRef,
	pub instruction: CopyInstruction,
	pub multiple: bool,
	pub outcome: CopyOutcome,
}

/// Feedback artifacts of a list: most recent first, then previous.
fn feedback_artifacts(list: &SubmissionList) -> Vec<PathBuf> {
	list.iter()
		.flat_map(|sub| sub.feedback.paths().iter().cloned())
		.collect()
}

/// Plan how original feedback reaches each revised submission.
///
/// A single original file is renamed after the revised directory so that
/// repeated runs always aim at the same target. Several originals are
/// copied into `disambiguation_dir` inside the revised directory, each to a
/// distinct target.
pub fn reconcile(
	original: &SubmissionListCollection,
	revised: &SubmissionListCollection,
	disambiguation_dir: &str,
) -> ReconciliationResult {
	let split = split_keys(original.keys().cloned(), revised.keys().cloned());
	let mut result = ReconciliationResult::default();

	for key in revised.keys() {
		let Some(new_list) = revised.get(key) else { continue };
		let student = StudentRef::of(key, new_list);

		let artifacts = original.get(key).map(feedback_artifacts).unwrap_or_default();
		if artifacts.is_empty() {
			warn!("Reconcile: {} did not have an original version", student.name);
			result.right_only.push(student);
			continue;
		}

		let revised_dir = new_list.most_recent().path.clone();
		let multiple = artifacts.len() > 1;
		let instructions = if multiple {
			warn!(
				"Reconcile: {} matched {} original feedback files",
				student.name,
				artifacts.len()
			);
			disambiguated_instructions(&revised_dir.join(disambiguation_dir), artifacts)
		} else {
			artifacts
				.into_iter()
				.map(|source| CopyInstruction {
					target: renamed_target(&revised_dir, &source),
					source,
				})
				.collect()
		};
		debug!("Reconcile: {key} -> {}", revised_dir.display());
		result.matched.push(MatchedEntry {
			student,
			revised_dir,
			instructions,
			multiple,
		});
	}

	for key in &split.left_only {
		if let Some(list) = original.get(key) {
			result.left_only.push(StudentRef::of(key, list));
		}
	}

	info!(
		"Reconcile: {} matched, {} without revision, {} without original",
		result.matched.len(),
		result.left_only.len(),
		result.right_only.len()
	);
	result
}

/// One instruction per artifact, all inside `dir`.
///
/// An artifact keeps its own file name unless an earlier artifact already
/// claimed it; then the name of the submission folder holding it is
/// prepended, and a counter after that. Artifacts arrive in scan order, so
/// every run picks the same targets.
fn disambiguated_instructions(dir: &Path, artifacts: Vec<PathBuf>) -> Vec<CopyInstruction> {
	let mut taken = HashSet::new();
	artifacts
		.into_iter()
		.map(|source| {
			let name = base_name(&source);
			let ext = dotted_extension(&source);
			let mut candidate = name.clone();
			if taken.contains(&candidate.to_lowercase()) {
				let folder = source.parent().map(base_name).unwrap_or_default();
				candidate = format!("{folder}_{name}");
			}
			let stem = candidate.strip_suffix(ext.as_str()).unwrap_or(&candidate).to_string();
			let mut n = 1;
			while taken.contains(&candidate.to_lowercase()) {
				candidate = format!("{stem}_{n}{ext}");
				n += 1;
			}
			taken.insert(candidate.to_lowercase());
			CopyInstruction {
				target: dir.join(candidate),
				source,
			}
		})
		.collect()
}

/// `<dir>/<dir base name><source ext>`
fn renamed_target(dir: &Path, source: &Path) -> PathBuf {
	dir.join(format!("{}{}", base_name(dir), dotted_extension(source)))
}

/// Carry out every instruction of `result`. Existing targets are never overwritten.
pub fn apply(result: &ReconciliationResult, locks: &LockMarker) -> Vec<Placement> {
	let mut placements = Vec::new();
	for entry in &result.matched {
		for instruction in &entry.instructions {
			let outcome = if instruction.target.exists() {
				debug!("Reconcile: {} already had a revision document", entry.student.name);
				CopyOutcome::TargetExists
			} else {
				locks.copy_with_lock(&instruction.source, &instruction.target)
			};
			placements.push(Placement {
				student: entry.student.clone(),
				instruction: instruction.clone(),
				multiple: entry.multiple,
				outcome,
			});
		}
	}
	placements
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scan::SubmissionScanner;
	use std::fs;
	use tempfile::TempDir;

	const DISAMBIGUATION: &str = "ORIGINAL_FEEDBACKS";

	fn locks() -> LockMarker {
		LockMarker::new("_ALREADY_COPIED")
	}

	fn scan(root: &Path) -> SubmissionListCollection {
		SubmissionScanner::new(locks()).scan(root).unwrap()
	}

	fn submission(root: &Path, name: &str, files: &[&str]) -> PathBuf {
		let dir = root.join(name);
		fs::create_dir_all(&dir).unwrap();
		for f in files {
			fs::write(dir.join(f), format!("contents of {f}")).unwrap();
		}
		dir
	}

	#[test]
	fn test_split_keys() {
		let split = split_keys(vec!["a", "b", "c"], vec!["c", "d", "a"]);
		assert_eq!(split.both, vec!["c", "a"]);
		assert_eq!(split.left_only, vec!["b"]);
		assert_eq!(split.right_only, vec!["d"]);
	}

	#[test_log::test]
	fn test_single_original_is_renamed_after_revised_dir() {
		let originals = TempDir::new().unwrap();
		let revisions = TempDir::new().unwrap();
		submission(originals.path(), "Smith,John,HW1,2024-01-01_10-00-00", &["Smith_FEEDBACK.docx"]);
		let revised = submission(revisions.path(), "Smith,John,HW1,2024-02-01_09-00-00", &[]);

		let result = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		assert_eq!(result.matched.len(), 1);
		assert!(result.left_only.is_empty() && result.right_only.is_empty());

		let placements = apply(&result, &locks());
		assert_eq!(placements.len(), 1);
		assert_eq!(placements[0].outcome, CopyOutcome::Copied);
		let expected = revised.join("Smith,John,HW1,2024-02-01_09-00-00.docx");
		assert_eq!(
			fs::read_to_string(&expected).unwrap(),
			"contents of Smith_FEEDBACK.docx"
		);
	}

	#[test_log::test]
	fn test_revision_without_original() {
		let originals = TempDir::new().unwrap();
		let revisions = TempDir::new().unwrap();
		submission(originals.path(), "Smith,John,HW1,2024-01-01_10-00-00", &["Smith_FEEDBACK.docx"]);
		// an original that never got feedback counts as no original at all
		submission(originals.path(), "Kim,Sue,HW1,2024-01-01_10-00-00", &[]);
		submission(revisions.path(), "Jones,Ann,HW1,2024-02-01_09-00-00", &[]);
		submission(revisions.path(), "Kim,Sue,HW1,2024-02-01_09-00-00", &[]);

		let result = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		assert!(result.matched.is_empty());
		let right: Vec<&str> = result.right_only.iter().map(|s| s.name.as_str()).collect();
		assert_eq!(right, vec!["Jones, Ann", "Kim, Sue"]);
		let left: Vec<&str> = result.left_only.iter().map(|s| s.name.as_str()).collect();
		assert_eq!(left, vec!["Smith, John"]);
	}

	#[test_log::test]
	fn test_several_originals_go_to_disambiguation_dir() {
		let originals = TempDir::new().unwrap();
		let revisions = TempDir::new().unwrap();
		submission(originals.path(), "Lee,Ann,HW1,2024-01-01_10-00-00", &["lee_a.docx", "lee_b.docx"]);
		let revised = submission(revisions.path(), "Lee,Ann,HW1,2024-02-01_09-00-00", &[]);

		let result = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		assert_eq!(result.matched.len(), 1);
		assert!(result.matched[0].multiple);

		let placements = apply(&result, &locks());
		assert!(placements.iter().all(|p| p.outcome.is_copied() && p.multiple));
		assert!(revised.join(DISAMBIGUATION).join("lee_a.docx").is_file());
		assert!(revised.join(DISAMBIGUATION).join("lee_b.docx").is_file());
	}

	#[test_log::test]
	fn test_same_named_originals_from_several_submissions_all_arrive() {
		let originals = TempDir::new().unwrap();
		let revisions = TempDir::new().unwrap();
		let v1 = submission(originals.path(), "Lee,Kim,HW1,2024-01-01_10-00-00", &[]);
		let v2 = submission(originals.path(), "Lee,Kim,HW1,2024-01-15_10-00-00", &[]);
		fs::write(v1.join("Lee_FEEDBACK.docx"), "v1").unwrap();
		fs::write(v2.join("Lee_FEEDBACK.docx"), "v2").unwrap();
		let revised = submission(revisions.path(), "Lee,Kim,HW1,2024-02-01_09-00-00", &[]);

		let result = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		assert_eq!(result.matched.len(), 1);
		assert!(result.matched[0].multiple);
		assert!(result.left_only.is_empty() && result.right_only.is_empty());

		let placements = apply(&result, &locks());
		assert_eq!(placements.len(), 2);
		assert!(placements.iter().all(|p| p.outcome == CopyOutcome::Copied));

		let dir = revised.join(DISAMBIGUATION);
		assert_eq!(fs::read_to_string(dir.join("Lee_FEEDBACK.docx")).unwrap(), "v2");
		assert_eq!(
			fs::read_to_string(dir.join("Lee,Kim,HW1,2024-01-01_10-00-00_Lee_FEEDBACK.docx")).unwrap(),
			"v1"
		);

		// a second run aims at the same targets and leaves them alone
		let again = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		assert_eq!(again, result);
		assert!(
			apply(&again, &locks())
				.iter()
				.all(|p| p.outcome == CopyOutcome::TargetExists)
		);
	}

	#[test]
	fn test_disambiguated_targets_are_distinct() {
		let dir = Path::new("/r/Lee,Kim/ORIGINAL_FEEDBACKS");
		let instructions = disambiguated_instructions(
			dir,
			vec![
				PathBuf::from("/o/b/Lee_FEEDBACK.docx"),
				PathBuf::from("/o/a/Lee_FEEDBACK.docx"),
				PathBuf::from("/x/a/lee_feedback.docx"),
				PathBuf::from("/o/a/notes.doc"),
			],
		);
		let targets: Vec<PathBuf> = instructions.into_iter().map(|i| i.target).collect();
		assert_eq!(
			targets,
			vec![
				dir.join("Lee_FEEDBACK.docx"),
				dir.join("a_Lee_FEEDBACK.docx"),
				dir.join("a_lee_feedback_1.docx"),
				dir.join("notes.doc"),
			]
		);
	}

	#[test_log::test]
	fn test_apply_is_idempotent() {
		let originals = TempDir::new().unwrap();
		let revisions = TempDir::new().unwrap();
		submission(originals.path(), "Smith,John,HW1,2024-01-01_10-00-00", &["Smith_FEEDBACK.docx"]);
		let revised = submission(revisions.path(), "Smith,John,HW1,2024-02-01_09-00-00", &[]);

		let first = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		apply(&first, &locks());
		let target = revised.join("Smith,John,HW1,2024-02-01_09-00-00.docx");
		fs::write(&target, "graded").unwrap();

		let second = reconcile(&scan(originals.path()), &scan(revisions.path()), DISAMBIGUATION);
		assert_eq!(first, second);
		let placements = apply(&second, &locks());
		assert_eq!(placements[0].outcome, CopyOutcome::TargetExists);
		assert_eq!(fs::read_to_string(&target).unwrap(), "graded");
	}
}
