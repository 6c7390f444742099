use std::path::Path;

use tracing::info;

use crate::context::GradingContext;
use crate::error::GradeResult;
use crate::mover::MoveOutcome;
use crate::paths::dotted_extension;
use crate::reconcile::split_keys;
use crate::report::{Report, ReportGroup};
use crate::scan::FeedbackStrictness;
use crate::scan::submissions::check_dir;

/// Copy the feedback of each original submission into the student's revision.
///
/// Originals are scanned in place; revisions are consolidated first.
pub fn copy_revision_feedback(ctx: &GradingContext, originals: &Path, revisions: &Path) -> GradeResult<Report> {
	check_dir(originals)?;
	check_dir(revisions)?;
	info!(
		"Revision: copying feedback from {} to {}",
		originals.display(),
		revisions.display()
	);

	let (original, original_issues) = ctx.scan(originals)?;
	let revised = ctx.consolidate(revisions)?;
	let result = ctx.reconcile(&original, &revised.collection);
	let placements = ctx.apply(&result);

	let mut report = Report::from_reconciliation(
		format!("Copied original feedback into {}", revisions.display()),
		&result,
		&placements,
	);
	report.push_issues(&original_issues);
	report.push_issues(&revised.issues);
	for outcome in &revised.moves {
		if let MoveOutcome::Collision(dest) = outcome {
			report.push(ReportGroup::Skipped, dest.display().to_string());
		}
	}
	Ok(report)
}

/// Copy each student's previous feedback file over the feedback file of
/// their new LMS submission folder.
///
/// A student whose new folder has no feedback file gets one named
/// `<key><slug><original ext>` inside that folder.
pub fn copy_feedback_to_revision(ctx: &GradingContext, src: &Path, dest: &Path) -> GradeResult<Report> {
	check_dir(src)?;
	check_dir(dest)?;
	info!("Revision: copying feedback files from {} to {}", src.display(), dest.display());

	let originals = ctx.feedback.scan_feedback_files(src, FeedbackStrictness::Loose)?;
	let mut revisions = ctx.feedback.scan_feedback_files(dest, FeedbackStrictness::Loose)?;
	let folders = ctx.feedback.submission_folders(dest)?;

	for (key, folder) in &folders {
		if revisions.contains_key(key) {
			continue;
		}
		if let Some(original) = originals.get(key) {
			let target = folder.join(format!(
				"{key}{}{}",
				ctx.settings.feedback_slug,
				dotted_extension(original)
			));
			revisions.insert(key.clone(), target);
		}
	}

	let mut report = Report::new(format!("Copied previous feedback into {}", dest.display()));
	let split = split_keys(originals.keys().cloned(), revisions.keys().cloned());
	for key in &split.right_only {
		report.push(ReportGroup::NoOriginal, key.as_str());
	}
	for key in &split.both {
		if let (Some(original), Some(target)) = (originals.get(key), revisions.get(key)) {
			let outcome = ctx.locks.copy_with_lock(original, target);
			report.push_outcome(key.as_str(), &outcome);
		}
	}
	for key in &split.left_only {
		report.push(ReportGroup::NoRevision, key.as_str());
	}
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::MatchSettings;
	use std::fs;
	use std::path::PathBuf;
	use tempfile::TempDir;

	fn ctx() -> GradingContext {
		GradingContext::new(MatchSettings::default()).unwrap()
	}

	fn write(path: PathBuf, contents: &str) -> PathBuf {
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(&path, contents).unwrap();
		path
	}

	#[test_log::test]
	fn test_copy_revision_feedback_end_to_end() {
		let originals = TempDir::new().unwrap();
		let revisions = TempDir::new().unwrap();
		write(
			originals.path().join("Smith,John,HW1,2024-01-01_10-00-00").join("Smith_FEEDBACK.docx"),
			"smith feedback",
		);
		// two earlier versions, each graded with a file of the same name
		write(
			originals.path().join("Lee,Ann,HW1,2024-01-01_10-00-00").join("Lee_FEEDBACK.docx"),
			"first",
		);
		write(
			originals.path().join("Lee,Ann,HW1,2024-01-10_10-00-00").join("Lee_FEEDBACK.docx"),
			"second",
		);
		// revisions arrive nested; consolidation lifts them to the root
		let smith_rev = revisions.path().join("Smith,John,HW1,2024-02-01_09-00-00");
		fs::create_dir_all(revisions.path().join("download").join("Smith,John,HW1,2024-02-01_09-00-00")).unwrap();
		let lee_rev = revisions.path().join("Lee,Ann,HW1,2024-02-01_09-00-00");
		fs::create_dir_all(&lee_rev).unwrap();
		fs::create_dir_all(revisions.path().join("Jones,Bob,HW1,2024-02-01_09-00-00")).unwrap();

		let report = copy_revision_feedback(&ctx(), originals.path(), revisions.path()).unwrap();
		assert_eq!(report.group(ReportGroup::Copied), ["Lee, Ann", "Smith, John"]);
		assert_eq!(report.group(ReportGroup::Ambiguous), ["Lee, Ann"]);
		assert_eq!(report.group(ReportGroup::NoOriginal), ["Jones, Bob"]);

		assert_eq!(
			fs::read_to_string(smith_rev.join("Smith,John,HW1,2024-02-01_09-00-00.docx")).unwrap(),
			"smith feedback"
		);
		let disambiguation = lee_rev.join("ORIGINAL_FEEDBACKS");
		assert_eq!(
			fs::read_to_string(disambiguation.join("Lee_FEEDBACK.docx")).unwrap(),
			"second"
		);
		assert_eq!(
			fs::read_to_string(disambiguation.join("Lee,Ann,HW1,2024-01-01_10-00-00_Lee_FEEDBACK.docx")).unwrap(),
			"first"
		);
		assert!(report.group(ReportGroup::AlreadyDone).is_empty());
		assert_eq!(
			report.group(ReportGroup::Skipped),
			[revisions.path().join("download").display().to_string()]
		);

		let again = copy_revision_feedback(&ctx(), originals.path(), revisions.path()).unwrap();
		assert!(again.group(ReportGroup::Copied).is_empty());
		assert_eq!(again.group(ReportGroup::AlreadyDone), ["Lee, Ann", "Smith, John"]);
	}

	#[test_log::test]
	fn test_copy_feedback_to_revision() {
		let src = TempDir::new().unwrap();
		let dest = TempDir::new().unwrap();
		write(
			src.path().join("smithjohn_1_SUBMISSION").join("smithjohn_1_2_INSTRUCTORFEEDBACK.docx"),
			"graded smith",
		);
		write(
			src.path().join("kimsue_3_SUBMISSION").join("kimsue_3_4_INSTRUCTORFEEDBACK.docx"),
			"graded kim",
		);
		// lee uploaded a feedback file but has no original
		write(
			dest.path().join("leeann_5_SUBMISSION").join("leeann_5_6_INSTRUCTORFEEDBACK.docx"),
			"blank",
		);
		// smith's revision came without a feedback file
		let smith_folder = dest.path().join("smithjohn_1_SUBMISSION");
		fs::create_dir_all(&smith_folder).unwrap();

		let report = copy_feedback_to_revision(&ctx(), src.path(), dest.path()).unwrap();
		assert_eq!(report.group(ReportGroup::Copied), ["smithjohn_1"]);
		assert_eq!(report.group(ReportGroup::NoOriginal), ["leeann_5"]);
		assert_eq!(report.group(ReportGroup::NoRevision), ["kimsue_3"]);

		let synthesized = smith_folder.join("smithjohn_1_INSTRUCTORFEEDBACK.docx");
		assert_eq!(fs::read_to_string(&synthesized).unwrap(), "graded smith");

		let again = copy_feedback_to_revision(&ctx(), src.path(), dest.path()).unwrap();
		assert_eq!(again.group(ReportGroup::AlreadyDone), ["smithjohn_1"]);
	}
}
