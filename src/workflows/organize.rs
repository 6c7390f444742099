use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::context::GradingContext;
use crate::error::GradeResult;
use crate::mover::MoveOutcome;
use crate::paths::{base_name, dotted_extension};
use crate::report::{Report, ReportGroup};
use crate::scan::submissions::check_dir;
use crate::workflows::check_file;

fn record_moves(report: &mut Report, outcomes: &[MoveOutcome]) {
	for outcome in outcomes {
		match outcome {
			MoveOutcome::Collision(dest) => report.push(ReportGroup::Skipped, dest.display().to_string()),
			MoveOutcome::Failed { reason } => report.push(ReportGroup::Failed, reason.clone()),
			MoveOutcome::Moved { .. } | MoveOutcome::Unchanged => {}
		}
	}
}

/// Consolidate every submission under `dir` and list the students found.
pub fn organize(ctx: &GradingContext, dir: &Path) -> GradeResult<Report> {
	check_dir(dir)?;
	let consolidated = ctx.consolidate(dir)?;

	let mut report = Report::new(format!("Organized submissions in {}", dir.display()));
	for (_, list) in consolidated.collection.iter() {
		report.push(ReportGroup::Students, list.full_name());
	}
	record_moves(&mut report, &consolidated.moves);
	report.push_issues(&consolidated.issues);
	info!("Organize: {} students", consolidated.collection.len());
	Ok(report)
}

/// Consolidate `dir`, then put a copy of `template` named
/// `<prefix><dir name><template ext>` into each most-recent directory.
pub fn template_to_students(ctx: &GradingContext, template: &Path, dir: &Path, prefix: &str) -> GradeResult<Report> {
	check_file(template)?;
	check_dir(dir)?;
	let consolidated = ctx.consolidate(dir)?;
	let ext = dotted_extension(template);

	let mut report = Report::new(format!("Copied template {} to students", template.display()));
	record_moves(&mut report, &consolidated.moves);
	report.push_issues(&consolidated.issues);
	for (_, list) in consolidated.collection.iter() {
		let recent = &list.most_recent().path;
		let dest = recent.join(format!("{prefix}{}{ext}", base_name(recent)));
		let name = list.full_name();
		if dest.exists() {
			report.push(ReportGroup::AlreadyDone, name);
			continue;
		}
		match fs::copy(template, &dest) {
			Ok(_) => report.push(ReportGroup::Copied, name),
			Err(e) => {
				warn!("Template: copy to {} failed: {e}", dest.display());
				report.push(ReportGroup::Failed, name);
			}
		}
	}
	Ok(report)
}
