use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::context::GradingContext;
use crate::error::GradeResult;
use crate::lock::CopyOutcome;
use crate::paths::{base_name, dotted_extension, unique_file_name};
use crate::report::{Report, ReportGroup};
use crate::scan::submissions::check_dir;
use crate::scan::{FeedbackStrictness, TreeWalker};
use crate::workflows::check_file;

/// Put the grading template in place of every LMS-generated feedback file
/// under `dir`, and create one in each submission folder that lacks it.
pub fn copy_template(ctx: &GradingContext, dir: &Path, template: &Path) -> GradeResult<Report> {
	check_dir(dir)?;
	check_file(template)?;
	info!("Template: copying {} into {}", template.display(), dir.display());

	let mut report = Report::new(format!("Copied template {}", template.display()));
	let existing = ctx.feedback.scan_feedback_files(dir, FeedbackStrictness::Strict)?;
	for (key, path) in &existing {
		let outcome = ctx.locks.copy_with_lock(template, path);
		report.push_outcome(key.as_str(), &outcome);
	}

	let ext = dotted_extension(template);
	let folders = ctx.feedback.submission_folders(dir)?;
	for (key, folder) in folders.iter().filter(|(k, _)| !existing.contains_key(*k)) {
		let name = format!(
			"{}{}{ext}",
			ctx.identity.name_and_sid(key.as_str()),
			ctx.settings.feedback_slug
		);
		debug!("Template: {key} had no feedback file, creating {name}");
		let outcome = ctx.locks.copy_with_lock(template, &folder.join(name));
		report.push_outcome(key.as_str(), &outcome);
	}
	Ok(report)
}

/// Put a copy of `template` named `<template stem>-<subdir name><template ext>`
/// into every directory directly inside `dir`.
pub fn copy_template_to_subdirs(ctx: &GradingContext, dir: &Path, template: &Path) -> GradeResult<Report> {
	check_dir(dir)?;
	check_file(template)?;
	info!("Template: copying {} into the subdirectories of {}", template.display(), dir.display());

	let stem = template
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_default();
	let ext = dotted_extension(template);

	let mut report = Report::new(format!("Copied template {} into subdirectories", template.display()));
	let subdirs: Vec<PathBuf> = TreeWalker::new(dir)
		.max_depth(1)
		.into_entries()
		.filter(|e| e.is_dir)
		.map(|e| e.path)
		.collect();
	if subdirs.is_empty() {
		warn!("Template: no subdirectories in {}", dir.display());
	}
	for subdir in &subdirs {
		let name = base_name(subdir);
		let outcome = ctx.locks.copy_with_lock(template, &subdir.join(format!("{stem}-{name}{ext}")));
		report.push_outcome(&name, &outcome);
	}
	Ok(report)
}

/// Overwrite every feedback file under `dir` with `template`, keeping a
/// numbered backup of each one in a backup folder next to it.
pub fn replace_feedback_files(ctx: &GradingContext, dir: &Path, template: &Path) -> GradeResult<Report> {
	check_dir(dir)?;
	check_file(template)?;
	info!("Template: replacing feedback files under {}", dir.display());

	let backup_dir = ctx.settings.backup_dir.clone();
	let walker = TreeWalker::new(dir).dir_filter(|p: &Path| base_name(p) != backup_dir);

	let mut report = Report::new(format!("Replaced feedback files with {}", template.display()));
	for entry in walker.into_entries().filter(|e| !e.is_dir) {
		let name = base_name(&entry.path);
		if ctx.locks.is_lock_file(&entry.path)
			|| !ctx.feedback.is_feedback_file(&name, FeedbackStrictness::Loose)
		{
			continue;
		}
		let outcome = replace_one(ctx, &entry.path, template, &backup_dir);
		report.push_outcome(&name, &outcome);
	}
	Ok(report)
}

fn replace_one(ctx: &GradingContext, target: &Path, template: &Path, backup_dir: &str) -> CopyOutcome {
	if ctx.locks.is_locked(target) {
		return CopyOutcome::AlreadyLocked;
	}
	if let Err(e) = ctx.locks.lock(target) {
		warn!("Template: could not lock {}: {e}", target.display());
		return CopyOutcome::Failed(e.to_string());
	}

	match backup_and_overwrite(target, template, backup_dir) {
		Ok(backup) => {
			info!("Template: replaced {} (backup {})", target.display(), backup.display());
			CopyOutcome::Copied
		}
		Err(e) => {
			warn!("Template: replacing {} failed: {e}", target.display());
			if let Err(rollback) = ctx.locks.unlock(target) {
				warn!("Template: rollback of lock for {} failed: {rollback}", target.display());
			}
			CopyOutcome::Failed(e.to_string())
		}
	}
}

fn backup_and_overwrite(target: &Path, template: &Path, backup_dir: &str) -> GradeResult<PathBuf> {
	let parent = target.parent().unwrap_or(Path::new("."));
	let backups = parent.join(backup_dir);
	fs::create_dir_all(&backups)?;
	let backup = unique_file_name(&backups.join(base_name(target)), true)?;
	fs::copy(target, &backup)?;
	fs::copy(template, target)?;
	Ok(backup)
}
