//! Console summaries of what a workflow did

use std::fmt;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::lock::CopyOutcome;
use crate::reconcile::{Placement, ReconciliationResult};
use crate::scan::ScanIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportGroup {
	Students,
	Copied,
	Ambiguous,
	NoOriginal,
	NoRevision,
	AlreadyDone,
	Skipped,
	Failed,
}

impl ReportGroup {
	pub const ALL: [ReportGroup; 8] = [
		ReportGroup::Students,
		ReportGroup::Copied,
		ReportGroup::Ambiguous,
		ReportGroup::NoOriginal,
		ReportGroup::NoRevision,
		ReportGroup::AlreadyDone,
		ReportGroup::Skipped,
		ReportGroup::Failed,
	];

	pub fn heading(self) -> &'static str {
		match self {
			ReportGroup::Students => "Students",
			ReportGroup::Copied => "Copied",
			ReportGroup::Ambiguous => "Matched several original feedback files",
			ReportGroup::NoOriginal => "Did not have an original version",
			ReportGroup::NoRevision => "Did not submit a revision",
			ReportGroup::AlreadyDone => "Already done",
			ReportGroup::Skipped => "Skipped",
			ReportGroup::Failed => "Failed",
		}
	}

	fn paint(self, text: &str) -> ColoredString {
		match self {
			ReportGroup::Students => text.cyan().bold(),
			ReportGroup::Copied => text.green().bold(),
			ReportGroup::Ambiguous | ReportGroup::NoRevision | ReportGroup::Skipped => text.yellow().bold(),
			ReportGroup::NoOriginal | ReportGroup::Failed => text.red().bold(),
			ReportGroup::AlreadyDone => text.normal(),
		}
	}
}

/// Named lists of students, each kept sorted case-insensitively and free of
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
	pub title: String,
	students: Vec<String>,
	copied: Vec<String>,
	ambiguous: Vec<String>,
	no_original: Vec<String>,
	no_revision: Vec<String>,
	already_done: Vec<String>,
	skipped: Vec<String>,
	failed: Vec<String>,
}

impl Report {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			..Self::default()
		}
	}

	/// Summarize a reconciliation and the placements made from it.
	pub fn from_reconciliation(title: impl Into<String>, result: &ReconciliationResult, placements: &[Placement]) -> Self {
		let mut report = Self::new(title);
		for entry in result.matched.iter().filter(|e| e.multiple) {
			report.push(ReportGroup::Ambiguous, &entry.student.name);
		}
		for student in &result.right_only {
			report.push(ReportGroup::NoOriginal, &student.name);
		}
		for student in &result.left_only {
			report.push(ReportGroup::NoRevision, &student.name);
		}
		for placement in placements {
			report.push_outcome(&placement.student.name, &placement.outcome);
		}
		report
	}

	pub fn push_outcome(&mut self, name: &str, outcome: &CopyOutcome) {
		let group = match outcome {
			CopyOutcome::Copied => ReportGroup::Copied,
			CopyOutcome::AlreadyLocked | CopyOutcome::TargetExists => ReportGroup::AlreadyDone,
			CopyOutcome::Failed(_) => ReportGroup::Failed,
		};
		self.push(group, name);
	}

	/// Unusable folders go under `Skipped`, students with several feedback
	/// files in one folder under `Ambiguous`.
	pub fn push_issues(&mut self, issues: &[ScanIssue]) {
		for issue in issues {
			match issue {
				ScanIssue::Unparsable { path, .. } | ScanIssue::NotASubmission(path) => {
					self.push(ReportGroup::Skipped, path.display().to_string());
				}
				ScanIssue::MultipleFeedbackFiles { student, .. } => {
					self.push(ReportGroup::Ambiguous, student.as_str());
				}
			}
		}
	}

	pub fn push(&mut self, group: ReportGroup, name: impl Into<String>) {
		let name = name.into();
		let items = self.group_mut(group);
		let key = name.to_lowercase();
		let position = items.binary_search_by(|item| {
			item
				.to_lowercase()
				.cmp(&key)
				.then_with(|| item.as_str().cmp(name.as_str()))
		});
		if let Err(i) = position {
			items.insert(i, name);
		}
	}

	pub fn group(&self, group: ReportGroup) -> &[String] {
		match group {
			ReportGroup::Students => &self.students,
			ReportGroup::Copied => &self.copied,
			ReportGroup::Ambiguous => &self.ambiguous,
			ReportGroup::NoOriginal => &self.no_original,
			ReportGroup::NoRevision => &self.no_revision,
			ReportGroup::AlreadyDone => &self.already_done,
			ReportGroup::Skipped => &self.skipped,
			ReportGroup::Failed => &self.failed,
		}
	}

	fn group_mut(&mut self, group: ReportGroup) -> &mut Vec<String> {
		match group {
			ReportGroup::Students => &mut self.students,
			ReportGroup::Copied => &mut self.copied,
			ReportGroup::Ambiguous => &mut self.ambiguous,
			ReportGroup::NoOriginal => &mut self.no_original,
			ReportGroup::NoRevision => &mut self.no_revision,
			ReportGroup::AlreadyDone => &mut self.already_done,
			ReportGroup::Skipped => &mut self.skipped,
			ReportGroup::Failed => &mut self.failed,
		}
	}

	pub fn is_empty(&self) -> bool {
		ReportGroup::ALL.iter().all(|g| self.group(*g).is_empty())
	}

	pub fn has_failures(&self) -> bool {
		!self.failed.is_empty()
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", self.title.bold())?;
		if self.is_empty() {
			return writeln!(f, "    (nothing to do)");
		}
		for group in ReportGroup::ALL {
			let items = self.group(group);
			if items.is_empty() {
				continue;
			}
			writeln!(f, "{} ({})", group.paint(group.heading()), items.len())?;
			for item in items {
				writeln!(f, "    {item}")?;
			}
		}
		Ok(())
	}
}
