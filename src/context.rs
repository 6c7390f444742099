//! Per-invocation bundle of settings, identity rules and lock policy

use std::path::Path;

use tracing::{debug, info};

use crate::collection::SubmissionListCollection;
use crate::config::{AppConfig, MatchSettings};
use crate::error::GradeResult;
use crate::identity::IdentityExtractor;
use crate::lock::LockMarker;
use crate::mover::MoveOutcome;
use crate::reconcile::{self, Placement, ReconciliationResult};
use crate::scan::{FeedbackScanner, ScanIssue, SubmissionScanner};

/// What [`GradingContext::consolidate`] found and did.
#[derive(Debug)]
pub struct Consolidation {
	pub collection: SubmissionListCollection,
	pub moves: Vec<MoveOutcome>,
	pub issues: Vec<ScanIssue>,
}

/// Everything a workflow needs, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct GradingContext {
	pub settings: MatchSettings,
	pub identity: IdentityExtractor,
	pub locks: LockMarker,
	pub feedback: FeedbackScanner,
}

impl GradingContext {
	/// Compile every configured pattern. Fails on the first invalid one.
	pub fn new(settings: MatchSettings) -> GradeResult<Self> {
		let identity = IdentityExtractor::from_settings(&settings)?;
		let locks = LockMarker::new(settings.lock_suffix.clone());
		let feedback = FeedbackScanner::new(&settings, identity.clone(), locks.clone())?;
		debug!("Context: patterns compiled");
		Ok(Self {
			settings,
			identity,
			locks,
			feedback,
		})
	}

	pub fn from_config(config: &AppConfig) -> GradeResult<Self> {
		Self::new(MatchSettings::from_config(config)?)
	}

	pub fn submission_scanner(&self) -> SubmissionScanner {
		SubmissionScanner::new(self.locks.clone())
	}

	/// Scan `root` without moving anything.
	pub fn scan(&self, root: &Path) -> GradeResult<(SubmissionListCollection, Vec<ScanIssue>)> {
		self.submission_scanner().scan_with_issues(root)
	}

	/// Scan `root` and gather each student's work under it.
	pub fn consolidate(&self, root: &Path) -> GradeResult<Consolidation> {
		info!("Context: consolidating {}", root.display());
		let (mut collection, issues) = self.scan(root)?;
		let moves = collection.consolidate(root);
		Ok(Consolidation {
			collection,
			moves,
			issues,
		})
	}

	pub fn reconcile(
		&self,
		original: &SubmissionListCollection,
		revised: &SubmissionListCollection,
	) -> ReconciliationResult {
		reconcile::reconcile(original, revised, &self.settings.disambiguation_dir)
	}

	pub fn apply(&self, result: &ReconciliationResult) -> Vec<Placement> {
		reconcile::apply(result, &self.locks)
	}
}
