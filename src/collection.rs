//! Per-student submission lists and the collection keyed by student

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::identity::StudentKey;
use crate::mover::MoveOutcome;
use crate::submission::Submission;

/// Which submission of a [`SubmissionList`] to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionSlot {
	MostRecent,
	Previous(usize),
}

/// Every submission of one student: the most recent plus the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionList {
	most_recent: Submission,
	previous: Vec<Submission>,
}

impl SubmissionList {
	pub fn new(first: Submission) -> Self {
		Self {
			most_recent: first,
			previous: Vec::new(),
		}
	}

	/// Add a submission, promoting it only if it is strictly newer.
	///
	/// On a timestamp tie the submission seen first stays most recent.
	pub fn add(&mut self, submission: Submission) {
		if submission.timestamp > self.most_recent.timestamp {
			info!(
				"Collection: new most recent for {} at {}",
				submission.full_name(),
				submission.timestamp_string()
			);
			let demoted = std::mem::replace(&mut self.most_recent, submission);
			self.previous.push(demoted);
		} else {
			self.previous.push(submission);
		}
	}

	pub fn most_recent(&self) -> &Submission {
		&self.most_recent
	}

	pub fn previous(&self) -> &[Submission] {
		&self.previous
	}

	pub fn full_name(&self) -> String {
		self.most_recent.full_name()
	}

	/// Most recent first, then previous in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &Submission> {
		std::iter::once(&self.most_recent).chain(self.previous.iter())
	}

	pub fn get(&self, slot: SubmissionSlot) -> Option<&Submission> {
		match slot {
			SubmissionSlot::MostRecent => Some(&self.most_recent),
			SubmissionSlot::Previous(i) => self.previous.get(i),
		}
	}

	fn get_mut(&mut self, slot: SubmissionSlot) -> Option<&mut Submission> {
		match slot {
			SubmissionSlot::MostRecent => Some(&mut self.most_recent),
			SubmissionSlot::Previous(i) => self.previous.get_mut(i),
		}
	}

	pub fn fixup(&mut self, old: &Path, new: &Path) {
		self.most_recent.fixup(old, new);
		for sub in &mut self.previous {
			sub.fixup(old, new);
		}
	}
}

/// Mapping `StudentKey -> SubmissionList` that remembers insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionListCollection {
	lists: Vec<(StudentKey, SubmissionList)>,
	index: HashMap<StudentKey, usize>,
}

impl SubmissionListCollection {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a submission under its own key.
	pub fn add(&mut self, submission: Submission) {
		let key = submission.key();
		self.add_with_key(key, submission);
	}

	pub fn add_with_key(&mut self, key: StudentKey, submission: Submission) {
		match self.index.get(&key) {
			Some(&i) => {
				debug!("Collection: adding to existing list {key}");
				self.lists[i].1.add(submission);
			}
			None => {
				debug!("Collection: new list {key}");
				self.index.insert(key.clone(), self.lists.len());
				self.lists.push((key, SubmissionList::new(submission)));
			}
		}
	}

	pub fn get(&self, key: &StudentKey) -> Option<&SubmissionList> {
		self.index.get(key).map(|&i| &self.lists[i].1)
	}

	pub fn contains(&self, key: &StudentKey) -> bool {
		self.index.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.lists.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lists.is_empty()
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&StudentKey, &SubmissionList)> {
		self.lists.iter().map(|(k, l)| (k, l))
	}

	pub fn keys(&self) -> impl Iterator<Item = &StudentKey> {
		self.lists.iter().map(|(k, _)| k)
	}

	/// Tell every submission that directory `old` now lives at `new`.
	pub fn fixup(&mut self, old: &Path, new: &Path) {
		for (_, list) in &mut self.lists {
			list.fixup(old, new);
		}
	}

	/// Move one submission into `new_dir` and fix up every other path.
	pub fn move_submission(&mut self, key: &StudentKey, slot: SubmissionSlot, new_dir: &Path) -> MoveOutcome {
		let Some(&i) = self.index.get(key) else {
			return MoveOutcome::Failed {
				reason: format!("no submissions for {key}"),
			};
		};
		let Some(submission) = self.lists[i].1.get_mut(slot) else {
			return MoveOutcome::Failed {
				reason: format!("no submission {slot:?} for {key}"),
			};
		};

		let outcome = submission.move_to(new_dir);
		if let MoveOutcome::Moved { from, to } = &outcome {
			self.fixup(from, to);
		}
		outcome
	}

	/// Gather every student's work under `root`.
	///
	/// Each most-recent submission is moved directly into `root`, then every
	/// previous submission is moved inside its student's most-recent
	/// directory. Collisions and failures are logged and skipped.
	pub fn consolidate(&mut self, root: &Path) -> Vec<MoveOutcome> {
		info!("Collection: consolidating {} students into {}", self.len(), root.display());
		let keys: Vec<StudentKey> = self.keys().cloned().collect();
		let mut outcomes = Vec::new();

		for key in &keys {
			outcomes.push(self.move_submission(key, SubmissionSlot::MostRecent, root));
		}

		for key in &keys {
			let Some(list) = self.get(key) else { continue };
			let count = list.previous().len();
			for i in 0..count {
				// re-read after every move: fixups may have rewritten the path
				let Some(target) = self.get(key).map(|l| l.most_recent().path.clone()) else {
					continue;
				};
				let outcome = self.move_submission(key, SubmissionSlot::Previous(i), &target);
				if let MoveOutcome::Collision(dest) = &outcome {
					warn!("Collection: {key}: previous submission already at {}", dest.display());
				}
				outcomes.push(outcome);
			}
		}
		outcomes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::submission::{FeedbackRef, parse_timestamp};
	use std::path::PathBuf;

	fn sub(path: &str, last: &str, first: &str, ts: Option<&str>) -> Submission {
		Submission {
			path: PathBuf::from(path),
			last_name: last.into(),
			first_name: first.into(),
			assignment: "HW1".into(),
			timestamp: parse_timestamp(ts),
			feedback: FeedbackRef::None,
		}
	}

	#[test]
	fn test_most_recent_is_maximum() {
		let mut list = SubmissionList::new(sub("/a", "Smith", "John", Some("2024-01-02_00-00-00")));
		list.add(sub("/b", "Smith", "John", Some("2024-03-01_00-00-00")));
		list.add(sub("/c", "Smith", "John", None));
		list.add(sub("/d", "Smith", "John", Some("2024-02-01_00-00-00")));

		assert_eq!(list.most_recent().path, PathBuf::from("/b"));
		assert!(list.previous().iter().all(|p| p.timestamp <= list.most_recent().timestamp));
		assert_eq!(list.iter().count(), 4);
	}

	#[test]
	fn test_tie_keeps_first_seen() {
		let mut list = SubmissionList::new(sub("/first", "Smith", "John", Some("2024-01-01_00-00-00")));
		list.add(sub("/second", "Smith", "John", Some("2024-01-01_00-00-00")));
		assert_eq!(list.most_recent().path, PathBuf::from("/first"));
		assert_eq!(list.previous()[0].path, PathBuf::from("/second"));
	}

	#[test]
	fn test_collection_merges_dotted_names_and_keeps_order() {
		let mut c = SubmissionListCollection::new();
		c.add(sub("/z", "Zed", "Amy", None));
		c.add(sub("/o1", "O.Brien", "Pat", Some("2024-01-01_00-00-00")));
		c.add(sub("/o2", "OBrien", "Pat", Some("2024-02-01_00-00-00")));

		assert_eq!(c.len(), 2);
		let keys: Vec<&str> = c.keys().map(|k| k.as_str()).collect();
		assert_eq!(keys, vec!["zed,amy", "obrien,pat"]);

		let list = c.get(&StudentKey::new("obrien,pat")).unwrap();
		assert_eq!(list.most_recent().path, PathBuf::from("/o2"));
		assert_eq!(list.previous().len(), 1);
	}

	#[test]
	fn test_fixup_spans_the_collection() {
		let mut c = SubmissionListCollection::new();
		c.add(sub("/hw/old/Smith,John,HW1", "Smith", "John", None));
		c.add(sub("/hw/old-ish/Lee,Ann,HW1", "Lee", "Ann", None));
		c.fixup(Path::new("/hw/old"), Path::new("/hw/new"));

		let smith = c.get(&StudentKey::new("smith,john")).unwrap();
		assert_eq!(smith.most_recent().path, PathBuf::from("/hw/new/Smith,John,HW1"));
		let lee = c.get(&StudentKey::new("lee,ann")).unwrap();
		assert_eq!(lee.most_recent().path, PathBuf::from("/hw/old-ish/Lee,Ann,HW1"));
	}

	#[test]
	fn test_move_submission_unknown_key() {
		let mut c = SubmissionListCollection::new();
		let outcome = c.move_submission(&StudentKey::new("nobody"), SubmissionSlot::MostRecent, Path::new("/tmp"));
		assert!(matches!(outcome, MoveOutcome::Failed { .. }));
	}
}
