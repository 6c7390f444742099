//! Sorted, filterable directory tree walk

use std::path::{Path, PathBuf};

use tracing::{trace, warn};
use walkdir::WalkDir;

/// One entry found below the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
	pub path: PathBuf,
	pub is_dir: bool,
	/// 1 for direct children of the root
	pub depth: usize,
}

/// Walks everything below a root, never yielding the root itself.
///
/// Entries are sorted by file name so results do not depend on the platform's
/// directory order. Directories rejected by the filter are neither yielded
/// nor descended into.
pub struct TreeWalker<F> {
	root: PathBuf,
	max_depth: Option<usize>,
	follow_links: bool,
	dir_filter: F,
}

impl TreeWalker<fn(&Path) -> bool> {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			max_depth: None,
			follow_links: false,
			dir_filter: |_| true,
		}
	}
}

impl<F> TreeWalker<F>
where
	F: FnMut(&Path) -> bool,
{
	/// Set maximum depth; 1 lists only the root's direct children
	pub fn max_depth(mut self, depth: usize) -> Self {
		self.max_depth = Some(depth);
		self
	}

	/// Configure whether to follow symbolic links
	pub fn follow_links(mut self, follow: bool) -> Self {
		self.follow_links = follow;
		self
	}

	/// Only descend into directories for which `filter` returns true.
	pub fn dir_filter<G>(self, filter: G) -> TreeWalker<G>
	where
		G: FnMut(&Path) -> bool,
	{
		TreeWalker {
			root: self.root,
			max_depth: self.max_depth,
			follow_links: self.follow_links,
			dir_filter: filter,
		}
	}

	pub fn into_entries(self) -> impl Iterator<Item = WalkEntry> {
		let mut walker = WalkDir::new(&self.root)
			.min_depth(1)
			.follow_links(self.follow_links)
			.sort_by_file_name();
		if let Some(max_depth) = self.max_depth {
			walker = walker.max_depth(max_depth);
		}

		let mut dir_filter = self.dir_filter;
		walker
			.into_iter()
			.filter_entry(move |e| !e.file_type().is_dir() || dir_filter(e.path()))
			.filter_map(|entry| match entry {
				Ok(e) => Some(e),
				Err(e) => {
					warn!("Walk: {e}");
					None
				}
			})
			.map(|e| {
				trace!("Walk: {}", e.path().display());
				WalkEntry {
					is_dir: e.file_type().is_dir(),
					depth: e.depth(),
					path: e.into_path(),
				}
			})
	}
}
