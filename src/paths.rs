//! Common path helpers: config locations, prefix rebasing and file naming

use std::path::{Path, PathBuf};

use dirs::config_dir;

use crate::error::{GradeError, GradeResult};

/// Name of the per-user directory holding the config file.
pub const APP_DIR_NAME: &str = "gradetool";

/// Name of the config file inside [`default_config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Get the default config directory for gradetool, e.g.:
/// - Linux: ~/.config/gradetool
/// - macOS: ~/Library/Application Support/gradetool
/// - Windows: %APPDATA%\gradetool
pub fn default_config_dir() -> Option<PathBuf> {
	config_dir().map(|mut p| {
		p.push(APP_DIR_NAME);
		p
	})
}

/// Full path of the default config file.
pub fn default_config_file() -> Option<PathBuf> {
	default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Rewrite `path` after the directory `old` was moved to `new`.
///
/// Returns `Some(rewritten)` only when `old` is a strict, complete component
/// prefix of `path`: `/a/b` is a prefix of `/a/b/c` but not of `/a/bc`, and a
/// path equal to `old` is left alone (the mover updates that one itself).
pub fn rebase_descendant(path: &Path, old: &Path, new: &Path) -> Option<PathBuf> {
	match path.strip_prefix(old) {
		Ok(rest) if !rest.as_os_str().is_empty() => Some(new.join(rest)),
		_ => None,
	}
}

/// Keep only characters that are safe in a file name on every platform.
///
/// ASCII letters, digits, `-`, `_`, `(`, `)` and spaces survive; spaces then
/// become underscores. May return an empty string.
pub fn sanitize_file_name(name: &str) -> String {
	name.chars()
		.filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '(' | ')' | ' '))
		.map(|c| if c == ' ' { '_' } else { c })
		.collect()
}

/// Extension of `path` including the leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
	path.extension()
		.map(|ext| format!(".{}", ext.to_string_lossy()))
		.unwrap_or_default()
}

/// Last component of `path` as a lossy string.
pub fn base_name(path: &Path) -> String {
	path.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_default()
}

const MAX_UNIQUE_ATTEMPTS: u32 = 20;

/// Find a free variant of `path` by appending `_0`, `_1`, ... to the stem.
///
/// With `start_with_suffix` false the unmodified path is tried first.
/// Gives up after twenty numbered attempts.
pub fn unique_file_name(path: &Path, start_with_suffix: bool) -> GradeResult<PathBuf> {
	let stem = path
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_default();
	let ext = dotted_extension(path);
	let numbered = |n: u32| path.with_file_name(format!("{stem}_{n}{ext}"));

	let mut counter = 0;
	let mut candidate = if start_with_suffix {
		numbered(counter)
	} else {
		path.to_path_buf()
	};
	while candidate.exists() {
		counter += 1;
		if counter > MAX_UNIQUE_ATTEMPTS {
			return Err(GradeError::Io(std::io::Error::new(
				std::io::ErrorKind::AlreadyExists,
				format!("no free name after {MAX_UNIQUE_ATTEMPTS} attempts: {}", candidate.display()),
			)));
		}
		candidate = numbered(counter);
	}
	Ok(candidate)
}
