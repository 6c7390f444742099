//! JSON configuration: loading, `/`-separated key lookup and match settings

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult, KeyNotFound};
use crate::paths::default_config_file;

pub const KEY_STUDENT_NAME: &str = "identity/student_name";
pub const KEY_STRICT_STUDENT_NAME: &str = "identity/strict_student_name";
pub const KEY_LATE_MARKER: &str = "identity/late_marker";
pub const KEY_FEEDBACK_MARKER: &str = "feedback/file_name_regex";
pub const KEY_SUBMISSION_NUMBER: &str = "feedback/optional_submission_number";
pub const KEY_FILE_EXTENSION: &str = "feedback/file_extension";
pub const KEY_FEEDBACK_SLUG: &str = "feedback/slug";
pub const KEY_DISAMBIGUATION_DIR: &str = "feedback/disambiguation_dir";
pub const KEY_SUBMISSION_MARKER: &str = "folders/submission_marker";
pub const KEY_NEW_FEEDBACK_DIR: &str = "folders/new_feedback_dir";
pub const KEY_UPLOAD_ARCHIVE: &str = "folders/upload_archive";
pub const KEY_BACKUP_DIR: &str = "folders/backup_dir";
pub const KEY_LOCK_SUFFIX: &str = "lock/suffix";

/// Keys that must be present for [`MatchSettings::from_config`].
pub const REQUIRED_KEYS: &[&str] = &[
	KEY_STUDENT_NAME,
	KEY_STRICT_STUDENT_NAME,
	KEY_LATE_MARKER,
	KEY_FEEDBACK_MARKER,
	KEY_SUBMISSION_NUMBER,
	KEY_FILE_EXTENSION,
	KEY_FEEDBACK_SLUG,
	KEY_SUBMISSION_MARKER,
	KEY_NEW_FEEDBACK_DIR,
	KEY_UPLOAD_ARCHIVE,
	KEY_BACKUP_DIR,
	KEY_LOCK_SUFFIX,
];

/// Parsed configuration file.
///
/// Values are addressed by `/`-separated paths through nested JSON objects;
/// each segment is matched case-insensitively. One `AppConfig` is loaded per
/// invocation and handed to whoever needs it, nothing is memoized globally.
#[derive(Debug, Clone)]
pub struct AppConfig {
	source: Option<PathBuf>,
	root: Value,
}

impl AppConfig {
	pub fn from_value(root: Value) -> Self {
		Self { source: None, root }
	}

	pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json).map(Self::from_value)
	}

	/// Load from an explicit path
	pub fn load(path: &Path) -> ConfigResult<Self> {
		if !path.is_file() {
			return Err(ConfigError::FileNotFound(path.to_path_buf()));
		}
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let root = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		info!("Config: loaded {}", path.display());
		Ok(Self {
			source: Some(path.to_path_buf()),
			root,
		})
	}

	/// Load from the per-user default location
	pub fn load_default() -> ConfigResult<Self> {
		let path = default_config_file().ok_or(ConfigError::NoConfigDir)?;
		Self::load(&path)
	}

	/// File this config was read from, if any
	pub fn source(&self) -> Option<&Path> {
		self.source.as_deref()
	}

	pub fn get(&self, key: &str) -> Result<&Value, KeyNotFound> {
		let mut current = &self.root;
		for segment in key.split('/').filter(|s| !s.is_empty()) {
			let Value::Object(map) = current else {
				return Err(KeyNotFound { key: key.to_string() });
			};
			current = map
				.iter()
				.find(|(k, _)| k.eq_ignore_ascii_case(segment))
				.map(|(_, v)| v)
				.ok_or_else(|| KeyNotFound { key: key.to_string() })?;
		}
		Ok(current)
	}

	/// String value at `key`. Non-string values count as absent.
	pub fn get_str(&self, key: &str) -> Result<&str, KeyNotFound> {
		self.get(key)?
			.as_str()
			.ok_or_else(|| KeyNotFound { key: key.to_string() })
	}

	pub fn get_str_or(&self, key: &str, default: &str) -> String {
		self.get_str(key).unwrap_or(default).to_string()
	}

	/// Fetch every key as a string, failing with all missing keys at once.
	pub fn verify_keys(&self, keys: &[&str]) -> ConfigResult<Vec<String>> {
		let mut values = Vec::with_capacity(keys.len());
		let mut missing = Vec::new();
		for key in keys {
			match self.get(key) {
				Ok(Value::String(s)) => values.push(s.clone()),
				Ok(_) => return Err(ConfigError::NotAString { key: key.to_string() }),
				Err(_) => missing.push(key.to_string()),
			}
		}
		if missing.is_empty() {
			Ok(values)
		} else {
			Err(ConfigError::MissingKeys(missing))
		}
	}
}

/// Every naming convention the scanners and reconcilers depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSettings {
	/// Identity regex, anchored at the start of a name when compiled
	pub student_name: String,
	/// Prefix produced by the LMS bulk export: name, student id, file id
	pub strict_student_name: String,
	pub late_marker: String,
	pub feedback_marker: String,
	pub optional_submission_number: String,
	pub file_extension: String,
	/// Suffix for feedback files this tool creates
	pub feedback_slug: String,
	/// Subfolder receiving feedback when a student matched several originals
	pub disambiguation_dir: String,
	pub submission_folder_marker: String,
	pub new_feedback_dir: String,
	pub upload_archive: String,
	pub backup_dir: String,
	pub lock_suffix: String,
}

impl Default for MatchSettings {
	fn default() -> Self {
		Self {
			student_name: r"[A-Za-z\-\.'()]+_(?:LATE_)?\d+_?".to_string(),
			strict_student_name: r"^[A-Za-z\-\.'()]+_(?:LATE_)?\d+_\d+_.*".to_string(),
			late_marker: "LATE_".to_string(),
			feedback_marker: "INSTRUCTOR_?FEEDBACK".to_string(),
			optional_submission_number: r"(?:-\d+)?".to_string(),
			file_extension: r"\.docx?$".to_string(),
			feedback_slug: "_INSTRUCTORFEEDBACK".to_string(),
			disambiguation_dir: "ORIGINAL_FEEDBACKS".to_string(),
			submission_folder_marker: "_SUBMISSION".to_string(),
			new_feedback_dir: "_NEW_FEEDBACK_FILES".to_string(),
			upload_archive: "_UPLOAD_TO_LMS.zip".to_string(),
			backup_dir: "_BACKUPS".to_string(),
			lock_suffix: "_ALREADY_COPIED".to_string(),
		}
	}
}

impl MatchSettings {
	pub fn from_config(config: &AppConfig) -> ConfigResult<Self> {
		let values = config.verify_keys(REQUIRED_KEYS)?;
		let [
			student_name,
			strict_student_name,
			late_marker,
			feedback_marker,
			optional_submission_number,
			file_extension,
			feedback_slug,
			submission_folder_marker,
			new_feedback_dir,
			upload_archive,
			backup_dir,
			lock_suffix,
		]: [String; 12] = values
			.try_into()
			.map_err(|_| ConfigError::MissingKeys(Vec::new()))?;

		let disambiguation_dir =
			config.get_str_or(KEY_DISAMBIGUATION_DIR, &Self::default().disambiguation_dir);
		debug!("Config: match settings resolved");

		Ok(Self {
			student_name,
			strict_student_name,
			late_marker,
			feedback_marker,
			optional_submission_number,
			file_extension,
			feedback_slug,
			disambiguation_dir,
			submission_folder_marker,
			new_feedback_dir,
			upload_archive,
			backup_dir,
			lock_suffix,
		})
	}

	/// Names that mark tool-owned output which scanners must never pick up.
	pub fn ignored_names(&self) -> [&str; 3] {
		[
			self.backup_dir.as_str(),
			self.new_feedback_dir.as_str(),
			self.upload_archive.as_str(),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn full_config() -> AppConfig {
		let d = MatchSettings::default();
		AppConfig::from_value(json!({
			"Identity": {
				"Student_Name": d.student_name,
				"strict_student_name": d.strict_student_name,
				"late_marker": d.late_marker,
			},
			"feedback": {
				"file_name_regex": d.feedback_marker,
				"optional_submission_number": d.optional_submission_number,
				"file_extension": d.file_extension,
				"slug": d.feedback_slug,
			},
			"folders": {
				"submission_marker": d.submission_folder_marker,
				"new_feedback_dir": d.new_feedback_dir,
				"upload_archive": d.upload_archive,
				"backup_dir": d.backup_dir,
			},
			"lock": { "suffix": d.lock_suffix },
		}))
	}

	#[test]
	fn test_lookup_is_case_insensitive() {
		let config = full_config();
		assert_eq!(config.get_str("IDENTITY/student_NAME").unwrap(), r"[A-Za-z\-\.'()]+_(?:LATE_)?\d+_?");
		assert_eq!(config.get_str("lock/suffix").unwrap(), "_ALREADY_COPIED");
	}

	#[test]
	fn test_missing_key_is_a_result_not_a_panic() {
		let config = full_config();
		assert_eq!(
			config.get_str("lock/nope"),
			Err(KeyNotFound {
				key: "lock/nope".to_string()
			})
		);
		assert!(config.get_str("lock/suffix/deeper").is_err());
		assert_eq!(config.get_str_or("lock/nope", "fallback"), "fallback");
	}

	#[test]
	fn test_verify_keys_reports_every_missing_key() {
		let config = AppConfig::from_value(json!({ "lock": { "suffix": "_X" } }));
		match config.verify_keys(&["lock/suffix", "a/b", "c"]) {
			Err(ConfigError::MissingKeys(keys)) => assert_eq!(keys, vec!["a/b", "c"]),
			other => panic!("expected MissingKeys, got {other:?}"),
		}
	}

	#[test]
	fn test_verify_keys_rejects_non_strings() {
		let config = AppConfig::from_value(json!({ "lock": { "suffix": 3 } }));
		assert!(matches!(
			config.verify_keys(&["lock/suffix"]),
			Err(ConfigError::NotAString { .. })
		));
	}

	#[test]
	fn test_match_settings_from_config() {
		let settings = MatchSettings::from_config(&full_config()).unwrap();
		assert_eq!(settings, MatchSettings::default());
	}

	#[test]
	fn test_sample_config_matches_defaults() {
		let config = AppConfig::from_json_str(include_str!("../config.sample.json")).unwrap();
		assert_eq!(MatchSettings::from_config(&config).unwrap(), MatchSettings::default());
	}

	#[test]
	fn test_match_settings_missing_key_is_fatal() {
		let config = AppConfig::from_value(json!({ "identity": {} }));
		assert!(matches!(
			MatchSettings::from_config(&config),
			Err(ConfigError::MissingKeys(keys)) if keys.len() == REQUIRED_KEYS.len()
		));
	}

	#[test]
	fn test_load_from_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{ "lock": { "suffix": "_DONE" } }"#).unwrap();

		let config = AppConfig::load(&path).unwrap();
		assert_eq!(config.source(), Some(path.as_path()));
		assert_eq!(config.get_str("lock/suffix").unwrap(), "_DONE");

		std::fs::write(&path, "{ not json").unwrap();
		assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));

		assert!(matches!(
			AppConfig::load(&dir.path().join("missing.json")),
			Err(ConfigError::FileNotFound(_))
		));
	}
}
