//! Error types for the grading tool

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for every fatal condition in the grading tool.
///
/// Most problems met while scanning or copying are *not* errors: malformed
/// folder names, ambiguous feedback files, destination collisions and failed
/// copies are logged and recorded in the returned outcome values so the run
/// can continue. `GradeError` is reserved for conditions that abort a run.
///
/// ## Error Categories
///
/// ### Configuration Errors
/// The configuration file is missing, is not valid JSON, lacks a required key,
/// or contains a pattern that does not compile.
///
/// ### Input Errors
/// A root directory or template file named on the command line does not exist
/// or has the wrong kind (file vs. directory).
///
/// ### I/O Errors
/// Unexpected filesystem failures outside the skip-and-continue paths.
///
/// ```rust
/// use gradetool::{GradeError, GradingContext, MatchSettings};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = GradingContext::new(MatchSettings::default())?;
/// match gradetool::workflows::organize(&ctx, Path::new("./HW1")) {
///     Ok(report) => println!("{report}"),
///     Err(GradeError::NotADirectory(path)) => eprintln!("not a directory: {}", path.display()),
///     Err(err) => eprintln!("error: {err}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Error)]
pub enum GradeError {
	/// File system I/O errors
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Configuration could not be loaded or is incomplete
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),

	/// A configured regular expression or glob does not compile
	#[error("Invalid pattern '{pattern}': {reason}")]
	InvalidPattern { pattern: String, reason: String },

	/// A required path does not exist
	#[error("Path not found: {0}")]
	PathNotFound(PathBuf),

	/// A path that must be a directory is something else
	#[error("Not a directory: {0}")]
	NotADirectory(PathBuf),

	/// A path that must be a regular file is something else
	#[error("Not a file: {0}")]
	NotAFile(PathBuf),
}

/// Configuration loading and lookup errors. All of these are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("config file not found: {0}")]
	FileNotFound(PathBuf),

	#[error("could not read config file {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("config file {path} is not valid JSON: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("missing required config keys: {}", .0.join(", "))]
	MissingKeys(Vec<String>),

	#[error("config key {key} must be a string")]
	NotAString { key: String },

	#[error("no config directory could be determined for this platform")]
	NoConfigDir,
}

/// Returned by config lookups for keys that are simply absent.
///
/// Callers decide whether absence is fatal (see
/// [`AppConfig::verify_keys`](crate::config::AppConfig::verify_keys)) or
/// falls back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config key not found: {key}")]
pub struct KeyNotFound {
	pub key: String,
}

/// Identity extraction errors. Callers warn and skip the name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
	#[error("name does not match the student identity pattern: {name}")]
	Unparseable { name: String },
}

/// Convenience type alias for results in the grading tool.
pub type GradeResult<T> = Result<T, GradeError>;

/// Convenience type alias for config results.
pub type ConfigResult<T> = Result<T, ConfigError>;
