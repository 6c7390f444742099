//! Student identity: canonical keys derived from file and directory names

use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::{trace, warn};

use crate::config::MatchSettings;
use crate::error::{GradeError, GradeResult, IdentityError};

/// Canonical, lowercase identity of one student.
///
/// Keys are best-effort: two artifacts of the same student collapse to the
/// same key only when their names follow the same convention.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StudentKey(String);

impl StudentKey {
	/// Wrap an already-extracted key, lowercasing it.
	pub fn new(raw: impl AsRef<str>) -> Self {
		Self(raw.as_ref().to_lowercase())
	}

	/// Key for a submission folder owned by `last`, `first`.
	///
	/// Dots are dropped so `O.Brien` and `OBrien` land on the same key.
	pub fn from_names(last: &str, first: &str) -> Self {
		Self(format!("{last},{first}").replace('.', "").to_lowercase())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for StudentKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for StudentKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Compile a configured pattern, reporting failures as [`GradeError::InvalidPattern`].
pub(crate) fn compile_pattern(pattern: &str) -> GradeResult<Regex> {
	Regex::new(pattern).map_err(|e| GradeError::InvalidPattern {
		pattern: pattern.to_string(),
		reason: e.to_string(),
	})
}

/// Normalize a raw identity match into a key.
pub fn canonicalize(raw: &str, late_marker: &str) -> StudentKey {
	let mut key = if late_marker.is_empty() {
		raw.to_string()
	} else {
		raw.replace(late_marker, "")
	};
	key.retain(|c| c != '.');
	if key.ends_with('_') {
		key.pop();
	}
	StudentKey::new(key)
}

/// Derives [`StudentKey`]s from names using the configured identity pattern.
#[derive(Debug, Clone)]
pub struct IdentityExtractor {
	pattern: Regex,
	late_marker: String,
}

impl IdentityExtractor {
	/// `pattern` is anchored at the start of the name.
	pub fn new(pattern: &str, late_marker: &str) -> GradeResult<Self> {
		Ok(Self {
			pattern: compile_pattern(&format!("^(?:{pattern})"))?,
			late_marker: late_marker.to_string(),
		})
	}

	pub fn from_settings(settings: &MatchSettings) -> GradeResult<Self> {
		Self::new(&settings.student_name, &settings.late_marker)
	}

	pub fn late_marker(&self) -> &str {
		&self.late_marker
	}

	pub fn extract_key(&self, name: &str) -> Result<StudentKey, IdentityError> {
		let mut raw = self.pattern.captures_iter(name).map(|caps| {
			caps.get(1)
				.or_else(|| caps.get(0))
				.map(|m| m.as_str())
				.unwrap_or_default()
		});

		let Some(first) = raw.next() else {
			return Err(IdentityError::Unparseable {
				name: name.to_string(),
			});
		};
		if raw.next().is_some() {
			warn!("Identity: name contains several student names, using the first: {name}");
		}

		let key = canonicalize(first, &self.late_marker);
		trace!("Identity: {name} -> {key}");
		Ok(key)
	}

	/// `last_sid` portion of an LMS file name, used to name new feedback files.
	///
	/// `smithjohn_123_456_hw.docx` gives `smithjohn_123`, and the late form
	/// `smithjohn_LATE_123_456_hw.docx` gives the same.
	pub fn name_and_sid(&self, file_name: &str) -> String {
		let mut parts = file_name.split('_');
		let name = parts.next().unwrap_or_default();
		let late = !self.late_marker.is_empty() && file_name.contains(&self.late_marker);
		let sid = if late { parts.nth(1) } else { parts.next() };
		format!("{name}_{}", sid.unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn extractor() -> IdentityExtractor {
		IdentityExtractor::from_settings(&MatchSettings::default()).unwrap()
	}

	#[test]
	fn test_extract_key_from_lms_file_name() {
		let ex = extractor();
		assert_eq!(
			ex.extract_key("smithjohn_5994539_225545272_INSTRUCTORFEEDBACK.docx").unwrap(),
			StudentKey::new("smithjohn_5994539")
		);
	}

	#[test]
	fn test_late_marker_and_dots_are_stripped() {
		let ex = extractor();
		let on_time = ex.extract_key("obrienpat_42_7_hw.docx").unwrap();
		let late = ex.extract_key("o.brienpat_LATE_42_7_hw.docx").unwrap();
		assert_eq!(on_time, late);
		assert_eq!(on_time.as_str(), "obrienpat_42");
	}

	#[test]
	fn test_keys_are_lowercase() {
		let ex = extractor();
		assert_eq!(
			ex.extract_key("Fierro-Dax_1_2_Instructor_Feedback.docx").unwrap().as_str(),
			"fierro-dax_1"
		);
	}

	#[test]
	fn test_unparseable_name() {
		let ex = extractor();
		assert_eq!(
			ex.extract_key("README.txt"),
			Err(IdentityError::Unparseable {
				name: "README.txt".to_string()
			})
		);
		// anchored: the identity must start the name
		assert!(ex.extract_key("__smith_1_2.docx").is_err());
	}

	#[test]
	fn test_capture_group_is_used_when_present() {
		let ex = IdentityExtractor::new(r"([a-z]+)-\d+", "").unwrap();
		assert_eq!(ex.extract_key("jones-17.docx").unwrap().as_str(), "jones");
	}

	#[test]
	fn test_invalid_pattern() {
		assert!(matches!(
			IdentityExtractor::new("([unclosed", "LATE_"),
			Err(GradeError::InvalidPattern { .. })
		));
	}

	#[test]
	fn test_canonicalize_trims_one_underscore() {
		assert_eq!(canonicalize("Smith_12__", "LATE_").as_str(), "smith_12_");
		assert_eq!(canonicalize("Smith_LATE_12_", "LATE_").as_str(), "smith_12");
	}

	#[test]
	fn test_from_names_merges_dotted_spellings() {
		assert_eq!(
			StudentKey::from_names("O.Brien", "Pat"),
			StudentKey::from_names("OBrien", "Pat")
		);
		assert_eq!(StudentKey::from_names("Smith", "John").as_str(), "smith,john");
	}

	#[test]
	fn test_name_and_sid() {
		let ex = extractor();
		assert_eq!(ex.name_and_sid("smithjohn_123_456_hw.docx"), "smithjohn_123");
		assert_eq!(ex.name_and_sid("smithjohn_LATE_123_456_hw.docx"), "smithjohn_123");
		assert_eq!(ex.name_and_sid("nounderscores"), "nounderscores_");
	}
}
