//! Supported locales
//!
//! The set of locales is closed. Callers send a language tag, which is mapped
//! onto [`Locale`] by [`LocaleTags::parse`]; anything else is rejected with
//! [`SearchError::UnsupportedLocale`]. The locale only ever selects between
//! expression variants prepared from entity definitions.

use crate::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
	/// The language every localizable field is authored in
	#[default]
	Base,
	/// The translated language; falls back to [`Locale::Base`] per field
	Secondary,
}

impl Locale {
	pub const ALL: [Locale; 2] = [Locale::Base, Locale::Secondary];

	/// Canonical name of the locale
	pub fn as_str(&self) -> &'static str {
		match self {
			Locale::Base => "base",
			Locale::Secondary => "secondary",
		}
	}
}

impl fmt::Display for Locale {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Mapping between deployment language tags and [`Locale`] variants
///
/// # Examples
///
/// ```
/// use catalog_core::{Locale, LocaleTags};
///
/// let tags = LocaleTags::new("en", "fr");
/// assert_eq!(tags.parse("fr").unwrap(), Locale::Secondary);
/// assert_eq!(tags.parse("EN").unwrap(), Locale::Base);
/// assert_eq!(tags.parse("secondary").unwrap(), Locale::Secondary);
/// assert!(tags.parse("de").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleTags {
	base: String,
	secondary: String,
}

impl LocaleTags {
	pub fn new(base: impl Into<String>, secondary: impl Into<String>) -> Self {
		Self {
			base: base.into().to_ascii_lowercase(),
			secondary: secondary.into().to_ascii_lowercase(),
		}
	}

	/// Map a caller-supplied tag onto a supported locale
	///
	/// Accepts the configured language tags and the canonical names
	/// `base` / `secondary`, case-insensitively, ignoring surrounding
	/// whitespace.
	pub fn parse(&self, tag: &str) -> SearchResult<Locale> {
		let normalized = tag.trim().to_ascii_lowercase();
		Locale::ALL
			.into_iter()
			.find(|locale| normalized == self.tag(*locale) || normalized == locale.as_str())
			.ok_or_else(|| SearchError::UnsupportedLocale(tag.to_string()))
	}

	pub fn base(&self) -> &str {
		&self.base
	}

	pub fn secondary(&self) -> &str {
		&self.secondary
	}

	/// Language tag configured for a locale
	pub fn tag(&self, locale: Locale) -> &str {
		match locale {
			Locale::Base => &self.base,
			Locale::Secondary => &self.secondary,
		}
	}
}

impl Default for LocaleTags {
	fn default() -> Self {
		Self::new("en", "fr")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("en", Locale::Base)]
	#[case(" fr ", Locale::Secondary)]
	#[case("FR", Locale::Secondary)]
	#[case("base", Locale::Base)]
	fn test_parse_supported_tags(#[case] tag: &str, #[case] expected: Locale) {
		assert_eq!(LocaleTags::default().parse(tag).unwrap(), expected);
	}

	#[rstest]
	#[case("")]
	#[case("de")]
	#[case("fr-CA")]
	#[case("fr' OR '1'='1")]
	fn test_parse_rejects_unknown_tags(#[case] tag: &str) {
		let err = LocaleTags::default().parse(tag).unwrap_err();
		match err {
			SearchError::UnsupportedLocale(got) => assert_eq!(got, tag),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	fn test_custom_tags() {
		let tags = LocaleTags::new("fr", "en");
		assert_eq!(tags.parse("fr").unwrap(), Locale::Base);
		assert_eq!(tags.tag(Locale::Secondary), "en");
	}
}
