//! Search phrase normalisation
//!
//! A raw phrase is reduced to lowercase tokens of letters and digits. Every
//! other character acts as a separator, which removes full-text operators and
//! quoting before the phrase is bound to a placeholder.

/// Maximum number of tokens kept from a phrase
pub const MAX_TOKENS: usize = 32;

/// Maximum length of a single token, in characters
pub const MAX_TOKEN_LEN: usize = 64;

/// A sanitized, non-empty search query
///
/// # Examples
///
/// ```
/// use catalog_query::SearchQuery;
///
/// let query = SearchQuery::parse("  Yoga & (Meditation)!  ").unwrap();
/// assert_eq!(query.text(), "yoga meditation");
/// assert_eq!(query.tokens(), ["yoga", "meditation"]);
///
/// assert!(SearchQuery::parse("   ").is_none());
/// assert!(SearchQuery::parse("&|!()").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
	text: String,
	tokens: Vec<String>,
}

impl SearchQuery {
	/// Sanitize a raw phrase
	///
	/// Returns `None` when nothing searchable survives, which callers treat
	/// as "no search".
	pub fn parse(raw: &str) -> Option<Self> {
		let tokens: Vec<String> = raw
			.split(|c: char| !c.is_alphanumeric())
			.filter(|token| !token.is_empty())
			.map(|token| token.to_lowercase().chars().take(MAX_TOKEN_LEN).collect())
			.take(MAX_TOKENS)
			.collect();

		if tokens.is_empty() {
			return None;
		}

		Some(Self {
			text: tokens.join(" "),
			tokens,
		})
	}

	/// Space-separated tokens, the value bound to the query placeholder
	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("meditation", "meditation")]
	#[case("  Deep   Work ", "deep work")]
	#[case("yoga'; DROP TABLE courses; --", "yoga drop table courses")]
	#[case("c++ & rust:*", "c rust")]
	#[case("Café crème", "café crème")]
	fn test_parse(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(SearchQuery::parse(raw).unwrap().text(), expected);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case("'\"&|!<>():*")]
	fn test_nothing_searchable(#[case] raw: &str) {
		assert!(SearchQuery::parse(raw).is_none());
	}

	#[rstest]
	fn test_limits() {
		let raw = (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
		let query = SearchQuery::parse(&raw).unwrap();
		assert_eq!(query.tokens().len(), MAX_TOKENS);

		let long = "a".repeat(200);
		let query = SearchQuery::parse(&long).unwrap();
		assert_eq!(query.tokens()[0].chars().count(), MAX_TOKEN_LEN);
	}
}
