//! Caller-supplied search requests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar filter value as sent by the caller
///
/// Query-string callers typically send everything as text; numeric and
/// boolean filters accept text that parses into their domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}

impl fmt::Display for FilterValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FilterValue::Bool(b) => write!(f, "{b}"),
			FilterValue::Int(i) => write!(f, "{i}"),
			FilterValue::Float(v) => write!(f, "{v}"),
			FilterValue::Text(s) => write!(f, "{s:?}"),
		}
	}
}

impl From<bool> for FilterValue {
	fn from(b: bool) -> Self {
		FilterValue::Bool(b)
	}
}

impl From<i64> for FilterValue {
	fn from(i: i64) -> Self {
		FilterValue::Int(i)
	}
}

impl From<i32> for FilterValue {
	fn from(i: i32) -> Self {
		FilterValue::Int(i64::from(i))
	}
}

impl From<f64> for FilterValue {
	fn from(f: f64) -> Self {
		FilterValue::Float(f)
	}
}

impl From<&str> for FilterValue {
	fn from(s: &str) -> Self {
		FilterValue::Text(s.to_string())
	}
}

impl From<String> for FilterValue {
	fn from(s: String) -> Self {
		FilterValue::Text(s)
	}
}

/// A search over one entity type
///
/// The engine only ever reads a request; it is owned and mutated by the
/// caller before submission.
///
/// # Examples
///
/// ```
/// use catalog_core::SearchRequest;
///
/// let request = SearchRequest::new("en")
///     .phrase("meditation")
///     .filter("minPrice", 50)
///     .filter("level", "beginner")
///     .limit(20);
///
/// assert_eq!(request.phrase.as_deref(), Some("meditation"));
/// assert_eq!(request.filters.len(), 2);
/// assert_eq!(request.offset, None);
/// ```
///
/// Requests deserialize from the caller-facing JSON shape:
///
/// ```
/// use catalog_core::{FilterValue, SearchRequest};
///
/// let request: SearchRequest = serde_json::from_str(
///     r#"{"phrase":"yoga","filters":{"maxPrice":200},"locale":"fr","limit":10}"#,
/// ).unwrap();
/// assert_eq!(request.filters["maxPrice"], FilterValue::Int(200));
/// assert!(!request.include_past);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
	/// Raw search phrase; empty after trimming means "no search"
	pub phrase: Option<String>,
	/// Filter name to value; absent names produce no predicate
	pub filters: BTreeMap<String, FilterValue>,
	/// Language tag of the requested locale
	pub locale: String,
	/// Page size, defaults to the configured default limit
	pub limit: Option<i64>,
	/// Number of records to skip, defaults to 0
	pub offset: Option<i64>,
	/// Include time-bound records whose end lies in the past
	pub include_past: bool,
}

impl SearchRequest {
	pub fn new(locale: impl Into<String>) -> Self {
		Self {
			locale: locale.into(),
			..Self::default()
		}
	}

	pub fn phrase(mut self, phrase: impl Into<String>) -> Self {
		self.phrase = Some(phrase.into());
		self
	}

	pub fn filter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		self.filters.insert(name.into(), value.into());
		self
	}

	pub fn limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: i64) -> Self {
		self.offset = Some(offset);
		self
	}

	pub fn include_past(mut self, include: bool) -> Self {
		self.include_past = include;
		self
	}
}

impl Default for SearchRequest {
	fn default() -> Self {
		Self {
			phrase: None,
			filters: BTreeMap::new(),
			locale: "base".to_string(),
			limit: None,
			offset: None,
			include_past: false,
		}
	}
}
