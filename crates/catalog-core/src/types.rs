//! Common type definitions for query composition
//!
//! [`Identifier`] guards every table and column name that reaches generated
//! query text, and [`QueryValue`] is the closed set of values that can be bound
//! to a positional placeholder.

use crate::error::DescriptorError;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is a valid regex")
});

/// A validated SQL identifier (table or column name)
///
/// Identifiers are only ever produced from entity definitions at startup and
/// are rendered double-quoted. Request data never becomes an identifier.
///
/// # Examples
///
/// ```
/// use catalog_core::Identifier;
///
/// let column = Identifier::new("title_fr").unwrap();
/// assert_eq!(column.quoted(), "\"title_fr\"");
///
/// assert!(Identifier::new("title; DROP TABLE courses").is_err());
/// assert!(Identifier::new("1st").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
	/// Validate and wrap an identifier
	pub fn new(name: impl Into<String>) -> Result<Self, DescriptorError> {
		let name = name.into();
		if IDENTIFIER_PATTERN.is_match(&name) {
			Ok(Self(name))
		} else {
			Err(DescriptorError::InvalidIdentifier(name))
		}
	}

	/// Wrap a name whose validation is deferred to descriptor construction
	pub(crate) fn deferred(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// Re-check a deferred identifier
	pub(crate) fn validate(&self) -> Result<(), DescriptorError> {
		if IDENTIFIER_PATTERN.is_match(&self.0) {
			Ok(())
		} else {
			Err(DescriptorError::InvalidIdentifier(self.0.clone()))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The identifier wrapped in double quotes, ready for query text
	pub fn quoted(&self) -> String {
		format!("\"{}\"", self.0)
	}
}

impl fmt::Display for Identifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for Identifier {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Values that can be bound to a positional placeholder
///
/// Serialized untagged so that records render as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Date(NaiveDate),
	Timestamp(DateTime<Utc>),
}

impl QueryValue {
	pub fn is_null(&self) -> bool {
		matches!(self, QueryValue::Null)
	}

	/// Borrow the value as text, if it is a string
	pub fn as_str(&self) -> Option<&str> {
		match self {
			QueryValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			QueryValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Numeric view of the value (integers widen to floats)
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			QueryValue::Int(i) => Some(*i as f64),
			QueryValue::Float(f) => Some(*f),
			_ => None,
		}
	}

	/// Short type name used in error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			QueryValue::Null => "null",
			QueryValue::Bool(_) => "bool",
			QueryValue::Int(_) => "int",
			QueryValue::Float(_) => "float",
			QueryValue::String(_) => "string",
			QueryValue::Date(_) => "date",
			QueryValue::Timestamp(_) => "timestamp",
		}
	}

	/// SQL-style comparison
	///
	/// Returns `None` when either side is NULL or the types are not comparable.
	/// Integers and floats compare numerically; dates compare against
	/// timestamps at midnight UTC.
	///
	/// # Examples
	///
	/// ```
	/// use catalog_core::QueryValue;
	/// use std::cmp::Ordering;
	///
	/// assert_eq!(QueryValue::Int(50).compare(&QueryValue::Float(49.5)), Some(Ordering::Greater));
	/// assert_eq!(QueryValue::Null.compare(&QueryValue::Int(1)), None);
	/// ```
	pub fn compare(&self, other: &QueryValue) -> Option<Ordering> {
		use QueryValue::*;
		match (self, other) {
			(Null, _) | (_, Null) => None,
			(Bool(a), Bool(b)) => Some(a.cmp(b)),
			(Int(a), Int(b)) => Some(a.cmp(b)),
			(String(a), String(b)) => Some(a.cmp(b)),
			(Date(a), Date(b)) => Some(a.cmp(b)),
			(Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
			(Date(a), Timestamp(b)) => Some(midnight(a).cmp(b)),
			(Timestamp(a), Date(b)) => Some(a.cmp(&midnight(b))),
			(a, b) => match (a.as_f64(), b.as_f64()) {
				(Some(x), Some(y)) => x.partial_cmp(&y),
				_ => None,
			},
		}
	}
}

fn midnight(date: &NaiveDate) -> DateTime<Utc> {
	date.and_hms_opt(0, 0, 0)
		.unwrap_or_default()
		.and_utc()
}

impl fmt::Display for QueryValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QueryValue::Null => f.write_str("NULL"),
			QueryValue::Bool(b) => write!(f, "{b}"),
			QueryValue::Int(i) => write!(f, "{i}"),
			QueryValue::Float(v) => write!(f, "{v}"),
			QueryValue::String(s) => f.write_str(s),
			QueryValue::Date(d) => write!(f, "{d}"),
			QueryValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
		}
	}
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		QueryValue::String(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		QueryValue::String(s)
	}
}

impl From<i64> for QueryValue {
	fn from(i: i64) -> Self {
		QueryValue::Int(i)
	}
}

impl From<i32> for QueryValue {
	fn from(i: i32) -> Self {
		QueryValue::Int(i64::from(i))
	}
}

impl From<f64> for QueryValue {
	fn from(f: f64) -> Self {
		QueryValue::Float(f)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		QueryValue::Bool(b)
	}
}

impl From<NaiveDate> for QueryValue {
	fn from(d: NaiveDate) -> Self {
		QueryValue::Date(d)
	}
}

impl From<DateTime<Utc>> for QueryValue {
	fn from(dt: DateTime<Utc>) -> Self {
		QueryValue::Timestamp(dt)
	}
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(QueryValue::Null, Into::into)
	}
}

/// One record returned by the storage collaborator, keyed by projected name
///
/// Column order follows the projection order of the data query.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
	data: IndexMap<String, QueryValue>,
}

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
		self.data.insert(key.into(), value.into());
	}

	/// Builder-style insert, convenient for fixtures
	pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn get(&self, key: &str) -> Option<&QueryValue> {
		self.data.get(key)
	}

	/// Text value of a column, `None` when missing, NULL or not text
	pub fn text(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(QueryValue::as_str)
	}

	/// Remove a column, keeping the order of the others
	pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
		self.data.shift_remove(key)
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
		self.data.iter()
	}
}

impl FromIterator<(String, QueryValue)> for Row {
	fn from_iter<I: IntoIterator<Item = (String, QueryValue)>>(iter: I) -> Self {
		Self {
			data: iter.into_iter().collect(),
		}
	}
}

/// Text-search configuration handed to the full-text primitive
///
/// Closed set: the configuration name is rendered from code, never from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSearchConfig {
	/// No stemming, no stop words
	#[default]
	Simple,
	/// English stemming and stop words
	English,
}

impl TextSearchConfig {
	/// Quoted configuration name as it appears in query text
	pub fn as_sql(&self) -> &'static str {
		match self {
			TextSearchConfig::Simple => "'simple'",
			TextSearchConfig::English => "'english'",
		}
	}
}

/// How the count and data queries relate transactionally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
	/// Two independent reads; concurrent writes between them may make `total`
	/// and the page minutely inconsistent.
	#[default]
	Independent,
	/// Both reads inside one read-only repeatable-read transaction
	Snapshot,
}

/// Whether independent reads are issued one after another or concurrently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
	#[default]
	Sequential,
	Concurrent,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("title")]
	#[case("title_fr")]
	#[case("_internal")]
	#[case("Price2")]
	fn test_identifier_accepts_plain_names(#[case] name: &str) {
		let ident = Identifier::new(name).unwrap();
		assert_eq!(ident.as_str(), name);
	}

	#[rstest]
	#[case("")]
	#[case("title fr")]
	#[case("title\"")]
	#[case("2title")]
	#[case("title'; --")]
	#[case("fr-CA")]
	fn test_identifier_rejects_unsafe_names(#[case] name: &str) {
		assert!(matches!(
			Identifier::new(name),
			Err(DescriptorError::InvalidIdentifier(_))
		));
	}

	#[rstest]
	fn test_identifier_length_limit() {
		assert!(Identifier::new("a".repeat(63)).is_ok());
		assert!(Identifier::new("a".repeat(64)).is_err());
	}

	#[rstest]
	fn test_compare_dates_with_timestamps() {
		let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
		let later = date.and_hms_opt(10, 0, 0).unwrap().and_utc();
		assert_eq!(
			QueryValue::Date(date).compare(&QueryValue::Timestamp(later)),
			Some(Ordering::Less)
		);
	}

	#[rstest]
	fn test_compare_incompatible_types() {
		assert_eq!(
			QueryValue::from("50").compare(&QueryValue::Int(50)),
			None
		);
	}

	#[rstest]
	fn test_row_serializes_in_projection_order() {
		let row = Row::new()
			.with("title", "Yoga")
			.with("price", 80.0)
			.with("description", QueryValue::Null);
		let json = serde_json::to_string(&row).unwrap();
		assert_eq!(json, r#"{"title":"Yoga","price":80.0,"description":null}"#);
	}
}
