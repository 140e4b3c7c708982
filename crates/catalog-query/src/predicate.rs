//! Predicate construction
//!
//! [`PredicateBuilder`] turns request filters into [`PredicateFragment`]s.
//! A fragment owns the values it binds; placeholder numbers are assigned only
//! when the finished [`Predicate`] is written into a statement, so adding or
//! skipping a filter can never shift another filter's parameters.

use crate::expr::{Expr, SqlWriter};
use crate::resolver::FieldResolver;
use crate::sanitize::SearchQuery;
use catalog_core::{
	EntityDescriptor, FieldKind, FilterKind, FilterSpec, FilterValue, Locale, QueryValue,
	RangeBound, SearchError, SearchResult, TextSearchConfig,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One condition together with the values it binds
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateFragment {
	label: String,
	condition: Expr,
}

impl PredicateFragment {
	pub fn new(label: impl Into<String>, condition: Expr) -> Self {
		Self {
			label: label.into(),
			condition,
		}
	}

	/// Filter name, or the name of the implicit condition
	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn condition(&self) -> &Expr {
		&self.condition
	}

	/// Condition text with placeholders numbered from `$1`
	pub fn template(&self) -> String {
		self.condition.to_string()
	}

	pub fn values(&self) -> Vec<&QueryValue> {
		self.condition.values()
	}
}

/// Conjunction of fragments shared by the count and data statements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
	fragments: Vec<PredicateFragment>,
}

impl Predicate {
	pub fn from_fragments(fragments: Vec<PredicateFragment>) -> Self {
		Self { fragments }
	}

	pub fn fragments(&self) -> &[PredicateFragment] {
		&self.fragments
	}

	pub fn len(&self) -> usize {
		self.fragments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fragments.is_empty()
	}

	pub fn fragment(&self, label: &str) -> Option<&PredicateFragment> {
		self.fragments.iter().find(|fragment| fragment.label == label)
	}

	/// Write the fragments joined by `AND`, numbering values as they appear
	pub fn render_into(&self, writer: &mut SqlWriter) {
		if self.fragments.is_empty() {
			writer.push_str("TRUE");
			return;
		}
		for (i, fragment) in self.fragments.iter().enumerate() {
			if i > 0 {
				writer.push_str(" AND ");
			}
			writer.push_expr(&fragment.condition);
		}
	}

	/// Predicate text and its flattened values
	pub fn to_sql(&self) -> (String, Vec<QueryValue>) {
		let mut writer = SqlWriter::new();
		self.render_into(&mut writer);
		writer.finish()
	}

	/// One line per fragment: label, template and bound values
	pub fn explain(&self) -> String {
		let mut out = String::new();
		for fragment in &self.fragments {
			let values: Vec<String> = fragment.values().iter().map(|v| v.to_string()).collect();
			let _ = writeln!(
				out,
				"{}: {} [{}]",
				fragment.label,
				fragment.template(),
				values.join(", ")
			);
		}
		out
	}
}

/// Accumulates the conditions of one request
///
/// The published and not-deleted conditions are always present.
///
/// # Examples
///
/// ```
/// use catalog_core::{builtin, FilterValue, Locale};
/// use catalog_query::{FieldResolver, PredicateBuilder};
///
/// let courses = builtin::courses().unwrap();
/// let resolver = FieldResolver::for_entity(&courses);
///
/// let mut builder = PredicateBuilder::new(&courses, &resolver, Locale::Base);
/// builder.add_filter("minPrice", Some(&FilterValue::Int(50))).unwrap();
/// builder.add_filter("maxPrice", None).unwrap();
/// let predicate = builder.build();
///
/// let (sql, values) = predicate.to_sql();
/// assert_eq!(
///     sql,
///     r#""is_published" = $1 AND "deleted_at" IS NULL AND "price" >= $2"#,
/// );
/// assert_eq!(values.len(), 2);
/// ```
#[derive(Debug)]
pub struct PredicateBuilder<'a> {
	entity: &'a EntityDescriptor,
	resolver: &'a FieldResolver,
	locale: Locale,
	fragments: Vec<PredicateFragment>,
}

impl<'a> PredicateBuilder<'a> {
	pub fn new(entity: &'a EntityDescriptor, resolver: &'a FieldResolver, locale: Locale) -> Self {
		let fragments = vec![
			PredicateFragment::new(
				"published",
				Expr::col(entity.published_column()).equals(Expr::value(true)),
			),
			PredicateFragment::new(
				"not_deleted",
				Expr::col(entity.deleted_column()).is_null(),
			),
		];
		Self {
			entity,
			resolver,
			locale,
			fragments,
		}
	}

	/// Exclude records of a time-bound entity that ended before `now`
	///
	/// No-op for entities without an expiry column.
	pub fn not_elapsed_at(&mut self, now: DateTime<Utc>) -> &mut Self {
		if let Some(expiry) = self.entity.expiry_column() {
			self.fragments.push(PredicateFragment::new(
				"not_elapsed",
				Expr::col(expiry).gte(Expr::value(now)),
			));
		}
		self
	}

	/// Add one named filter; an absent value adds nothing
	pub fn add_filter(&mut self, name: &str, value: Option<&FilterValue>) -> SearchResult<&mut Self> {
		let Some(value) = value else {
			return Ok(self);
		};
		let spec = self.lookup(name)?;
		let bound = coerce(spec, value)?;
		self.fragments.push(fragment_for(spec, bound));
		Ok(self)
	}

	/// Add every filter of a request
	///
	/// All values are validated before any fragment is added: unknown names,
	/// values outside a filter's domain and inverted ranges are rejected.
	/// Fragments follow the entity's filter declaration order.
	pub fn add_filters(&mut self, filters: &BTreeMap<String, FilterValue>) -> SearchResult<&mut Self> {
		for name in filters.keys() {
			self.lookup(name)?;
		}

		let mut coerced: Vec<(&FilterSpec, QueryValue)> = Vec::with_capacity(filters.len());
		for spec in self.entity.filters() {
			if let Some(value) = filters.get(spec.name()) {
				coerced.push((spec, coerce(spec, value)?));
			}
		}
		check_ranges(&coerced)?;

		self.fragments
			.extend(coerced.into_iter().map(|(spec, value)| fragment_for(spec, value)));
		Ok(self)
	}

	/// Add the full-text match for a sanitized query; `None` adds nothing
	pub fn add_phrase(&mut self, query: Option<&SearchQuery>, config: TextSearchConfig) -> &mut Self {
		if let Some(query) = query {
			self.fragments.push(PredicateFragment::new(
				"phrase",
				Expr::TextMatch {
					document: Box::new(self.resolver.document(self.locale)),
					query: Box::new(Expr::value(query.text())),
					config,
				},
			));
		}
		self
	}

	pub fn build(self) -> Predicate {
		Predicate {
			fragments: self.fragments,
		}
	}

	fn lookup(&self, name: &str) -> SearchResult<&'a FilterSpec> {
		self.entity.filter(name).ok_or_else(|| {
			tracing::debug!(entity = %self.entity.name(), filter = %name, "Unknown filter");
			SearchError::invalid_filter(name, "unknown filter")
		})
	}
}

fn fragment_for(spec: &FilterSpec, value: QueryValue) -> PredicateFragment {
	let column = Expr::col(spec.column());
	let condition = match spec.kind() {
		FilterKind::Range(RangeBound::Min) => column.gte(Expr::Value(value)),
		FilterKind::Range(RangeBound::Max) => column.lte(Expr::Value(value)),
		FilterKind::OneOf(_) | FilterKind::Equals | FilterKind::Flag => {
			column.equals(Expr::Value(value))
		}
	};
	PredicateFragment::new(spec.name(), condition)
}

/// Convert a caller value into the filter's domain
fn coerce(spec: &FilterSpec, value: &FilterValue) -> SearchResult<QueryValue> {
	let result = match spec.kind() {
		FilterKind::Range(_) if spec.value_kind() == FieldKind::Date => coerce_date(value),
		FilterKind::Range(_) => coerce_number(value).and_then(|number| {
			if spec.is_non_negative() && number.as_f64().is_some_and(|n| n < 0.0) {
				Err("must not be negative".to_string())
			} else {
				Ok(number)
			}
		}),
		FilterKind::OneOf(allowed) => match value {
			FilterValue::Text(text) if spec.allows(text) => Ok(QueryValue::String(text.clone())),
			other => Err(format!("{other} is not one of: {}", allowed.join(", "))),
		},
		FilterKind::Equals => match value {
			FilterValue::Text(text) if !text.trim().is_empty() => {
				Ok(QueryValue::String(text.trim().to_string()))
			}
			other => Err(format!("expected a non-empty text, got {other}")),
		},
		FilterKind::Flag => match value {
			FilterValue::Bool(flag) => Ok(QueryValue::Bool(*flag)),
			FilterValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
				"true" => Ok(QueryValue::Bool(true)),
				"false" => Ok(QueryValue::Bool(false)),
				_ => Err(format!("expected a boolean, got {value}")),
			},
			other => Err(format!("expected a boolean, got {other}")),
		},
	};

	result.map_err(|reason| {
		tracing::debug!(filter = %spec.name(), %reason, "Rejected filter value");
		SearchError::invalid_filter(spec.name(), reason)
	})
}

fn coerce_number(value: &FilterValue) -> Result<QueryValue, String> {
	let number = match value {
		FilterValue::Int(i) => return Ok(QueryValue::Int(*i)),
		FilterValue::Float(f) => *f,
		FilterValue::Text(text) => {
			let text = text.trim();
			if let Ok(i) = text.parse::<i64>() {
				return Ok(QueryValue::Int(i));
			}
			text.parse::<f64>()
				.map_err(|_| format!("expected a number, got {value}"))?
		}
		FilterValue::Bool(_) => return Err(format!("expected a number, got {value}")),
	};
	if !number.is_finite() {
		return Err(format!("expected a finite number, got {number}"));
	}
	Ok(QueryValue::Float(number))
}

fn coerce_date(value: &FilterValue) -> Result<QueryValue, String> {
	let FilterValue::Text(text) = value else {
		return Err(format!("expected an ISO-8601 date, got {value}"));
	};
	let text = text.trim();
	if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
		return Ok(QueryValue::Date(date));
	}
	DateTime::parse_from_rfc3339(text)
		.map(|timestamp| QueryValue::Timestamp(timestamp.with_timezone(&Utc)))
		.map_err(|_| format!("expected an ISO-8601 date, got {value}"))
}

/// Reject a lower bound above the upper bound on the same column
fn check_ranges(coerced: &[(&FilterSpec, QueryValue)]) -> SearchResult<()> {
	for (min, low) in coerced
		.iter()
		.filter(|(spec, _)| spec.kind() == &FilterKind::Range(RangeBound::Min))
	{
		for (max, high) in coerced.iter().filter(|(spec, _)| {
			spec.kind() == &FilterKind::Range(RangeBound::Max) && spec.column() == min.column()
		}) {
			if low.compare(high) == Some(Ordering::Greater) {
				tracing::debug!(min = %min.name(), max = %max.name(), "Inverted range");
				return Err(SearchError::invalid_filter(
					min.name(),
					format!("{low} is greater than {} ({high})", max.name()),
				));
			}
		}
	}
	Ok(())
}
