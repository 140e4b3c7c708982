//! Expression interpreter for in-memory rows
//!
//! Follows SQL semantics where they matter for search: comparisons involving
//! NULL are NULL, `WHERE` keeps only rows whose condition is TRUE, `COALESCE`
//! and `CONCAT_WS` skip NULLs.
//!
//! Full-text primitives are approximated on normalised tokens: a document
//! matches when it contains every query token, and its score is the fraction
//! of query tokens it contains.

use catalog_core::{QueryValue, Row};
use catalog_query::{CompareOp, Expr, Predicate, SearchQuery};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Evaluate an expression against one row
pub fn eval(expr: &Expr, row: &Row) -> QueryValue {
	match expr {
		Expr::Column(column) => row.get(column.as_str()).cloned().unwrap_or(QueryValue::Null),
		Expr::Value(value) => value.clone(),
		Expr::Constant(constant) => QueryValue::Float(*constant),
		Expr::EmptyText => QueryValue::String(String::new()),
		Expr::Coalesce(args) => args
			.iter()
			.map(|arg| eval(arg, row))
			.find(|value| !value.is_null())
			.unwrap_or(QueryValue::Null),
		Expr::NullIfEmpty(inner) => match eval(inner, row) {
			QueryValue::String(text) if text.is_empty() => QueryValue::Null,
			other => other,
		},
		Expr::Concat(args) => {
			let parts: Vec<String> = args
				.iter()
				.map(|arg| eval(arg, row))
				.filter(|value| !value.is_null())
				.map(|value| value.to_string())
				.collect();
			QueryValue::String(parts.join(" "))
		}
		Expr::Compare { left, op, right } => {
			let ordering = eval(left, row).compare(&eval(right, row));
			match ordering {
				None => QueryValue::Null,
				Some(ordering) => QueryValue::Bool(match op {
					CompareOp::Eq => ordering == Ordering::Equal,
					CompareOp::Gte => ordering != Ordering::Less,
					CompareOp::Lte => ordering != Ordering::Greater,
				}),
			}
		}
		Expr::IsNull(inner) => QueryValue::Bool(eval(inner, row).is_null()),
		Expr::TextMatch {
			document, query, ..
		} => match token_overlap(&eval(document, row), &eval(query, row)) {
			Some((found, wanted)) => QueryValue::Bool(wanted > 0 && found == wanted),
			None => QueryValue::Null,
		},
		Expr::MatchScore {
			document, query, ..
		} => match token_overlap(&eval(document, row), &eval(query, row)) {
			Some((_, 0)) => QueryValue::Float(0.0),
			Some((found, wanted)) => QueryValue::Float(found as f64 / wanted as f64),
			None => QueryValue::Null,
		},
		Expr::WeightedSum(terms) => {
			let mut sum = 0.0;
			for (weight, term) in terms {
				match eval(term, row).as_f64() {
					Some(score) => sum += weight * score,
					None => return QueryValue::Null,
				}
			}
			QueryValue::Float(sum)
		}
	}
}

/// Whether every fragment of the predicate is TRUE for the row
pub fn matches(predicate: &Predicate, row: &Row) -> bool {
	predicate
		.fragments()
		.iter()
		.all(|fragment| eval(fragment.condition(), row) == QueryValue::Bool(true))
}

/// `(query tokens found in document, query tokens)`, `None` when either is NULL
fn token_overlap(document: &QueryValue, query: &QueryValue) -> Option<(usize, usize)> {
	if document.is_null() || query.is_null() {
		return None;
	}
	let document = tokens(&document.to_string());
	let query = SearchQuery::parse(&query.to_string());
	let wanted = query.as_ref().map_or(&[][..], SearchQuery::tokens);
	let found = wanted
		.iter()
		.filter(|token| document.contains(token.as_str()))
		.count();
	Some((found, wanted.len()))
}

fn tokens(text: &str) -> HashSet<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_lowercase)
		.collect()
}

/// SQL ordering of two sort values: NULLs sort last ascending, first descending
pub fn compare_nulls_last(a: &QueryValue, b: &QueryValue) -> Ordering {
	match (a.is_null(), b.is_null()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => a.compare(b).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use catalog_core::{Identifier, TextSearchConfig};
	use rstest::rstest;

	fn col(name: &str) -> Expr {
		Expr::col(&Identifier::new(name).unwrap())
	}

	fn fallback(localized: &str, base: &str) -> Expr {
		Expr::Coalesce(vec![Expr::NullIfEmpty(Box::new(col(localized))), col(base)])
	}

	#[rstest]
	#[case(Row::new().with("title", "Yoga").with("title_fr", "Le yoga"), "Le yoga")]
	#[case(Row::new().with("title", "Yoga").with("title_fr", ""), "Yoga")]
	#[case(Row::new().with("title", "Yoga").with("title_fr", QueryValue::Null), "Yoga")]
	#[case(Row::new().with("title", "Yoga"), "Yoga")]
	fn test_fallback(#[case] row: Row, #[case] expected: &str) {
		assert_eq!(eval(&fallback("title_fr", "title"), &row), QueryValue::from(expected));
	}

	#[rstest]
	fn test_null_comparison_is_null() {
		let row = Row::new().with("price", QueryValue::Null);
		assert_eq!(eval(&col("price").gte(Expr::value(1)), &row), QueryValue::Null);
		assert_eq!(eval(&col("price").is_null(), &row), QueryValue::Bool(true));
	}

	#[rstest]
	#[case("Mindful meditation for beginners", "meditation", 1.0)]
	#[case("Mindful meditation for beginners", "meditation yoga", 0.5)]
	#[case("Desk stretches", "meditation", 0.0)]
	fn test_match_score(#[case] text: &str, #[case] query: &str, #[case] expected: f64) {
		let row = Row::new().with("title", text);
		let score = Expr::MatchScore {
			document: Box::new(col("title")),
			query: Box::new(Expr::value(query)),
			config: TextSearchConfig::Simple,
		};
		assert_eq!(eval(&score, &row), QueryValue::Float(expected));
	}

	#[rstest]
	fn test_text_match_requires_every_token() {
		let row = Row::new().with("title", "Yoga").with("description", QueryValue::Null);
		let document = Expr::Concat(vec![col("title"), col("description")]);
		let matches = |query: &str| {
			eval(
				&Expr::TextMatch {
					document: Box::new(document.clone()),
					query: Box::new(Expr::value(query)),
					config: TextSearchConfig::Simple,
				},
				&row,
			)
		};
		assert_eq!(matches("yoga"), QueryValue::Bool(true));
		assert_eq!(matches("yoga retreat"), QueryValue::Bool(false));
	}

	#[rstest]
	fn test_nulls_sort_last() {
		let mut values = vec![QueryValue::Null, QueryValue::from("b"), QueryValue::from("a")];
		values.sort_by(compare_nulls_last);
		assert_eq!(
			values,
			vec![QueryValue::from("a"), QueryValue::from("b"), QueryValue::Null]
		);
	}
}
