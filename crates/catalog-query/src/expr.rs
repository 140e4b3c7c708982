//! Expression tree and positional rendering
//!
//! Every condition, projection and ranking term is an [`Expr`]. Bound values
//! live inside the tree next to the operator that consumes them, so a
//! fragment always carries exactly the values it references. Placeholders are
//! only numbered when a whole statement is written out by [`SqlWriter`],
//! which walks the tree in textual order.
//!
//! | Expression | Rendered as |
//! |------------|-------------|
//! | `Column` | `"title"` |
//! | `Value` | `$n` |
//! | `Coalesce` | `COALESCE(a, b)` |
//! | `NullIfEmpty` | `NULLIF(x, '')` |
//! | `Concat` | `CONCAT_WS(' ', a, b)` |
//! | `TextMatch` | `to_tsvector('simple', doc) @@ plainto_tsquery('simple', $n)` |
//! | `MatchScore` | `ts_rank(to_tsvector('simple', doc), plainto_tsquery('simple', $n))` |
//! | `WeightedSum` | `(2.0 * a + 1.0 * b)` |

use catalog_core::{Identifier, QueryValue, TextSearchConfig};
use std::fmt;
use std::fmt::Write as _;

/// Comparison operators used by filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Gte,
	Lte,
}

impl CompareOp {
	pub fn as_sql(&self) -> &'static str {
		match self {
			CompareOp::Eq => "=",
			CompareOp::Gte => ">=",
			CompareOp::Lte => "<=",
		}
	}
}

/// A query expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	/// A validated column reference
	Column(Identifier),
	/// A value bound to a positional placeholder
	Value(QueryValue),
	/// A numeric constant from configuration (weights, default relevance)
	Constant(f64),
	/// The empty string literal
	EmptyText,
	/// First non-null argument
	Coalesce(Vec<Expr>),
	/// NULL when the argument is the empty string
	NullIfEmpty(Box<Expr>),
	/// Space-separated concatenation skipping NULLs
	Concat(Vec<Expr>),
	Compare {
		left: Box<Expr>,
		op: CompareOp,
		right: Box<Expr>,
	},
	IsNull(Box<Expr>),
	/// Full-text match of a document against a sanitized query
	TextMatch {
		document: Box<Expr>,
		query: Box<Expr>,
		config: TextSearchConfig,
	},
	/// Full-text relevance score of a document for a sanitized query
	MatchScore {
		document: Box<Expr>,
		query: Box<Expr>,
		config: TextSearchConfig,
	},
	/// Sum of weighted terms
	WeightedSum(Vec<(f64, Expr)>),
}

impl Expr {
	pub fn col(column: &Identifier) -> Self {
		Expr::Column(column.clone())
	}

	pub fn value(value: impl Into<QueryValue>) -> Self {
		Expr::Value(value.into())
	}

	pub fn compare(self, op: CompareOp, right: Expr) -> Self {
		Expr::Compare {
			left: Box::new(self),
			op,
			right: Box::new(right),
		}
	}

	pub fn equals(self, right: Expr) -> Self {
		self.compare(CompareOp::Eq, right)
	}

	pub fn gte(self, right: Expr) -> Self {
		self.compare(CompareOp::Gte, right)
	}

	pub fn lte(self, right: Expr) -> Self {
		self.compare(CompareOp::Lte, right)
	}

	pub fn is_null(self) -> Self {
		Expr::IsNull(Box::new(self))
	}

	/// Bound values in placeholder order
	pub fn values(&self) -> Vec<&QueryValue> {
		let mut out = Vec::new();
		self.collect_values(&mut out);
		out
	}

	pub(crate) fn collect_values<'a>(&'a self, out: &mut Vec<&'a QueryValue>) {
		match self {
			Expr::Value(value) => out.push(value),
			Expr::Column(_) | Expr::Constant(_) | Expr::EmptyText => {}
			Expr::Coalesce(args) | Expr::Concat(args) => {
				for arg in args {
					arg.collect_values(out);
				}
			}
			Expr::NullIfEmpty(inner) | Expr::IsNull(inner) => inner.collect_values(out),
			Expr::Compare { left, right, .. } => {
				left.collect_values(out);
				right.collect_values(out);
			}
			Expr::TextMatch {
				document, query, ..
			}
			| Expr::MatchScore {
				document, query, ..
			} => {
				document.collect_values(out);
				query.collect_values(out);
			}
			Expr::WeightedSum(terms) => {
				for (_, term) in terms {
					term.collect_values(out);
				}
			}
		}
	}
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut writer = SqlWriter::new();
		writer.push_expr(self);
		f.write_str(writer.sql())
	}
}

/// Accumulates query text and the values bound to its placeholders
///
/// Values are numbered `$1..$n` in the order they are written, so the text and
/// the value list can never drift apart.
///
/// # Examples
///
/// ```
/// use catalog_core::Identifier;
/// use catalog_query::{Expr, SqlWriter};
///
/// let price = Identifier::new("price").unwrap();
/// let mut writer = SqlWriter::new();
/// writer.push_expr(&Expr::col(&price).gte(Expr::value(50)));
/// writer.push_str(" AND ");
/// writer.push_expr(&Expr::col(&price).lte(Expr::value(200)));
///
/// let (sql, values) = writer.finish();
/// assert_eq!(sql, r#""price" >= $1 AND "price" <= $2"#);
/// assert_eq!(values.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SqlWriter {
	sql: String,
	values: Vec<QueryValue>,
}

impl SqlWriter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_str(&mut self, text: &str) {
		self.sql.push_str(text);
	}

	pub fn push_identifier(&mut self, ident: &Identifier) {
		self.sql.push_str(&ident.quoted());
	}

	/// Bind a value and write its placeholder
	pub fn push_value(&mut self, value: &QueryValue) {
		self.values.push(value.clone());
		let _ = write!(self.sql, "${}", self.values.len());
	}

	pub fn push_expr(&mut self, expr: &Expr) {
		match expr {
			Expr::Column(column) => self.push_identifier(column),
			Expr::Value(value) => self.push_value(value),
			Expr::Constant(constant) => {
				let _ = write!(self.sql, "{constant:?}");
			}
			Expr::EmptyText => self.push_str("''"),
			Expr::Coalesce(args) => self.push_call("COALESCE(", args),
			Expr::NullIfEmpty(inner) => {
				self.push_str("NULLIF(");
				self.push_expr(inner);
				self.push_str(", '')");
			}
			Expr::Concat(args) if args.is_empty() => self.push_str("''"),
			Expr::Concat(args) => self.push_call("CONCAT_WS(' ', ", args),
			Expr::Compare { left, op, right } => {
				self.push_expr(left);
				self.push_str(" ");
				self.push_str(op.as_sql());
				self.push_str(" ");
				self.push_expr(right);
			}
			Expr::IsNull(inner) => {
				self.push_expr(inner);
				self.push_str(" IS NULL");
			}
			Expr::TextMatch {
				document,
				query,
				config,
			} => {
				self.push_tsvector(document, *config);
				self.push_str(" @@ ");
				self.push_tsquery(query, *config);
			}
			Expr::MatchScore {
				document,
				query,
				config,
			} => {
				self.push_str("ts_rank(");
				self.push_tsvector(document, *config);
				self.push_str(", ");
				self.push_tsquery(query, *config);
				self.push_str(")");
			}
			Expr::WeightedSum(terms) => {
				if terms.is_empty() {
					self.push_str("0.0");
					return;
				}
				self.push_str("(");
				for (i, (weight, term)) in terms.iter().enumerate() {
					if i > 0 {
						self.push_str(" + ");
					}
					let _ = write!(self.sql, "{weight:?} * ");
					self.push_expr(term);
				}
				self.push_str(")");
			}
		}
	}

	fn push_call(&mut self, open: &str, args: &[Expr]) {
		self.push_str(open);
		for (i, arg) in args.iter().enumerate() {
			if i > 0 {
				self.push_str(", ");
			}
			self.push_expr(arg);
		}
		self.push_str(")");
	}

	fn push_tsvector(&mut self, document: &Expr, config: TextSearchConfig) {
		self.push_str("to_tsvector(");
		self.push_str(config.as_sql());
		self.push_str(", ");
		self.push_expr(document);
		self.push_str(")");
	}

	fn push_tsquery(&mut self, query: &Expr, config: TextSearchConfig) {
		self.push_str("plainto_tsquery(");
		self.push_str(config.as_sql());
		self.push_str(", ");
		self.push_expr(query);
		self.push_str(")");
	}

	pub fn sql(&self) -> &str {
		&self.sql
	}

	pub fn values(&self) -> &[QueryValue] {
		&self.values
	}

	pub fn finish(self) -> (String, Vec<QueryValue>) {
		(self.sql, self.values)
	}
}

/// Count `$n` placeholders in rendered query text
///
/// String literals are skipped; rendered text never contains `$` elsewhere.
pub fn count_placeholders(sql: &str) -> usize {
	let mut count = 0;
	let mut in_literal = false;
	let mut chars = sql.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'\'' => in_literal = !in_literal,
			'$' if !in_literal => {
				if chars.peek().is_some_and(|next| next.is_ascii_digit()) {
					count += 1;
				}
			}
			_ => {}
		}
	}
	count
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ident(name: &str) -> Identifier {
		Identifier::new(name).unwrap()
	}

	#[rstest]
	fn test_fallback_expression() {
		let expr = Expr::Coalesce(vec![
			Expr::NullIfEmpty(Box::new(Expr::col(&ident("title_fr")))),
			Expr::col(&ident("title")),
		]);
		assert_eq!(
			expr.to_string(),
			r#"COALESCE(NULLIF("title_fr", ''), "title")"#
		);
		assert!(expr.values().is_empty());
	}

	#[rstest]
	fn test_match_score_binds_query() {
		let expr = Expr::MatchScore {
			document: Box::new(Expr::col(&ident("title"))),
			query: Box::new(Expr::value("yoga")),
			config: TextSearchConfig::English,
		};
		let mut writer = SqlWriter::new();
		writer.push_expr(&expr);
		let (sql, values) = writer.finish();
		assert_eq!(
			sql,
			r#"ts_rank(to_tsvector('english', "title"), plainto_tsquery('english', $1))"#
		);
		assert_eq!(values, vec![QueryValue::from("yoga")]);
	}

	#[rstest]
	fn test_weighted_sum() {
		let expr = Expr::WeightedSum(vec![
			(2.0, Expr::col(&ident("a"))),
			(0.5, Expr::col(&ident("b"))),
		]);
		assert_eq!(expr.to_string(), r#"(2.0 * "a" + 0.5 * "b")"#);
		assert_eq!(Expr::WeightedSum(Vec::new()).to_string(), "0.0");
		assert_eq!(Expr::Concat(Vec::new()).to_string(), "''");
	}

	#[rstest]
	fn test_values_follow_render_order() {
		let expr = Expr::Coalesce(vec![
			Expr::value(1),
			Expr::col(&ident("x")).gte(Expr::value(2)),
			Expr::value(3),
		]);
		let mut writer = SqlWriter::new();
		writer.push_expr(&expr);
		let rendered: Vec<QueryValue> = writer.values().to_vec();
		let collected: Vec<QueryValue> = expr.values().into_iter().cloned().collect();
		assert_eq!(rendered, collected);
		assert_eq!(writer.sql(), r#"COALESCE($1, "x" >= $2, $3)"#);
	}

	#[rstest]
	#[case(r#""price" >= $1 AND "price" <= $2"#, 2)]
	#[case("NULLIF(\"t\", '') = '$1'", 0)]
	#[case("SELECT 1", 0)]
	#[case("$10 $11", 2)]
	fn test_count_placeholders(#[case] sql: &str, #[case] expected: usize) {
		assert_eq!(count_placeholders(sql), expected);
	}
}
