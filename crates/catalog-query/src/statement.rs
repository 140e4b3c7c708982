//! Count and data statements
//!
//! Both statements of a search hold the same [`Predicate`] behind an `Arc`, so
//! the count always covers exactly the rows the page is drawn from.

use crate::expr::{Expr, SqlWriter};
use crate::predicate::Predicate;
use catalog_core::{Identifier, QueryValue, RELEVANCE_COLUMN};
use std::sync::Arc;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Asc,
	Desc,
}

impl Direction {
	pub fn as_sql(&self) -> &'static str {
		match self {
			Direction::Asc => "ASC",
			Direction::Desc => "DESC",
		}
	}
}

/// What an ORDER BY key sorts on
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTarget {
	/// The projected relevance column
	Relevance,
	Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
	pub target: OrderTarget,
	pub direction: Direction,
}

impl OrderKey {
	pub fn relevance_desc() -> Self {
		Self {
			target: OrderTarget::Relevance,
			direction: Direction::Desc,
		}
	}

	pub fn asc(expr: Expr) -> Self {
		Self {
			target: OrderTarget::Expr(expr),
			direction: Direction::Asc,
		}
	}
}

/// A projected expression and the name it is returned under
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
	pub alias: Identifier,
	pub expr: Expr,
}

/// `SELECT COUNT(*)` over the predicate, without ordering or limits
#[derive(Debug, Clone, PartialEq)]
pub struct CountStatement {
	table: Identifier,
	predicate: Arc<Predicate>,
}

impl CountStatement {
	pub fn new(table: Identifier, predicate: Arc<Predicate>) -> Self {
		Self { table, predicate }
	}

	pub fn table(&self) -> &Identifier {
		&self.table
	}

	pub fn predicate(&self) -> &Arc<Predicate> {
		&self.predicate
	}

	pub fn to_sql(&self) -> (String, Vec<QueryValue>) {
		let mut writer = SqlWriter::new();
		writer.push_str("SELECT COUNT(*) AS \"total\" FROM ");
		writer.push_identifier(&self.table);
		writer.push_str(" WHERE ");
		self.predicate.render_into(&mut writer);
		writer.finish()
	}
}

/// The ordered, limited data query of one page
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
	table: Identifier,
	projections: Vec<Projection>,
	relevance: Expr,
	predicate: Arc<Predicate>,
	order: Vec<OrderKey>,
	limit: u32,
	offset: u64,
}

impl SelectStatement {
	pub fn new(
		table: Identifier,
		projections: Vec<Projection>,
		relevance: Expr,
		predicate: Arc<Predicate>,
		order: Vec<OrderKey>,
		limit: u32,
		offset: u64,
	) -> Self {
		Self {
			table,
			projections,
			relevance,
			predicate,
			order,
			limit,
			offset,
		}
	}

	pub fn table(&self) -> &Identifier {
		&self.table
	}

	pub fn projections(&self) -> &[Projection] {
		&self.projections
	}

	pub fn relevance(&self) -> &Expr {
		&self.relevance
	}

	pub fn predicate(&self) -> &Arc<Predicate> {
		&self.predicate
	}

	pub fn order(&self) -> &[OrderKey] {
		&self.order
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Render the statement, numbering placeholders in textual order:
	/// projections first, then the predicate, then `LIMIT` and `OFFSET`
	pub fn to_sql(&self) -> (String, Vec<QueryValue>) {
		let mut writer = SqlWriter::new();
		writer.push_str("SELECT ");
		for projection in &self.projections {
			writer.push_expr(&projection.expr);
			writer.push_str(" AS ");
			writer.push_identifier(&projection.alias);
			writer.push_str(", ");
		}
		writer.push_str("CAST(");
		writer.push_expr(&self.relevance);
		writer.push_str(" AS DOUBLE PRECISION) AS \"");
		writer.push_str(RELEVANCE_COLUMN);
		writer.push_str("\" FROM ");
		writer.push_identifier(&self.table);
		writer.push_str(" WHERE ");
		self.predicate.render_into(&mut writer);

		for (i, key) in self.order.iter().enumerate() {
			writer.push_str(if i == 0 { " ORDER BY " } else { ", " });
			match &key.target {
				OrderTarget::Relevance => {
					writer.push_str("\"");
					writer.push_str(RELEVANCE_COLUMN);
					writer.push_str("\"");
				}
				OrderTarget::Expr(expr) => writer.push_expr(expr),
			}
			writer.push_str(" ");
			writer.push_str(key.direction.as_sql());
		}

		writer.push_str(" LIMIT ");
		writer.push_value(&QueryValue::Int(i64::from(self.limit)));
		writer.push_str(" OFFSET ");
		writer.push_value(&QueryValue::Int(
			i64::try_from(self.offset).unwrap_or(i64::MAX),
		));
		writer.finish()
	}
}
