//! In-memory backend
//!
//! Runs statements by interpreting their expression trees over tables of
//! [`Row`]s. Used by tests and demos; call counters and failure injection
//! make executor behaviour observable.

use crate::backend::SearchBackend;
use crate::eval::{compare_nulls_last, eval, matches};
use async_trait::async_trait;
use catalog_core::{
	BackendError, BackendResult, Consistency, QueryValue, RELEVANCE_COLUMN, Row,
};
use catalog_query::{CountStatement, Direction, OrderTarget, SelectStatement};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

/// Failure the backend reports instead of running statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
	Connection,
	Timeout,
	Execution,
}

impl Failure {
	fn to_error(self) -> BackendError {
		match self {
			Failure::Connection => BackendError::Connection("connection refused".to_string()),
			Failure::Timeout => BackendError::Timeout("statement timed out".to_string()),
			Failure::Execution => BackendError::Execution("statement failed".to_string()),
		}
	}
}

/// Number of calls received, by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallStats {
	pub counts: usize,
	pub fetches: usize,
	/// `count_and_fetch` calls served from a single snapshot
	pub snapshots: usize,
}

impl CallStats {
	pub fn total(&self) -> usize {
		self.counts + self.fetches + self.snapshots
	}
}

/// Tables of rows held in process
///
/// # Examples
///
/// ```
/// use catalog_backends::MemoryBackend;
/// use catalog_core::Row;
///
/// let backend = MemoryBackend::new();
/// backend.insert("courses", Row::new().with("id", 1).with("title", "Yoga"));
/// assert_eq!(backend.row_count("courses"), 1);
/// assert_eq!(backend.stats().total(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
	tables: RwLock<HashMap<String, Vec<Row>>>,
	failure: RwLock<Option<Failure>>,
	latency: Option<Duration>,
	counts: AtomicUsize,
	fetches: AtomicUsize,
	snapshots: AtomicUsize,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Delay every call, to exercise timeouts and cancellation
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Row>) -> Self {
		self.tables
			.write()
			.entry(table.to_string())
			.or_default()
			.extend(rows);
		self
	}

	pub fn insert(&self, table: &str, row: Row) {
		self.tables
			.write()
			.entry(table.to_string())
			.or_default()
			.push(row);
	}

	pub fn row_count(&self, table: &str) -> usize {
		self.tables.read().get(table).map_or(0, Vec::len)
	}

	/// Fail every subsequent call until [`recover`](Self::recover)
	pub fn fail_with(&self, failure: Failure) {
		*self.failure.write() = Some(failure);
	}

	pub fn recover(&self) {
		*self.failure.write() = None;
	}

	pub fn stats(&self) -> CallStats {
		CallStats {
			counts: self.counts.load(AtomicOrdering::SeqCst),
			fetches: self.fetches.load(AtomicOrdering::SeqCst),
			snapshots: self.snapshots.load(AtomicOrdering::SeqCst),
		}
	}

	async fn enter(&self, counter: &AtomicUsize) -> BackendResult<()> {
		counter.fetch_add(1, AtomicOrdering::SeqCst);
		if let Some(latency) = self.latency {
			tokio::time::sleep(latency).await;
		}
		match *self.failure.read() {
			Some(failure) => {
				tracing::debug!(?failure, "Injected backend failure");
				Err(failure.to_error())
			}
			None => Ok(()),
		}
	}

	fn count_in(tables: &HashMap<String, Vec<Row>>, statement: &CountStatement) -> BackendResult<u64> {
		let rows = table(tables, statement.table().as_str())?;
		let total = rows
			.iter()
			.filter(|row| matches(statement.predicate(), row))
			.count();
		tracing::debug!(table = %statement.table(), scanned = rows.len(), total, "Counted in memory");
		Ok(total as u64)
	}

	fn fetch_in(tables: &HashMap<String, Vec<Row>>, statement: &SelectStatement) -> BackendResult<Vec<Row>> {
		let rows = table(tables, statement.table().as_str())?;

		let mut selected: Vec<(&Row, f64)> = Vec::new();
		for row in rows.iter().filter(|row| matches(statement.predicate(), row)) {
			let relevance = eval(statement.relevance(), row).as_f64().ok_or_else(|| {
				BackendError::Execution("relevance did not evaluate to a number".to_string())
			})?;
			selected.push((row, relevance));
		}
		tracing::debug!(
			table = %statement.table(),
			scanned = rows.len(),
			matched = selected.len(),
			"Evaluated select in memory"
		);

		selected.sort_by(|(a, a_relevance), (b, b_relevance)| {
			for key in statement.order() {
				let ordering = match &key.target {
					OrderTarget::Relevance => a_relevance.total_cmp(b_relevance),
					OrderTarget::Expr(expr) => compare_nulls_last(&eval(expr, a), &eval(expr, b)),
				};
				let ordering = match key.direction {
					Direction::Asc => ordering,
					Direction::Desc => ordering.reverse(),
				};
				if ordering != Ordering::Equal {
					return ordering;
				}
			}
			Ordering::Equal
		});

		let offset = usize::try_from(statement.offset()).unwrap_or(usize::MAX);
		let page = selected
			.into_iter()
			.skip(offset)
			.take(statement.limit() as usize)
			.map(|(row, relevance)| {
				let mut projected: Row = statement
					.projections()
					.iter()
					.map(|projection| (projection.alias.to_string(), eval(&projection.expr, row)))
					.collect();
				projected.insert(RELEVANCE_COLUMN, QueryValue::Float(relevance));
				projected
			})
			.collect();
		Ok(page)
	}
}

fn table<'a>(tables: &'a HashMap<String, Vec<Row>>, name: &str) -> BackendResult<&'a [Row]> {
	tables
		.get(name)
		.map(Vec::as_slice)
		.ok_or_else(|| BackendError::Execution(format!("relation \"{name}\" does not exist")))
}

#[async_trait]
impl SearchBackend for MemoryBackend {
	async fn count(&self, statement: &CountStatement) -> BackendResult<u64> {
		self.enter(&self.counts).await?;
		Self::count_in(&self.tables.read(), statement)
	}

	async fn fetch(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>> {
		self.enter(&self.fetches).await?;
		Self::fetch_in(&self.tables.read(), statement)
	}

	async fn count_and_fetch(
		&self,
		count: &CountStatement,
		select: &SelectStatement,
		consistency: Consistency,
	) -> BackendResult<(u64, Vec<Row>)> {
		match consistency {
			Consistency::Independent => {
				let total = self.count(count).await?;
				let rows = self.fetch(select).await?;
				Ok((total, rows))
			}
			Consistency::Snapshot => {
				self.enter(&self.snapshots).await?;
				let tables = self.tables.read();
				Ok((Self::count_in(&tables, count)?, Self::fetch_in(&tables, select)?))
			}
		}
	}

	fn name(&self) -> &'static str {
		"memory"
	}
}
