//! PostgreSQL backend

use crate::backend::SearchBackend;
use async_trait::async_trait;
use catalog_core::{BackendError, BackendResult, Consistency, QueryValue, Row};
use catalog_query::{CountStatement, SelectStatement};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Executor, PgPool, Postgres, TypeInfo, ValueRef};
use std::sync::Arc;

/// Runs search statements on a PostgreSQL pool
///
/// Under [`Consistency::Snapshot`] both statements run in one
/// `REPEATABLE READ READ ONLY` transaction.
pub struct PostgresBackend {
	pool: Arc<PgPool>,
}

impl PostgresBackend {
	pub fn new(pool: PgPool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	pub async fn connect(url: &str) -> BackendResult<Self> {
		let pool = PgPoolOptions::new()
			.connect(url)
			.await
			.map_err(storage_error)?;
		Ok(Self::new(pool))
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	fn bind_value<'q>(
		query: Query<'q, Postgres, PgArguments>,
		value: &'q QueryValue,
	) -> Query<'q, Postgres, PgArguments> {
		match value {
			QueryValue::Null => query.bind(None::<i32>),
			QueryValue::Bool(b) => query.bind(b),
			QueryValue::Int(i) => query.bind(i),
			QueryValue::Float(f) => query.bind(f),
			QueryValue::String(s) => query.bind(s),
			QueryValue::Date(d) => query.bind(d),
			QueryValue::Timestamp(dt) => query.bind(dt),
		}
	}

	fn build_query<'q>(sql: &'q str, values: &'q [QueryValue]) -> Query<'q, Postgres, PgArguments> {
		let mut query = sqlx::query(sql);
		for value in values {
			query = Self::bind_value(query, value);
		}
		query
	}

	async fn count_on<'e, E>(executor: E, statement: &CountStatement) -> BackendResult<u64>
	where
		E: Executor<'e, Database = Postgres>,
	{
		use sqlx::Row as _;

		let (sql, values) = statement.to_sql();
		tracing::debug!(%sql, values = values.len(), "Executing count statement");
		let row = Self::build_query(&sql, &values)
			.fetch_one(executor)
			.await
			.map_err(storage_error)?;
		let total: i64 = row.try_get("total").map_err(storage_error)?;
		u64::try_from(total).map_err(|_| BackendError::Decode(format!("negative count: {total}")))
	}

	async fn fetch_on<'e, E>(executor: E, statement: &SelectStatement) -> BackendResult<Vec<Row>>
	where
		E: Executor<'e, Database = Postgres>,
	{
		let (sql, values) = statement.to_sql();
		tracing::debug!(%sql, values = values.len(), "Executing select statement");
		let rows = Self::build_query(&sql, &values)
			.fetch_all(executor)
			.await
			.map_err(storage_error)?;
		rows.into_iter().map(convert_row).collect()
	}
}

#[async_trait]
impl SearchBackend for PostgresBackend {
	async fn count(&self, statement: &CountStatement) -> BackendResult<u64> {
		Self::count_on(self.pool.as_ref(), statement).await
	}

	async fn fetch(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>> {
		Self::fetch_on(self.pool.as_ref(), statement).await
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
				let mut tx = self.pool.begin().await.map_err(storage_error)?;
				sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
					.execute(&mut *tx)
					.await
					.map_err(storage_error)?;
				let total = Self::count_on(&mut *tx, count).await?;
				let rows = Self::fetch_on(&mut *tx, select).await?;
				// Read-only: committing only releases the snapshot
				tx.commit().await.map_err(storage_error)?;
				Ok((total, rows))
			}
		}
	}

	fn name(&self) -> &'static str {
		"postgres"
	}
}

/// Map a driver error onto the backend taxonomy
pub fn storage_error(err: sqlx::Error) -> BackendError {
	match &err {
		sqlx::Error::PoolTimedOut => BackendError::Timeout(err.to_string()),
		sqlx::Error::Io(_)
		| sqlx::Error::Tls(_)
		| sqlx::Error::PoolClosed
		| sqlx::Error::WorkerCrashed => BackendError::Connection(err.to_string()),
		sqlx::Error::ColumnDecode { .. }
		| sqlx::Error::Decode(_)
		| sqlx::Error::ColumnNotFound(_)
		| sqlx::Error::TypeNotFound { .. } => BackendError::Decode(err.to_string()),
		_ => BackendError::Execution(err.to_string()),
	}
}

fn convert_row(pg_row: PgRow) -> BackendResult<Row> {
	use rust_decimal::prelude::ToPrimitive;
	use sqlx::Row as _;

	let mut row = Row::new();
	for column in pg_row.columns() {
		let name = column.name();
		let raw = pg_row.try_get_raw(column.ordinal()).map_err(storage_error)?;
		if raw.is_null() {
			row.insert(name, QueryValue::Null);
			continue;
		}

		let value = if let Ok(value) = pg_row.try_get::<bool, _>(name) {
			QueryValue::Bool(value)
		} else if let Ok(value) = pg_row.try_get::<i64, _>(name) {
			QueryValue::Int(value)
		} else if let Ok(value) = pg_row.try_get::<i32, _>(name) {
			QueryValue::Int(i64::from(value))
		} else if let Ok(value) = pg_row.try_get::<i16, _>(name) {
			QueryValue::Int(i64::from(value))
		} else if let Ok(value) = pg_row.try_get::<f64, _>(name) {
			QueryValue::Float(value)
		} else if let Ok(value) = pg_row.try_get::<rust_decimal::Decimal, _>(name) {
			QueryValue::Float(value.to_f64().ok_or_else(|| {
				BackendError::Decode(format!("column '{name}': {value} does not fit a float"))
			})?)
		} else if let Ok(value) = pg_row.try_get::<String, _>(name) {
			QueryValue::String(value)
		} else if let Ok(value) = pg_row.try_get::<chrono::NaiveDate, _>(name) {
			QueryValue::Date(value)
		} else if let Ok(value) = pg_row.try_get::<chrono::DateTime<chrono::Utc>, _>(name) {
			QueryValue::Timestamp(value)
		} else if let Ok(value) = pg_row.try_get::<chrono::NaiveDateTime, _>(name) {
			QueryValue::Timestamp(value.and_utc())
		} else {
			return Err(BackendError::Decode(format!(
				"column '{name}' has unsupported type {}",
				column.type_info().name()
			)));
		};
		row.insert(name, value);
	}
	Ok(row)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(sqlx::Error::PoolTimedOut, "Timeout")]
	#[case(sqlx::Error::PoolClosed, "Connection")]
	#[case(sqlx::Error::WorkerCrashed, "Connection")]
	#[case(sqlx::Error::ColumnNotFound("total".to_string()), "Decode")]
	#[case(sqlx::Error::RowNotFound, "Execution")]
	#[case(sqlx::Error::Protocol("unexpected message".to_string()), "Execution")]
	fn test_storage_error_mapping(#[case] err: sqlx::Error, #[case] expected: &str) {
		let mapped = match storage_error(err) {
			BackendError::Connection(_) => "Connection",
			BackendError::Timeout(_) => "Timeout",
			BackendError::Execution(_) => "Execution",
			BackendError::Decode(_) => "Decode",
			_ => "other",
		};
		assert_eq!(mapped, expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_connect_failure_is_storage_error() {
		let pool = PgPoolOptions::new()
			.acquire_timeout(std::time::Duration::from_millis(50))
			.connect_lazy("postgres://nobody@127.0.0.1:1/catalog")
			.unwrap();
		let backend = PostgresBackend::new(pool);
		let plan = catalog_query::EntityPlan::compile(
			catalog_core::builtin::products().unwrap(),
			&catalog_query::RankingComposer::default(),
		);
		let predicate = std::sync::Arc::new(
			catalog_query::PredicateBuilder::new(
				plan.entity(),
				plan.resolver(),
				catalog_core::Locale::Base,
			)
			.build(),
		);
		let relevance = plan
			.relevance(false)
			.to_expr(plan.resolver(), catalog_core::Locale::Base, None);
		let (count, _) = plan.statements(predicate, relevance, catalog_core::Locale::Base, 20, 0);
		assert!(backend.count(&count).await.is_err());
	}
}
