//! Storage collaborator contract

use async_trait::async_trait;
use catalog_core::{BackendResult, Consistency, Row};
use catalog_query::{CountStatement, SelectStatement};

/// A store able to run the count and data statements of a search
///
/// Implementations receive fully assembled statements. Rows returned by
/// [`fetch`](SearchBackend::fetch) carry every projected column, the
/// relevance column included, in projection order.
#[async_trait]
pub trait SearchBackend: Send + Sync {
	/// Number of rows matching the statement's predicate
	async fn count(&self, statement: &CountStatement) -> BackendResult<u64>;

	/// One ordered, limited page of rows
	async fn fetch(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>>;

	/// Run both statements of a search
	///
	/// The default runs them one after the other with no isolation between
	/// them, whatever the requested consistency. Backends able to read both
	/// from a single snapshot override this for [`Consistency::Snapshot`].
	async fn count_and_fetch(
		&self,
		count: &CountStatement,
		select: &SelectStatement,
		_consistency: Consistency,
	) -> BackendResult<(u64, Vec<Row>)> {
		let total = self.count(count).await?;
		let rows = self.fetch(select).await?;
		Ok((total, rows))
	}

	/// Short backend name for logs
	fn name(&self) -> &'static str;
}
