//! Validated, fully composed searches

use catalog_core::{Locale, SearchError, SearchResult};
use catalog_query::{CountStatement, SelectStatement};

/// Limit and offset of a request, checked against the page bounds
///
/// A missing limit takes `default_limit`, a missing offset is 0. Values
/// outside `[1, max_limit]` and negative offsets are rejected rather than
/// clamped.
pub fn page_bounds(
	limit: Option<i64>,
	offset: Option<i64>,
	default_limit: u32,
	max_limit: u32,
) -> SearchResult<(u32, u64)> {
	let limit = limit.unwrap_or(i64::from(default_limit));
	let limit = u32::try_from(limit)
		.ok()
		.filter(|limit| (1..=max_limit).contains(limit))
		.ok_or_else(|| {
			SearchError::InvalidRequest(format!(
				"limit must be between 1 and {max_limit}, got {limit}"
			))
		})?;

	let offset = offset.unwrap_or(0);
	let offset = u64::try_from(offset).map_err(|_| {
		SearchError::InvalidRequest(format!("offset must not be negative, got {offset}"))
	})?;

	Ok((limit, offset))
}

/// A search ready to run: both statements plus the page window
#[derive(Debug, Clone)]
pub struct PreparedSearch {
	pub(crate) entity: String,
	pub(crate) locale: Locale,
	pub(crate) limit: u32,
	pub(crate) offset: u64,
	pub(crate) tokens: usize,
	pub(crate) count: CountStatement,
	pub(crate) select: SelectStatement,
}

impl PreparedSearch {
	pub fn entity(&self) -> &str {
		&self.entity
	}

	pub fn locale(&self) -> Locale {
		self.locale
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Number of sanitized phrase tokens, 0 without a search
	pub fn tokens(&self) -> usize {
		self.tokens
	}

	pub fn has_phrase(&self) -> bool {
		self.tokens > 0
	}

	pub fn count(&self) -> &CountStatement {
		&self.count
	}

	pub fn select(&self) -> &SelectStatement {
		&self.select
	}

	/// Rendered text of both statements, one per line
	pub fn explain(&self) -> String {
		let (count, _) = self.count.to_sql();
		let (select, _) = self.select.to_sql();
		format!("{count}\n{select}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case::defaults(None, None, (20, 0))]
	#[case::smallest(Some(1), Some(0), (1, 0))]
	#[case::largest(Some(100), Some(40), (100, 40))]
	fn test_accepted_bounds(
		#[case] limit: Option<i64>,
		#[case] offset: Option<i64>,
		#[case] expected: (u32, u64),
	) {
		assert_eq!(page_bounds(limit, offset, 20, 100).unwrap(), expected);
	}

	#[rstest]
	#[case::zero_limit(Some(0), None)]
	#[case::above_max(Some(101), None)]
	#[case::negative_limit(Some(-5), None)]
	#[case::huge_limit(Some(i64::MAX), None)]
	#[case::negative_offset(None, Some(-1))]
	fn test_rejected_bounds(#[case] limit: Option<i64>, #[case] offset: Option<i64>) {
		assert!(matches!(
			page_bounds(limit, offset, 20, 100),
			Err(SearchError::InvalidRequest(_))
		));
	}

	#[rstest]
	fn test_configured_max_limit() {
		assert!(page_bounds(Some(50), None, 10, 50).is_ok());
		assert!(page_bounds(Some(51), None, 10, 50).is_err());
	}
}
