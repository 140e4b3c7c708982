//! Paginated search results

use crate::types::Row;
use serde::Serialize;

/// One matching record with its computed relevance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
	#[serde(flatten)]
	pub fields: Row,
	pub relevance: f64,
}

impl ScoredRecord {
	pub fn new(fields: Row, relevance: f64) -> Self {
		Self { fields, relevance }
	}
}

/// One page of results
///
/// `total` counts every record matching the request's predicate, ignoring
/// pagination. `has_more` is derived, never stored independently.
///
/// # Examples
///
/// ```
/// use catalog_core::{Page, Row, ScoredRecord};
///
/// let items = vec![ScoredRecord::new(Row::new().with("title", "Yoga"), 1.0)];
/// let page = Page::new(items, 3, 1, 0);
/// assert!(page.has_more);
///
/// let json = serde_json::to_value(&page).unwrap();
/// assert_eq!(json["hasMore"], true);
/// assert_eq!(json["items"][0]["title"], "Yoga");
/// assert_eq!(json["items"][0]["relevance"], 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
	pub items: Vec<ScoredRecord>,
	pub total: u64,
	pub limit: u32,
	pub offset: u64,
	pub has_more: bool,
}

impl Page {
	pub fn new(items: Vec<ScoredRecord>, total: u64, limit: u32, offset: u64) -> Self {
		let has_more = offset.saturating_add(items.len() as u64) < total;
		Self {
			items,
			total,
			limit,
			offset,
			has_more,
		}
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn records(count: usize) -> Vec<ScoredRecord> {
		(0..count)
			.map(|i| ScoredRecord::new(Row::new().with("id", i as i64), 1.0))
			.collect()
	}

	#[rstest]
	#[case::first_of_many(20, 0, 50, true)]
	#[case::last_partial(5, 45, 50, false)]
	#[case::exact_fit(20, 30, 50, false)]
	#[case::empty_catalog(0, 0, 0, false)]
	#[case::offset_past_end(0, 100, 10, false)]
	fn test_has_more(
		#[case] returned: usize,
		#[case] offset: u64,
		#[case] total: u64,
		#[case] expected: bool,
	) {
		let page = Page::new(records(returned), total, 20, offset);
		assert_eq!(page.has_more, expected);
	}
}
