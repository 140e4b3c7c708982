//! Locale fallback through the full pipeline

use catalog_search::prelude::*;
use rstest::{fixture, rstest};
use std::sync::Arc;

fn course(id: i64, title: &str, title_fr: QueryValue) -> Row {
	Row::new()
		.with("id", id)
		.with("title", title)
		.with("title_fr", title_fr)
		.with("description", "Weekly class")
		.with("description_fr", "Cours hebdomadaire")
		.with("price", 40)
		.with("level", "beginner")
		.with("duration_minutes", 60)
		.with("is_published", true)
}

#[fixture]
fn executor() -> PagedQueryExecutor {
	let backend = MemoryBackend::new().with_rows(
		"courses",
		vec![
			course(1, "Meditation", QueryValue::from("Méditation")),
			course(2, "Breathing", QueryValue::from("")),
			course(3, "Yoga", QueryValue::Null),
		],
	);
	PagedQueryExecutor::new(Arc::new(backend)).with_entities([builtin::courses().unwrap()])
}

fn titles(page: &Page) -> Vec<(i64, String)> {
	page.items
		.iter()
		.map(|item| {
			(
				item.fields.get("id").and_then(QueryValue::as_i64).unwrap_or_default(),
				item.fields.text("title").unwrap_or_default().to_string(),
			)
		})
		.collect()
}

/// Test: override used when present, base title when empty or NULL
/// Category: Locale fallback
#[rstest]
#[tokio::test]
async fn test_secondary_locale_falls_back(executor: PagedQueryExecutor) {
	let page = executor
		.search("courses", &SearchRequest::new("fr"))
		.await
		.unwrap();

	// Sorted on the resolved title
	assert_eq!(
		titles(&page),
		vec![
			(2, "Breathing".to_string()),
			(1, "Méditation".to_string()),
			(3, "Yoga".to_string()),
		]
	);
	assert!(
		page.items
			.iter()
			.all(|item| item.fields.text("description") == Some("Cours hebdomadaire"))
	);
}

#[rstest]
#[case("en")]
#[case("base")]
#[tokio::test]
async fn test_base_locale_ignores_overrides(executor: PagedQueryExecutor, #[case] locale: &str) {
	let page = executor
		.search("courses", &SearchRequest::new(locale))
		.await
		.unwrap();

	assert_eq!(
		titles(&page),
		vec![
			(2, "Breathing".to_string()),
			(1, "Meditation".to_string()),
			(3, "Yoga".to_string()),
		]
	);
}

#[rstest]
#[case::localized_text("fr", "méditation", vec![1])]
#[case::base_text_not_searched_when_overridden("fr", "meditation", vec![])]
#[case::fallback_text_searched("fr", "breathing", vec![2])]
#[case::base_locale("en", "meditation", vec![1])]
#[tokio::test]
async fn test_phrase_searches_resolved_text(
	executor: PagedQueryExecutor,
	#[case] locale: &str,
	#[case] phrase: &str,
	#[case] expected: Vec<i64>,
) {
	let page = executor
		.search("courses", &SearchRequest::new(locale).phrase(phrase))
		.await
		.unwrap();
	let ids: Vec<i64> = titles(&page).into_iter().map(|(id, _)| id).collect();
	assert_eq!(ids, expected);
}

#[rstest]
fn test_locale_only_selects_expressions(executor: PagedQueryExecutor) {
	let plan = executor.plan("courses").unwrap();
	let secondary = executor
		.prepare(&SearchRequest::new("FR"), plan)
		.unwrap()
		.explain();
	let base = executor
		.prepare(&SearchRequest::new("en"), plan)
		.unwrap()
		.explain();

	assert!(secondary.contains(r#"COALESCE(NULLIF("title_fr", ''), "title") AS "title""#));
	assert!(!base.contains("title_fr"));
	assert!(!secondary.contains("'fr'"));
}
