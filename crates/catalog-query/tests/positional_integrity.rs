//! Positional integrity property tests
//!
//! Whatever combination of filters and phrase a request carries, the rendered
//! statements bind exactly one value per placeholder, numbered without gaps.

use catalog_core::{FilterValue, Locale, builtin};
use catalog_query::{EntityPlan, PredicateBuilder, RankingComposer, SearchQuery, count_placeholders};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn placeholder_numbers(sql: &str) -> Vec<usize> {
	let mut numbers = Vec::new();
	let mut rest = sql;
	while let Some(pos) = rest.find('$') {
		rest = &rest[pos + 1..];
		let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
		if let Ok(n) = digits.parse() {
			numbers.push(n);
		}
	}
	numbers
}

fn request_filters(
	min_price: Option<i64>,
	max_price: Option<i64>,
	level: Option<usize>,
	max_duration: Option<i64>,
) -> BTreeMap<String, FilterValue> {
	let mut filters = BTreeMap::new();
	if let Some(min) = min_price {
		filters.insert("minPrice".to_string(), FilterValue::Int(min));
	}
	if let Some(max) = max_price {
		filters.insert("maxPrice".to_string(), FilterValue::Int(max));
	}
	if let Some(index) = level {
		let level = builtin::COURSE_LEVELS[index % builtin::COURSE_LEVELS.len()];
		filters.insert("level".to_string(), FilterValue::from(level));
	}
	if let Some(duration) = max_duration {
		filters.insert("maxDuration".to_string(), FilterValue::Int(duration));
	}
	filters
}

proptest! {
	/// Test: placeholders and bound values stay in lockstep
	///
	/// Category: Property
	/// Verifies that both statements number their placeholders 1..n in
	/// textual order and bind exactly n values.
	#[test]
	fn prop_placeholders_match_values(
		min_price in proptest::option::of(0i64..500),
		max_price in proptest::option::of(500i64..1000),
		level in proptest::option::of(0usize..3),
		max_duration in proptest::option::of(0i64..600),
		phrase in proptest::option::of("[a-zA-Z ';&|!]{0,24}"),
		secondary in any::<bool>(),
	) {
		let plan = EntityPlan::compile(builtin::events().unwrap(), &RankingComposer::default());
		let courses = EntityPlan::compile(builtin::courses().unwrap(), &RankingComposer::default());
		let locale = if secondary { Locale::Secondary } else { Locale::Base };
		let query = phrase.as_deref().and_then(SearchQuery::parse);

		for plan in [&plan, &courses] {
			let mut builder = PredicateBuilder::new(plan.entity(), plan.resolver(), locale);
			builder.not_elapsed_at(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
			let filters = request_filters(
				min_price,
				max_price,
				level.filter(|_| plan.name() == "courses"),
				max_duration.filter(|_| plan.name() == "courses"),
			);
			builder.add_filters(&filters).unwrap();
			builder.add_phrase(query.as_ref(), plan.text_search());
			let predicate = Arc::new(builder.build());
			let relevance = plan
				.relevance(query.is_some())
				.to_expr(plan.resolver(), locale, query.as_ref());

			let (count, select) = plan.statements(predicate, relevance, locale, 20, 0);
			for (sql, values) in [count.to_sql(), select.to_sql()] {
				let expected: Vec<usize> = (1..=values.len()).collect();
				prop_assert_eq!(placeholder_numbers(&sql), expected);
				prop_assert_eq!(count_placeholders(&sql), values.len());
			}
		}
	}

	/// Test: the raw phrase never reaches query text
	///
	/// Category: Property
	/// Verifies that characters outside the sanitized token alphabet never
	/// appear in rendered statements, whatever the phrase.
	#[test]
	fn prop_phrase_is_always_bound(phrase in "\\PC{1,40}") {
		let plan = EntityPlan::compile(builtin::products().unwrap(), &RankingComposer::default());
		let query = SearchQuery::parse(&phrase);
		let mut builder = PredicateBuilder::new(plan.entity(), plan.resolver(), Locale::Base);
		builder.add_phrase(query.as_ref(), plan.text_search());
		let relevance = plan
			.relevance(query.is_some())
			.to_expr(plan.resolver(), Locale::Base, query.as_ref());
		let (_, select) = plan.statements(Arc::new(builder.build()), relevance, Locale::Base, 20, 0);
		let (sql, values) = select.to_sql();

		if let Some(query) = &query {
			prop_assert!(values.iter().any(|value| value.as_str() == Some(query.text())));
		}
		prop_assert!(!sql.contains(';'));
	}
}
