//! Paged search execution

use crate::prepared::{PreparedSearch, page_bounds};
use catalog_backends::SearchBackend;
use catalog_conf::{MAX_PAGE_SIZE, SearchSettings};
use catalog_core::{
	BackendError, BackendResult, Consistency, EntityDescriptor, LocaleTags, Page,
	RELEVANCE_COLUMN, Row, ScoredRecord, SearchError, SearchRequest, SearchResult, Strategy,
};
use catalog_query::{
	CountStatement, EntityPlan, PredicateBuilder, RankingComposer, RankingConfig, SearchQuery,
	SelectStatement,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Orchestrates a catalog search from request to [`Page`]
///
/// Holds the per-entity plans compiled at startup and the storage backend.
/// The executor itself is immutable while serving; share it behind an `Arc`.
///
/// # Examples
///
/// ```
/// use catalog_backends::MemoryBackend;
/// use catalog_core::{Row, SearchRequest, builtin};
/// use catalog_pagination::PagedQueryExecutor;
/// use std::sync::Arc;
///
/// # tokio_test_block(async {
/// let backend = MemoryBackend::new().with_rows("products", vec![
///     Row::new()
///         .with("id", 1)
///         .with("title", "Yoga mat")
///         .with("description", "Non-slip")
///         .with("price", 35)
///         .with("category", "accessories")
///         .with("in_stock", true)
///         .with("is_published", true)
///         .with("deleted_at", catalog_core::QueryValue::Null),
/// ]);
/// let mut executor = PagedQueryExecutor::new(Arc::new(backend));
/// executor.register(builtin::products().unwrap());
///
/// let page = executor
///     .search("products", &SearchRequest::new("en").phrase("yoga"))
///     .await
///     .unwrap();
/// assert_eq!(page.total, 1);
/// assert!(!page.has_more);
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
pub struct PagedQueryExecutor {
	backend: Arc<dyn SearchBackend>,
	tags: LocaleTags,
	composer: RankingComposer,
	plans: HashMap<String, Arc<EntityPlan>>,
	default_limit: u32,
	max_limit: u32,
	consistency: Consistency,
	strategy: Strategy,
	timeout: Option<Duration>,
}

impl PagedQueryExecutor {
	pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
		Self {
			backend,
			tags: LocaleTags::default(),
			composer: RankingComposer::default(),
			plans: HashMap::new(),
			default_limit: 20,
			max_limit: MAX_PAGE_SIZE,
			consistency: Consistency::default(),
			strategy: Strategy::default(),
			timeout: None,
		}
	}

	/// Executor configured from validated settings
	pub fn from_settings(backend: Arc<dyn SearchBackend>, settings: &SearchSettings) -> Self {
		let mut executor = Self::new(backend)
			.with_locale_tags(settings.locale_tags())
			.with_ranking(settings.ranking_config())
			.with_limits(
				settings.pagination.default_limit,
				settings.pagination.max_limit,
			)
			.with_consistency(settings.execution.consistency)
			.with_strategy(settings.execution.strategy);
		executor.timeout = settings.timeout();
		executor
	}

	pub fn with_locale_tags(mut self, tags: LocaleTags) -> Self {
		self.tags = tags;
		self
	}

	/// Replace the ranking configuration, recompiling registered plans
	pub fn with_ranking(mut self, config: RankingConfig) -> Self {
		self.composer = RankingComposer::new(config);
		let entities: Vec<EntityDescriptor> = self
			.plans
			.values()
			.map(|plan| plan.entity().clone())
			.collect();
		for entity in entities {
			self.register(entity);
		}
		self
	}

	/// Page size bounds; `max_limit` is capped at [`MAX_PAGE_SIZE`] and
	/// `default_limit` kept within `[1, max_limit]`
	pub fn with_limits(mut self, default_limit: u32, max_limit: u32) -> Self {
		self.max_limit = max_limit.clamp(1, MAX_PAGE_SIZE);
		self.default_limit = default_limit.clamp(1, self.max_limit);
		self
	}

	pub fn with_consistency(mut self, consistency: Consistency) -> Self {
		self.consistency = consistency;
		self
	}

	pub fn with_strategy(mut self, strategy: Strategy) -> Self {
		self.strategy = strategy;
		self
	}

	/// Bound the storage phase of every search
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub fn with_entities(mut self, entities: impl IntoIterator<Item = EntityDescriptor>) -> Self {
		for entity in entities {
			self.register(entity);
		}
		self
	}

	/// Compile and register an entity, replacing any plan of the same name
	pub fn register(&mut self, entity: EntityDescriptor) -> Arc<EntityPlan> {
		let plan = Arc::new(EntityPlan::compile(entity, &self.composer));
		tracing::debug!(entity = %plan.name(), "Registered search entity");
		self.plans.insert(plan.name().to_string(), Arc::clone(&plan));
		plan
	}

	pub fn plan(&self, entity: &str) -> Option<&Arc<EntityPlan>> {
		self.plans.get(entity)
	}

	pub fn entities(&self) -> impl Iterator<Item = &str> {
		self.plans.keys().map(String::as_str)
	}

	pub fn locale_tags(&self) -> &LocaleTags {
		&self.tags
	}

	pub fn consistency(&self) -> Consistency {
		self.consistency
	}

	pub fn strategy(&self) -> Strategy {
		self.strategy
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Search a registered entity by name
	pub async fn search(&self, entity: &str, request: &SearchRequest) -> SearchResult<Page> {
		let Some(plan) = self.plans.get(entity) else {
			tracing::debug!(entity, "Search for unregistered entity");
			return Err(SearchError::InvalidRequest(format!(
				"unknown entity '{entity}'"
			)));
		};
		self.execute(request, plan).await
	}

	/// Validate, compose and run one search
	///
	/// Every validation error is raised before the backend is called. Storage
	/// failures surface as [`SearchError::StorageUnavailable`] with no partial
	/// page. Dropping the returned future cancels in-flight storage calls.
	#[tracing::instrument(skip_all, fields(entity = %plan.name()))]
	pub async fn execute(&self, request: &SearchRequest, plan: &EntityPlan) -> SearchResult<Page> {
		let prepared = self.prepare(request, plan)?;
		self.run(&prepared).await
	}

	/// Compose a search without running it, with "now" taken from the clock
	pub fn prepare(&self, request: &SearchRequest, plan: &EntityPlan) -> SearchResult<PreparedSearch> {
		self.prepare_at(request, plan, Utc::now())
	}

	/// Compose a search as of `now`
	///
	/// `now` is bound once and shared by both statements.
	pub fn prepare_at(
		&self,
		request: &SearchRequest,
		plan: &EntityPlan,
		now: DateTime<Utc>,
	) -> SearchResult<PreparedSearch> {
		self.compose(request, plan, now).inspect_err(|err| {
			tracing::debug!(entity = %plan.name(), error = %err, "Rejected search request");
		})
	}

	fn compose(
		&self,
		request: &SearchRequest,
		plan: &EntityPlan,
		now: DateTime<Utc>,
	) -> SearchResult<PreparedSearch> {
		let (limit, offset) = page_bounds(
			request.limit,
			request.offset,
			self.default_limit,
			self.max_limit,
		)?;
		let locale = self.tags.parse(&request.locale)?;
		let query = request.phrase.as_deref().and_then(SearchQuery::parse);

		let mut builder = PredicateBuilder::new(plan.entity(), plan.resolver(), locale);
		if !request.include_past {
			builder.not_elapsed_at(now);
		}
		builder.add_filters(&request.filters)?;
		builder.add_phrase(query.as_ref(), plan.text_search());
		let predicate = Arc::new(builder.build());

		let relevance = plan
			.relevance(query.is_some())
			.to_expr(plan.resolver(), locale, query.as_ref());
		let (count, select) = plan.statements(predicate, relevance, locale, limit, offset);

		let tokens = query.as_ref().map_or(0, |query| query.tokens().len());
		tracing::debug!(
			entity = %plan.name(),
			locale = %locale,
			tokens,
			filters = request.filters.len(),
			limit,
			offset,
			"Prepared search"
		);

		Ok(PreparedSearch {
			entity: plan.name().to_string(),
			locale,
			limit,
			offset,
			tokens,
			count,
			select,
		})
	}

	/// Run a prepared search and assemble its page
	pub async fn run(&self, prepared: &PreparedSearch) -> SearchResult<Page> {
		let storage = self.storage(&prepared.count, &prepared.select);
		let outcome = match self.timeout {
			Some(budget) => tokio::time::timeout(budget, storage)
				.await
				.unwrap_or_else(|_| {
					Err(BackendError::Timeout(format!(
						"storage phase exceeded {} ms",
						budget.as_millis()
					)))
				}),
			None => storage.await,
		};

		let page = outcome
			.and_then(|(total, rows)| {
				let items = rows.into_iter().map(scored).collect::<BackendResult<Vec<_>>>()?;
				Ok(Page::new(items, total, prepared.limit, prepared.offset))
			})
			.map_err(|err| {
				tracing::warn!(
					entity = %prepared.entity,
					backend = self.backend.name(),
					error = %err,
					"Search storage failed"
				);
				SearchError::StorageUnavailable(err)
			})?;

		tracing::debug!(
			entity = %prepared.entity,
			total = page.total,
			returned = page.len(),
			has_more = page.has_more,
			"Search completed"
		);
		Ok(page)
	}

	async fn storage(
		&self,
		count: &CountStatement,
		select: &SelectStatement,
	) -> BackendResult<(u64, Vec<Row>)> {
		match (self.consistency, self.strategy) {
			(Consistency::Independent, Strategy::Concurrent) => {
				tokio::try_join!(self.backend.count(count), self.backend.fetch(select))
			}
			(consistency, _) => {
				self.backend
					.count_and_fetch(count, select, consistency)
					.await
			}
		}
	}
}

/// Split the relevance column off a fetched row
fn scored(mut row: Row) -> BackendResult<ScoredRecord> {
	let relevance = row
		.remove(RELEVANCE_COLUMN)
		.and_then(|value| value.as_f64())
		.ok_or_else(|| {
			BackendError::Decode(format!("row has no numeric '{RELEVANCE_COLUMN}' column"))
		})?;
	Ok(ScoredRecord::new(row, relevance))
}
