//! Per-entity query plans
//!
//! An [`EntityPlan`] is compiled once at startup. It owns everything about an
//! entity that does not depend on a request: the resolved field variants and
//! both relevance templates.

use crate::expr::Expr;
use crate::predicate::Predicate;
use crate::ranking::{RankingComposer, RelevanceExpression};
use crate::resolver::FieldResolver;
use crate::statement::{CountStatement, OrderKey, Projection, SelectStatement};
use catalog_core::{EntityDescriptor, Locale, TextSearchConfig};
use std::sync::Arc;

/// Immutable search plan of one entity
///
/// # Examples
///
/// ```
/// use catalog_core::{builtin, Locale};
/// use catalog_query::{EntityPlan, PredicateBuilder, RankingComposer};
/// use std::sync::Arc;
///
/// let plan = EntityPlan::compile(builtin::courses().unwrap(), &RankingComposer::default());
/// let predicate = Arc::new(
///     PredicateBuilder::new(plan.entity(), plan.resolver(), Locale::Base).build(),
/// );
/// let relevance = plan.relevance(false).to_expr(plan.resolver(), Locale::Base, None);
/// let (count, select) = plan.statements(predicate, relevance, Locale::Base, 20, 0);
///
/// assert!(count.to_sql().0.starts_with("SELECT COUNT(*)"));
/// assert!(select.to_sql().0.contains(r#"ORDER BY "relevance" DESC, "title" ASC, "id" ASC"#));
/// ```
#[derive(Debug, Clone)]
pub struct EntityPlan {
	entity: EntityDescriptor,
	resolver: FieldResolver,
	unranked: RelevanceExpression,
	ranked: RelevanceExpression,
	text_search: TextSearchConfig,
}

impl EntityPlan {
	pub fn compile(entity: EntityDescriptor, composer: &RankingComposer) -> Self {
		let resolver = FieldResolver::for_entity(&entity);
		let unranked = composer.compose(entity.fields(), false);
		let ranked = composer.compose(entity.fields(), true);
		tracing::debug!(
			entity = %entity.name(),
			fields = entity.fields().len(),
			ranked_fields = entity.searchable_fields().count(),
			"Compiled entity plan"
		);
		Self {
			entity,
			resolver,
			unranked,
			ranked,
			text_search: composer.config().text_search,
		}
	}

	pub fn entity(&self) -> &EntityDescriptor {
		&self.entity
	}

	pub fn name(&self) -> &str {
		self.entity.name()
	}

	pub fn resolver(&self) -> &FieldResolver {
		&self.resolver
	}

	pub fn text_search(&self) -> TextSearchConfig {
		self.text_search
	}

	/// Relevance template for requests with or without a phrase
	pub fn relevance(&self, has_phrase: bool) -> &RelevanceExpression {
		if has_phrase { &self.ranked } else { &self.unranked }
	}

	/// Projected columns: primary key, then every declared field resolved
	/// for `locale`
	pub fn projections(&self, locale: Locale) -> Vec<Projection> {
		let primary_key = self.entity.primary_key();
		std::iter::once(Projection {
			alias: primary_key.clone(),
			expr: Expr::col(primary_key),
		})
		.chain(self.entity.fields().iter().map(|field| Projection {
			alias: field.name().clone(),
			expr: self.resolver.resolve(field, locale),
		}))
		.collect()
	}

	/// Relevance first, then the secondary key, then the primary key so
	/// that ordering is total
	pub fn order(&self, locale: Locale) -> Vec<OrderKey> {
		vec![
			OrderKey::relevance_desc(),
			OrderKey::asc(
				self.resolver
					.resolve(self.entity.secondary_sort_field(), locale),
			),
			OrderKey::asc(Expr::col(self.entity.primary_key())),
		]
	}

	/// Count and data statements sharing one predicate
	pub fn statements(
		&self,
		predicate: Arc<Predicate>,
		relevance: Expr,
		locale: Locale,
		limit: u32,
		offset: u64,
	) -> (CountStatement, SelectStatement) {
		let table = self.entity.table().clone();
		let count = CountStatement::new(table.clone(), Arc::clone(&predicate));
		let select = SelectStatement::new(
			table,
			self.projections(locale),
			relevance,
			predicate,
			self.order(locale),
			limit,
			offset,
		);
		(count, select)
	}
}
