//! Relevance composition
//!
//! A [`RelevanceExpression`] is built once per entity and per "phrase present"
//! flag, then instantiated for each request with the request's locale and
//! sanitized query.

use crate::expr::Expr;
use crate::resolver::FieldResolver;
use crate::sanitize::SearchQuery;
use catalog_core::{FieldKind, FieldRole, FieldSpec, Locale, TextSearchConfig};

/// Ranking knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
	/// Weight of title-class fields without an explicit weight
	pub title_weight: f64,
	/// Weight of description-class fields without an explicit weight
	pub description_weight: f64,
	/// Relevance of every record when no phrase is given
	pub default_relevance: f64,
	pub text_search: TextSearchConfig,
}

impl Default for RankingConfig {
	fn default() -> Self {
		Self {
			title_weight: 2.0,
			description_weight: 1.0,
			default_relevance: 1.0,
			text_search: TextSearchConfig::default(),
		}
	}
}

/// A relevance template, independent of locale and phrase
#[derive(Debug, Clone, PartialEq)]
pub enum RelevanceExpression {
	/// Uniform relevance for every record
	Constant(f64),
	/// Weighted sum of per-field match scores
	Weighted {
		terms: Vec<(f64, FieldSpec)>,
		config: TextSearchConfig,
		/// Used when instantiated without a query
		fallback: f64,
	},
}

impl RelevanceExpression {
	pub fn is_constant(&self) -> bool {
		matches!(self, RelevanceExpression::Constant(_))
	}

	/// Instantiate the template for one request
	///
	/// Each term scores `COALESCE(<field>, '')` against the bound query, so a
	/// NULL field contributes zero instead of nulling the whole sum.
	pub fn to_expr(
		&self,
		resolver: &FieldResolver,
		locale: Locale,
		query: Option<&SearchQuery>,
	) -> Expr {
		match (self, query) {
			(RelevanceExpression::Constant(value), _) => Expr::Constant(*value),
			(RelevanceExpression::Weighted { fallback, .. }, None) => Expr::Constant(*fallback),
			(RelevanceExpression::Weighted { terms, config, .. }, Some(query)) => Expr::WeightedSum(
				terms
					.iter()
					.map(|(weight, field)| {
						let document = Expr::Coalesce(vec![
							resolver.resolve(field, locale),
							Expr::EmptyText,
						]);
						let score = Expr::MatchScore {
							document: Box::new(document),
							query: Box::new(Expr::value(query.text())),
							config: *config,
						};
						(*weight, score)
					})
					.collect(),
			),
		}
	}
}

/// Combines weighted field scores into one relevance expression
///
/// # Examples
///
/// ```
/// use catalog_core::builtin;
/// use catalog_query::{RankingComposer, RankingConfig, RelevanceExpression};
///
/// let courses = builtin::courses().unwrap();
/// let composer = RankingComposer::new(RankingConfig::default());
///
/// assert_eq!(
///     composer.compose(courses.fields(), false),
///     RelevanceExpression::Constant(1.0),
/// );
///
/// let RelevanceExpression::Weighted { terms, .. } = composer.compose(courses.fields(), true) else {
///     panic!("expected weighted relevance");
/// };
/// let weights: Vec<f64> = terms.iter().map(|(weight, _)| *weight).collect();
/// assert_eq!(weights, vec![2.0, 1.0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RankingComposer {
	config: RankingConfig,
}

impl RankingComposer {
	pub fn new(config: RankingConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &RankingConfig {
		&self.config
	}

	/// Weight of a field, `None` when it does not take part in ranking
	pub fn weight_for(&self, field: &FieldSpec) -> Option<f64> {
		if field.kind() != FieldKind::Text {
			return None;
		}
		field.explicit_weight().or(match field.role() {
			FieldRole::Title => Some(self.config.title_weight),
			FieldRole::Description => Some(self.config.description_weight),
			FieldRole::Other => None,
		})
	}

	pub fn compose(&self, fields: &[FieldSpec], has_phrase: bool) -> RelevanceExpression {
		let constant = RelevanceExpression::Constant(self.config.default_relevance);
		if !has_phrase {
			return constant;
		}

		let terms: Vec<(f64, FieldSpec)> = fields
			.iter()
			.filter_map(|field| self.weight_for(field).map(|weight| (weight, field.clone())))
			.collect();
		if terms.is_empty() {
			return constant;
		}

		RelevanceExpression::Weighted {
			terms,
			config: self.config.text_search,
			fallback: self.config.default_relevance,
		}
	}
}
