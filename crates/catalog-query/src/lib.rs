//! # Catalog Query
//!
//! Composes the statements of a catalog search.
//!
//! ## Components
//!
//! - [`FieldResolver`]: locale fallback for localizable fields
//! - [`PredicateBuilder`]: filter, phrase and visibility conditions as
//!   self-contained [`PredicateFragment`]s
//! - [`RankingComposer`]: weighted relevance templates
//! - [`EntityPlan`]: per-entity startup state and statement assembly
//!
//! Generated text only ever contains validated identifiers, operators and
//! configuration constants. Everything a caller supplies, the search phrase
//! included, is bound to a `$n` placeholder by [`SqlWriter`].

pub mod expr;
pub mod plan;
pub mod predicate;
pub mod ranking;
pub mod resolver;
pub mod sanitize;
pub mod statement;

pub use expr::{CompareOp, Expr, SqlWriter, count_placeholders};
pub use plan::EntityPlan;
pub use predicate::{Predicate, PredicateBuilder, PredicateFragment};
pub use ranking::{RankingComposer, RankingConfig, RelevanceExpression};
pub use resolver::FieldResolver;
pub use sanitize::{MAX_TOKEN_LEN, MAX_TOKENS, SearchQuery};
pub use statement::{
	CountStatement, Direction, OrderKey, OrderTarget, Projection, SelectStatement,
};
