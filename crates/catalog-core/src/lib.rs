//! # Catalog Core
//!
//! Shared data model for catalog search.
//!
//! - [`Identifier`] and [`QueryValue`]: what may appear in generated query
//!   text, and what may only be bound to a placeholder
//! - [`Locale`] and [`LocaleTags`]: the closed set of supported locales
//! - [`EntityDescriptor`], [`FieldSpec`], [`FilterSpec`]: startup-time entity
//!   definitions, see [`builtin`] for the standard catalog
//! - [`SearchRequest`] and [`Page`]: the caller-facing request and response
//! - [`SearchError`]: the error taxonomy

pub mod builtin;
pub mod entity;
pub mod error;
pub mod locale;
pub mod page;
pub mod request;
pub mod types;

pub use entity::{
	EntityDescriptor, EntityDescriptorBuilder, FieldKind, FieldRole, FieldSpec, FilterKind,
	FilterSpec, RELEVANCE_COLUMN, RangeBound,
};
pub use error::{
	BackendError, BackendResult, DescriptorError, SearchError, SearchResult,
};
pub use locale::{Locale, LocaleTags};
pub use page::{Page, ScoredRecord};
pub use request::{FilterValue, SearchRequest};
pub use types::{Consistency, Identifier, QueryValue, Row, Strategy, TextSearchConfig};
