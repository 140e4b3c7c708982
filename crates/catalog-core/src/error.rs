//! Error taxonomy
//!
//! [`SearchError`] is what callers see. Validation variants are raised before
//! any storage call; [`BackendError`] wraps collaborator failures and surfaces
//! as [`SearchError::StorageUnavailable`]. [`DescriptorError`] only occurs at
//! startup while entity definitions are being validated.

use thiserror::Error;

/// Caller-facing search errors
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SearchError {
	/// Limit or offset outside the accepted bounds
	#[error("Invalid request: {0}")]
	InvalidRequest(String),

	/// Filter value outside the filter's domain, or unknown filter name
	#[error("Invalid value for filter '{filter}': {reason}")]
	InvalidFilterValue { filter: String, reason: String },

	/// Locale tag outside the supported enumeration
	#[error("Unsupported locale: '{0}'")]
	UnsupportedLocale(String),

	/// The storage collaborator failed; no partial results are returned
	#[error("Storage unavailable: {0}")]
	StorageUnavailable(#[from] BackendError),
}

impl SearchError {
	pub fn invalid_filter(filter: impl Into<String>, reason: impl Into<String>) -> Self {
		SearchError::InvalidFilterValue {
			filter: filter.into(),
			reason: reason.into(),
		}
	}

	/// Whether the error was detected during validation (before storage)
	pub fn is_validation(&self) -> bool {
		!matches!(self, SearchError::StorageUnavailable(_))
	}
}

pub type SearchResult<T> = Result<T, SearchError>;

/// Storage collaborator failures
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
	#[error("Connection error: {0}")]
	Connection(String),

	#[error("Timed out: {0}")]
	Timeout(String),

	#[error("Execution error: {0}")]
	Execution(String),

	#[error("Decode error: {0}")]
	Decode(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Invalid entity definitions, reported at startup
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum DescriptorError {
	#[error("Invalid identifier: '{0}'")]
	InvalidIdentifier(String),

	#[error("Duplicate field: {0}")]
	DuplicateField(String),

	#[error("Duplicate filter: {0}")]
	DuplicateFilter(String),

	#[error("Reserved field name: {0}")]
	ReservedName(String),

	#[error("Secondary sort key '{0}' is not a declared field")]
	UnknownSortField(String),

	#[error("Field '{field}' has invalid weight {weight}")]
	InvalidWeight { field: String, weight: f64 },

	#[error("Filter '{0}' declares no allowed values")]
	EmptyAllowedValues(String),

	#[error("Filter '{filter}' is incompatible with field kind of '{column}'")]
	IncompatibleFilter { filter: String, column: String },
}
