//! Settings errors

use crate::sources::SourceError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	/// A source could not be read or parsed
	#[error("Settings source error: {0}")]
	Source(#[from] SourceError),

	/// Merged values do not fit the settings schema
	#[error("Settings deserialization error: {0}")]
	Deserialize(#[from] serde_json::Error),

	/// Values fit the schema but break a constraint
	#[error("Invalid settings: {0}")]
	Invalid(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
