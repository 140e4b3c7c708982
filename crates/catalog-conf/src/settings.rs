//! Search settings

use crate::error::{SettingsError, SettingsResult};
use crate::sources::{ConfigSource, EnvSource, TomlFileSource, TomlStrSource, merge};
use catalog_core::{Consistency, Locale, LocaleTags, Strategy, TextSearchConfig};
use catalog_query::RankingConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Hard ceiling on page size
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
	/// Page size used when a request gives none
	pub default_limit: u32,
	/// Largest accepted page size, at most [`MAX_PAGE_SIZE`]
	pub max_limit: u32,
}

impl Default for PaginationSettings {
	fn default() -> Self {
		Self {
			default_limit: 20,
			max_limit: MAX_PAGE_SIZE,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
	pub default_relevance: f64,
	pub title_weight: f64,
	pub description_weight: f64,
	pub text_search_config: TextSearchConfig,
}

impl Default for RankingSettings {
	fn default() -> Self {
		let defaults = RankingConfig::default();
		Self {
			default_relevance: defaults.default_relevance,
			title_weight: defaults.title_weight,
			description_weight: defaults.description_weight,
			text_search_config: defaults.text_search,
		}
	}
}

/// Language tags of the two supported locales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleSettings {
	pub base: String,
	pub secondary: String,
}

impl Default for LocaleSettings {
	fn default() -> Self {
		let tags = LocaleTags::default();
		Self {
			base: tags.base().to_string(),
			secondary: tags.secondary().to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
	/// Isolation between the count and data statements
	pub consistency: Consistency,
	pub strategy: Strategy,
	/// Budget for the whole storage phase of a search
	pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	pub url: Option<String>,
}

/// All settings of the search engine
///
/// # Examples
///
/// ```
/// use catalog_conf::SearchSettings;
///
/// let settings = SearchSettings::from_toml_str(r#"
///     [pagination]
///     default_limit = 10
///
///     [execution]
///     consistency = "snapshot"
/// "#).unwrap();
///
/// assert_eq!(settings.pagination.default_limit, 10);
/// assert_eq!(settings.pagination.max_limit, 100);
/// assert_eq!(settings.ranking.title_weight, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
	pub pagination: PaginationSettings,
	pub ranking: RankingSettings,
	pub locale: LocaleSettings,
	pub execution: ExecutionSettings,
	pub database: DatabaseSettings,
}

impl SearchSettings {
	pub fn builder() -> SettingsBuilder {
		SettingsBuilder::new()
	}

	/// Defaults, then `path` when it exists, then `CATALOG_*` variables
	pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
		Self::builder()
			.add_source(TomlFileSource::new(path.as_ref()))
			.add_source(EnvSource::catalog())
			.build()
	}

	/// Defaults overlaid with TOML text only
	pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
		Self::builder()
			.add_source(TomlStrSource::new(content))
			.build()
	}

	pub fn validate(&self) -> SettingsResult<()> {
		let pagination = &self.pagination;
		if !(1..=MAX_PAGE_SIZE).contains(&pagination.max_limit) {
			return Err(SettingsError::Invalid(format!(
				"pagination.max_limit must be within [1, {MAX_PAGE_SIZE}], got {}",
				pagination.max_limit
			)));
		}
		if !(1..=pagination.max_limit).contains(&pagination.default_limit) {
			return Err(SettingsError::Invalid(format!(
				"pagination.default_limit must be within [1, {}], got {}",
				pagination.max_limit, pagination.default_limit
			)));
		}

		for (name, weight) in [
			("ranking.title_weight", self.ranking.title_weight),
			("ranking.description_weight", self.ranking.description_weight),
		] {
			if !(weight.is_finite() && weight > 0.0) {
				return Err(SettingsError::Invalid(format!(
					"{name} must be a positive number, got {weight}"
				)));
			}
		}
		if !self.ranking.default_relevance.is_finite() {
			return Err(SettingsError::Invalid(
				"ranking.default_relevance must be finite".to_string(),
			));
		}

		let base = self.locale.base.trim();
		let secondary = self.locale.secondary.trim();
		if base.is_empty() || secondary.is_empty() {
			return Err(SettingsError::Invalid("locale tags must not be empty".to_string()));
		}
		if base.eq_ignore_ascii_case(secondary) {
			return Err(SettingsError::Invalid(format!(
				"locale.base and locale.secondary must differ, both are '{base}'"
			)));
		}
		for (key, tag, other) in [
			("locale.base", base, Locale::Secondary),
			("locale.secondary", secondary, Locale::Base),
		] {
			if tag.eq_ignore_ascii_case(other.as_str()) {
				return Err(SettingsError::Invalid(format!(
					"{key} must not be '{tag}', the name of the {other} locale"
				)));
			}
		}

		if self.execution.timeout_ms == Some(0) {
			return Err(SettingsError::Invalid(
				"execution.timeout_ms must be positive".to_string(),
			));
		}
		Ok(())
	}

	pub fn ranking_config(&self) -> RankingConfig {
		RankingConfig {
			title_weight: self.ranking.title_weight,
			description_weight: self.ranking.description_weight,
			default_relevance: self.ranking.default_relevance,
			text_search: self.ranking.text_search_config,
		}
	}

	pub fn locale_tags(&self) -> LocaleTags {
		LocaleTags::new(&self.locale.base, &self.locale.secondary)
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.execution.timeout_ms.map(Duration::from_millis)
	}
}

/// Merges sources by priority into [`SearchSettings`]
///
/// Built-in defaults always sit underneath every added source.
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self {
			sources: Vec::new(),
		}
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge, deserialize and validate
	pub fn build(mut self) -> SettingsResult<SearchSettings> {
		// Stable sort: equal priorities keep insertion order
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = serde_json::to_value(SearchSettings::default())?;
		for source in &self.sources {
			let values = source.load()?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"Loaded settings source"
			);
			merge(&mut merged, Value::Object(values.into_iter().collect()));
		}

		let settings: SearchSettings = serde_json::from_value(merged)?;
		settings.validate()?;
		Ok(settings)
	}
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}
