//! Configuration sources for layered settings
//!
//! Sources are merged in priority order (environment variables > config
//! files > defaults). Every source produces a tree of sections keyed by
//! lowercase names, so a value set by a higher source only replaces the
//! leaves it names.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Prefix of environment variables read by [`EnvSource::catalog`]
pub const ENV_PREFIX: &str = "CATALOG_";

/// Separator between section and key in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variable configuration source
///
/// `CATALOG_PAGINATION__MAX_LIMIT=50` sets `pagination.max_limit`.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// # Examples
	///
	/// ```
	/// use catalog_conf::sources::EnvSource;
	///
	/// let source = EnvSource::new("SEARCH_");
	/// ```
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	/// Source reading `CATALOG_*` variables
	pub fn catalog() -> Self {
		Self::new(ENV_PREFIX)
	}

	fn parse_value(value: String) -> Value {
		if let Ok(num) = value.parse::<i64>() {
			Value::Number(num.into())
		} else if let Some(num) = value
			.parse::<f64>()
			.ok()
			.and_then(serde_json::Number::from_f64)
		{
			Value::Number(num)
		} else if let Ok(b) = value.trim().to_lowercase().parse::<bool>() {
			Value::Bool(b)
		} else {
			Value::String(value)
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::catalog()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();

		for (key, value) in std::env::vars() {
			let Some(key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let path: Vec<String> = key
				.to_lowercase()
				.split(ENV_SEPARATOR)
				.map(str::to_string)
				.collect();
			if path.iter().any(String::is_empty) {
				tracing::warn!(variable = %key, "Ignoring malformed settings variable");
				continue;
			}
			insert_path(&mut config, &path, Self::parse_value(value));
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// TOML file configuration source
///
/// A missing file contributes nothing.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// # Examples
	///
	/// ```
	/// use catalog_conf::sources::TomlFileSource;
	///
	/// let source = TomlFileSource::new("catalog.toml");
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		parse_toml(&content)
	}

	fn priority(&self) -> u8 {
		50 // Medium priority
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Inline TOML text, mostly for tests and embedded defaults
pub struct TomlStrSource {
	content: String,
}

impl TomlStrSource {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
		}
	}
}

impl ConfigSource for TomlStrSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		parse_toml(&self.content)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		"Inline TOML".to_string()
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	/// Set a default by dotted path
	///
	/// # Examples
	///
	/// ```
	/// use catalog_conf::sources::{ConfigSource, DefaultSource};
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new()
	///     .with_value("pagination.default_limit", Value::Number(10.into()));
	/// let config = source.load().unwrap();
	/// assert_eq!(config["pagination"]["default_limit"], 10);
	/// ```
	pub fn with_value(mut self, key: &str, value: Value) -> Self {
		let path: Vec<String> = key.split('.').map(str::to_string).collect();
		insert_path(&mut self.values, &path, value);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0 // Lowest priority
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

fn parse_toml(content: &str) -> Result<IndexMap<String, Value>, SourceError> {
	let toml_value: toml::Value = toml::from_str(content)?;
	let json_value = serde_json::to_value(toml_value)?;
	let map = json_value
		.as_object()
		.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

	Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn insert_path(config: &mut IndexMap<String, Value>, path: &[String], value: Value) {
	let Some((first, rest)) = path.split_first() else {
		return;
	};
	if rest.is_empty() {
		config.insert(first.clone(), value);
		return;
	}
	let entry = config
		.entry(first.clone())
		.or_insert_with(|| Value::Object(serde_json::Map::new()));
	if !entry.is_object() {
		*entry = Value::Object(serde_json::Map::new());
	}
	let mut node = entry;
	for key in &rest[..rest.len() - 1] {
		let Value::Object(map) = node else {
			return;
		};
		node = map
			.entry(key.clone())
			.or_insert_with(|| Value::Object(serde_json::Map::new()));
		if !node.is_object() {
			*node = Value::Object(serde_json::Map::new());
		}
	}
	if let (Value::Object(map), Some(last)) = (node, rest.last()) {
		map.insert(last.clone(), value);
	}
}

/// Overlay `overlay` onto `base`, merging sections and replacing leaves
pub fn merge(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base), Value::Object(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) => merge(existing, value),
					None => {
						base.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::env;
	use std::io::Write;
	use tempfile::TempDir;

	#[rstest]
	#[serial]
	fn test_env_source() {
		// SAFETY: Setting environment variables is unsafe in multi-threaded programs.
		// This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::set_var("CATALOGTEST_PAGINATION__MAX_LIMIT", "50");
			env::set_var("CATALOGTEST_RANKING__TITLE_WEIGHT", "2.5");
			env::set_var("CATALOGTEST_LOCALE__SECONDARY", "de");
			env::set_var("CATALOGTEST_BROKEN____KEY", "x");
		}

		let config = EnvSource::new("CATALOGTEST_").load().unwrap();

		assert_eq!(config["pagination"]["max_limit"], 50);
		assert_eq!(config["ranking"]["title_weight"], 2.5);
		assert_eq!(config["locale"]["secondary"], "de");
		assert!(!config.contains_key("broken"));

		// SAFETY: Removing environment variables is unsafe in multi-threaded programs.
		// This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::remove_var("CATALOGTEST_PAGINATION__MAX_LIMIT");
			env::remove_var("CATALOGTEST_RANKING__TITLE_WEIGHT");
			env::remove_var("CATALOGTEST_LOCALE__SECONDARY");
			env::remove_var("CATALOGTEST_BROKEN____KEY");
		}
	}

	#[rstest]
	fn test_toml_source() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("catalog.toml");

		let mut file = fs::File::create(&config_path).unwrap();
		writeln!(
			file,
			r#"
[pagination]
default_limit = 10

[ranking]
text_search_config = "english"
"#
		)
		.unwrap();

		let config = TomlFileSource::new(&config_path).load().unwrap();
		assert_eq!(config["pagination"]["default_limit"], 10);
		assert_eq!(config["ranking"]["text_search_config"], "english");
	}

	#[rstest]
	fn test_missing_toml_file_is_empty() {
		let config = TomlFileSource::new("/nonexistent/catalog.toml").load().unwrap();
		assert!(config.is_empty());
	}

	#[rstest]
	fn test_merge_replaces_leaves_only() {
		let mut base = serde_json::json!({"pagination": {"default_limit": 20, "max_limit": 100}});
		merge(
			&mut base,
			serde_json::json!({"pagination": {"max_limit": 40}, "database": {"url": "postgres://db"}}),
		);
		assert_eq!(
			base,
			serde_json::json!({
				"pagination": {"default_limit": 20, "max_limit": 40},
				"database": {"url": "postgres://db"}
			})
		);
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(EnvSource::catalog().priority(), 100);
		assert_eq!(TomlFileSource::new("catalog.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
	}
}
