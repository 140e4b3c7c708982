//! # Catalog Conf
//!
//! Layered settings for catalog search.
//!
//! Values are merged from, lowest priority first:
//!
//! 1. built-in defaults
//! 2. [`DefaultSource`](sources::DefaultSource) overrides
//! 3. TOML files ([`TomlFileSource`](sources::TomlFileSource))
//! 4. `CATALOG_*` environment variables ([`EnvSource`](sources::EnvSource)),
//!    with `__` separating section and key
//!
//! ```toml
//! [pagination]
//! default_limit = 20
//! max_limit = 100
//!
//! [ranking]
//! title_weight = 2.0
//! description_weight = 1.0
//! text_search_config = "simple"
//!
//! [locale]
//! base = "en"
//! secondary = "fr"
//!
//! [execution]
//! consistency = "independent"
//! strategy = "sequential"
//! ```

pub mod error;
pub mod settings;
pub mod sources;

pub use error::{SettingsError, SettingsResult};
pub use settings::{
	DatabaseSettings, ExecutionSettings, LocaleSettings, MAX_PAGE_SIZE, PaginationSettings,
	RankingSettings, SearchSettings, SettingsBuilder,
};
