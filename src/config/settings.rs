// config/settings.rs
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::registry::{City, CityRegistry};
use crate::errors::ConfigError;
use crate::geo::EnrichConfig;
use crate::parser::{DecodeConfig, LocatorTable};
use crate::crawler::CrawlConfig;

/// Environment variable holding the map-service access key.
pub const MAP_KEY_ENV: &str = "BAIDU_MAP_AK";

/// Everything a batch run needs, read from one TOML file.
/// Each section falls back to its defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawl: CrawlConfig,
    pub decode: DecodeConfig,
    pub locators: LocatorTable,
    pub enrich: EnrichConfig,
    pub cities: Vec<City>,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.crawl.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn registry(&self) -> Result<CityRegistry, ConfigError> {
        CityRegistry::new(self.cities.clone())
    }

    /// Reads the map-service key from the environment.
    pub fn map_key_from_env() -> Result<String, ConfigError> {
        std::env::var(MAP_KEY_ENV)
            .map_err(|_| ConfigError::Io(format!("{MAP_KEY_ENV} environment variable not set")))
    }
}
