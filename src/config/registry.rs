// config/registry.rs
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

use crate::errors::ConfigError;
use crate::geo::Coordinate;

/// One crawlable city: where its listings live and where its centre is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct City {
    /// Short code, e.g. "CD".
    pub code: String,
    /// Display name handed to the geocoder, e.g. "成都市".
    pub name: String,
    /// First listing page. Later pages are joined onto it.
    pub url: String,
    pub center: Coordinate,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    cities: Vec<City>,
}

/// Code-keyed city table, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct CityRegistry {
    cities: Vec<City>,
}

impl CityRegistry {
    /// Validates every URL template; duplicate codes keep the first entry.
    pub fn new(cities: Vec<City>) -> Result<Self, ConfigError> {
        let mut kept: Vec<City> = Vec::with_capacity(cities.len());
        for city in cities {
            Url::parse(&city.url).map_err(|e| ConfigError::InvalidUrl {
                url: city.url.clone(),
                message: e.to_string(),
            })?;
            if kept.iter().any(|c| c.code == city.code) {
                tracing::warn!(code = %city.code, "duplicate city code ignored");
                continue;
            }
            kept.push(city);
        }
        Ok(Self { cities: kept })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::new(file.cities)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn get(&self, code: &str) -> Result<&City, ConfigError> {
        self.cities
            .iter()
            .find(|c| c.code == code)
            .ok_or_else(|| ConfigError::UnknownCity(code.to_string()))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(|c| c.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
