// parser/locators.rs
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::errors::ConfigError;

/// Where each field lives in a listing page, as CSS selectors.
///
/// Document-level selectors produce a flat stream: every match contributes
/// its trimmed, non-empty text nodes in document order. `tags` and
/// `floor_info` are evaluated inside each listing container and produce one
/// whitespace-free fragment per matched element.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocatorTable {
    pub container: String,
    pub total_price: String,
    pub unit_price: String,
    pub area: String,
    pub address: String,
    pub community: String,
    pub rooms: String,
    pub bedroom: String,
    pub living_room: String,
    pub bathroom: String,
    pub orientation: String,
    pub build_year: String,
    pub tags: String,
    pub floor_info: String,
}

impl Default for LocatorTable {
    fn default() -> Self {
        const INFO: &str = "div.property p.property-content-info-text";
        Self {
            container: "div.property".into(),
            total_price: "div.property span.property-price-total-num".into(),
            unit_price: "div.property p.property-price-average".into(),
            area: format!("{INFO}:nth-of-type(2)"),
            address: "div.property p.property-content-info-comm-address".into(),
            community: "div.property p.property-content-info-comm-name".into(),
            rooms: "div.property p.property-content-info-attribute span".into(),
            bedroom: "div.property p.property-content-info-attribute span:nth-of-type(1)".into(),
            living_room: "div.property p.property-content-info-attribute span:nth-of-type(3)".into(),
            bathroom: "div.property p.property-content-info-attribute span:nth-of-type(5)".into(),
            orientation: format!("{INFO}:nth-of-type(3)"),
            build_year: format!("{INFO}:last-of-type"),
            tags: "span.property-content-info-tag".into(),
            floor_info: "p.property-content-info-text:not(.property-content-info-attribute)".into(),
        }
    }
}

/// Parsed selectors, ready to run against a page.
#[derive(Debug, Clone)]
pub struct CompiledLocators {
    pub container: Selector,
    pub total_price: Selector,
    pub unit_price: Selector,
    pub area: Selector,
    pub address: Selector,
    pub community: Selector,
    pub rooms: Selector,
    pub bedroom: Selector,
    pub living_room: Selector,
    pub bathroom: Selector,
    pub orientation: Selector,
    pub build_year: Selector,
    pub tags: Selector,
    pub floor_info: Selector,
}

fn compile(field: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        field: field.to_string(),
        message: e.to_string(),
    })
}

impl LocatorTable {
    pub fn compile(&self) -> Result<CompiledLocators, ConfigError> {
        Ok(CompiledLocators {
            container: compile("container", &self.container)?,
            total_price: compile("total_price", &self.total_price)?,
            unit_price: compile("unit_price", &self.unit_price)?,
            area: compile("area", &self.area)?,
            address: compile("address", &self.address)?,
            community: compile("community", &self.community)?,
            rooms: compile("rooms", &self.rooms)?,
            bedroom: compile("bedroom", &self.bedroom)?,
            living_room: compile("living_room", &self.living_room)?,
            bathroom: compile("bathroom", &self.bathroom)?,
            orientation: compile("orientation", &self.orientation)?,
            build_year: compile("build_year", &self.build_year)?,
            tags: compile("tags", &self.tags)?,
            floor_info: compile("floor_info", &self.floor_info)?,
        })
    }
}

/// Cheap check that fetched content is a real listing page.
#[derive(Debug, Clone)]
pub struct ListingProbe {
    container: Selector,
}

impl ListingProbe {
    pub fn new(locators: &LocatorTable) -> Result<Self, ConfigError> {
        Ok(Self {
            container: compile("container", &locators.container)?,
        })
    }

    pub fn count(&self, html: &str) -> usize {
        Html::parse_document(html).select(&self.container).count()
    }

    pub fn has_listings(&self, html: &str) -> bool {
        self.count(html) > 0
    }
}
