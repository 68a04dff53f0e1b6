// geo/enrich.rs
use serde::Deserialize;
use thiserror::Error;

use crate::config::City;
use crate::domain::{EnrichedRecord, ListingRecord, PoiCounts};
use crate::geo::{coord, distance, Coordinate};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Geocode failed: {0}")]
    Geocode(String),

    #[error("Place lookup failed: {0}")]
    PlaceLookup(String),
}

/// Address text -> raw (map-datum) coordinate.
pub trait Geocoder {
    fn geocode(&self, address: &str, city_name: &str) -> Result<Coordinate, EnrichError>;
}

/// Number of places of one kind within `radius_m` of a coordinate.
pub trait PlaceCounter {
    fn place_count(
        &self,
        at: Coordinate,
        category: PoiCategory,
        radius_m: u32,
    ) -> Result<u32, EnrichError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoiCategory {
    School,
    Subway,
    Park,
    ShoppingMall,
    Bus,
}

impl PoiCategory {
    pub const ALL: [PoiCategory; 5] = [
        PoiCategory::School,
        PoiCategory::Subway,
        PoiCategory::Park,
        PoiCategory::ShoppingMall,
        PoiCategory::Bus,
    ];

    /// Column name in the persisted table.
    pub fn column(self) -> &'static str {
        match self {
            PoiCategory::School => "schoolAround",
            PoiCategory::Subway => "subwayAround",
            PoiCategory::Park => "parkAround",
            PoiCategory::ShoppingMall => "shopping_mallAround",
            PoiCategory::Bus => "busAround",
        }
    }
}

/// Search words sent to the place service for each category.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoiQueries {
    pub school: String,
    pub subway: String,
    pub park: String,
    pub shopping_mall: String,
    pub bus: String,
}

impl Default for PoiQueries {
    fn default() -> Self {
        Self {
            school: "学校".to_string(),
            subway: "地铁".to_string(),
            park: "公园".to_string(),
            shopping_mall: "购物".to_string(),
            bus: "公交".to_string(),
        }
    }
}

impl PoiQueries {
    pub fn query(&self, category: PoiCategory) -> &str {
        match category {
            PoiCategory::School => &self.school,
            PoiCategory::Subway => &self.subway,
            PoiCategory::Park => &self.park,
            PoiCategory::ShoppingMall => &self.shopping_mall,
            PoiCategory::Bus => &self.bus,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// POI search radius in metres.
    pub radius_m: u32,
    pub geocode_url: String,
    pub place_url: String,
    pub queries: PoiQueries,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            radius_m: 1000,
            geocode_url: "https://api.map.baidu.com/geocoding/v3".to_string(),
            place_url: "https://api.map.baidu.com/place/v2/search".to_string(),
            queries: PoiQueries::default(),
        }
    }
}

/// Failure tallies for one batch of enrichments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub enriched: usize,
    pub geocode_failures: usize,
    pub place_failures: usize,
}

pub struct Enricher<'a> {
    geocoder: &'a dyn Geocoder,
    places: &'a dyn PlaceCounter,
    radius_m: u32,
}

impl<'a> Enricher<'a> {
    pub fn new(geocoder: &'a dyn Geocoder, places: &'a dyn PlaceCounter, radius_m: u32) -> Self {
        Self {
            geocoder,
            places,
            radius_m,
        }
    }

    /// Geocode, correct the datum, measure distance to the centre, then
    /// count nearby places. A failed geocode keeps the record with all
    /// geographic fields absent.
    pub fn enrich(
        &self,
        record: ListingRecord,
        city: &City,
        stats: &mut EnrichmentStats,
    ) -> EnrichedRecord {
        let Some(address) = record.address.clone() else {
            stats.geocode_failures += 1;
            return EnrichedRecord::bare(record);
        };

        let raw = match self.geocoder.geocode(&address, &city.name) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(city = %city.code, %address, "geocode failed: {e}");
                stats.geocode_failures += 1;
                return EnrichedRecord::bare(record);
            }
        };

        let location = coord::correct(raw);
        let distance_km = distance::haversine_km(location, city.center);

        let mut poi = PoiCounts::default();
        for category in PoiCategory::ALL {
            match self.places.place_count(location, category, self.radius_m) {
                Ok(n) => poi.set(category, Some(n)),
                Err(e) => {
                    tracing::debug!(?category, %address, "place lookup failed: {e}");
                    stats.place_failures += 1;
                }
            }
        }

        stats.enriched += 1;
        EnrichedRecord {
            listing: record,
            location: Some(location),
            distance_km: Some(distance_km),
            poi,
        }
    }

    pub fn enrich_all(
        &self,
        records: Vec<ListingRecord>,
        city: &City,
    ) -> (Vec<EnrichedRecord>, EnrichmentStats) {
        let mut stats = EnrichmentStats::default();
        let total = records.len();
        let out: Vec<EnrichedRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                tracing::debug!(city = %city.code, "enriching {}/{}", i + 1, total);
                self.enrich(r, city, &mut stats)
            })
            .collect();
        (out, stats)
    }
}
