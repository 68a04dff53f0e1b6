// src/domain/listing.rs

use std::collections::HashSet;

use crate::geo::{Coordinate, PoiCategory};

/// Height band of the unit inside its building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloorType {
    Low,
    Mid,
    High,
}

impl FloorType {
    /// Label written to the persisted table; matches the listing markup.
    pub fn label(self) -> &'static str {
        match self {
            FloorType::Low => "低层",
            FloorType::Mid => "中层",
            FloorType::High => "高层",
        }
    }
}

/// One candidate housing unit as decoded from a listing page.
/// Every field that the markup may omit is an `Option`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingRecord {
    // Identity (the address is the dedup key)
    pub address: Option<String>,
    pub community: Option<String>,

    // Priced attributes
    pub total_price: Option<f64>,
    pub unit_price: Option<f64>,
    pub area: Option<f64>,

    // Rooms: detailed counts and the combined count of the simple layout
    pub bedrooms: Option<u32>,
    pub living_rooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub room_count: Option<u32>,

    pub orientation: Option<String>,
    pub age: Option<i32>,
    pub floor_type: Option<FloorType>,
    pub floor_total: Option<u32>,
    pub housing_period: Option<String>,
    pub near_subway: bool,
}

/// Nearby place counts; `None` means the lookup failed or never ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoiCounts {
    pub school: Option<u32>,
    pub subway: Option<u32>,
    pub park: Option<u32>,
    pub shopping_mall: Option<u32>,
    pub bus: Option<u32>,
}

impl PoiCounts {
    pub fn get(&self, category: PoiCategory) -> Option<u32> {
        match category {
            PoiCategory::School => self.school,
            PoiCategory::Subway => self.subway,
            PoiCategory::Park => self.park,
            PoiCategory::ShoppingMall => self.shopping_mall,
            PoiCategory::Bus => self.bus,
        }
    }

    pub fn set(&mut self, category: PoiCategory, count: Option<u32>) {
        let slot = match category {
            PoiCategory::School => &mut self.school,
            PoiCategory::Subway => &mut self.subway,
            PoiCategory::Park => &mut self.park,
            PoiCategory::ShoppingMall => &mut self.shopping_mall,
            PoiCategory::Bus => &mut self.bus,
        };
        *slot = count;
    }
}

/// A listing plus what the map service told us about it.
/// `location` is absent when geocoding failed; distance and POI counts
/// are then absent too.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub listing: ListingRecord,
    pub location: Option<Coordinate>,
    pub distance_km: Option<f64>,
    pub poi: PoiCounts,
}

impl EnrichedRecord {
    /// A record that has not been (or could not be) enriched.
    pub fn bare(listing: ListingRecord) -> Self {
        Self {
            listing,
            location: None,
            distance_km: None,
            poi: PoiCounts::default(),
        }
    }
}

/// Keeps the first record for each address, in input order.
/// Records without an address cannot collide and are all kept.
/// Returns the survivors and the number dropped.
pub fn dedup_by_address(records: Vec<ListingRecord>) -> (Vec<ListingRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::new();
    let kept: Vec<ListingRecord> = records
        .into_iter()
        .filter(|r| match &r.address {
            Some(addr) => seen.insert(addr.clone()),
            None => true,
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
