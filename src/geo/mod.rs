pub mod baidu;
pub mod coord;
pub mod distance;
pub mod enrich;

pub use baidu::BaiduMapClient;
pub use coord::{correct, Coordinate};
pub use distance::haversine_km;
pub use enrich::{
    EnrichConfig, EnrichError, Enricher, EnrichmentStats, Geocoder, PlaceCounter, PoiCategory,
    PoiQueries,
};
