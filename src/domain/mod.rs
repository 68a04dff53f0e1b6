pub mod listing;

pub use listing::{dedup_by_address, EnrichedRecord, FloorType, ListingRecord, PoiCounts};
