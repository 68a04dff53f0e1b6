pub mod decoder;
pub mod locators;
pub mod regroup;

pub use decoder::{DecodeConfig, DecodedPage, FloorLabels, Misalignment, PageDecoder};
pub use locators::{CompiledLocators, ListingProbe, LocatorTable};
pub use regroup::{regroup, Regrouped};
