pub mod registry;
pub mod settings;

pub use registry::{City, CityRegistry};
pub use settings::{Settings, MAP_KEY_ENV};
