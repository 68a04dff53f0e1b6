pub mod config;
pub mod crawler;
pub mod db;
pub mod domain;
pub mod errors;
pub mod features;
pub mod geo;
pub mod logging;
pub mod parser;
pub mod runner;
pub mod spreadsheets;

pub use errors::{Error, Result};
pub use runner::{CityRun, RunSummary, Runner};

#[cfg(test)]
mod tests;
