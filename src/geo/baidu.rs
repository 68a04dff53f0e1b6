// geo/baidu.rs
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::geo::enrich::{EnrichConfig, EnrichError, Geocoder, PlaceCounter, PoiCategory, PoiQueries};
use crate::geo::Coordinate;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    result: Option<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    location: Coordinate,
}

#[derive(Debug, Deserialize)]
struct PlaceResponse {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// Geocoding and place search against the Baidu map web API.
pub struct BaiduMapClient {
    client: Client,
    ak: String,
    geocode_url: String,
    place_url: String,
    queries: PoiQueries,
}

impl BaiduMapClient {
    pub fn new(ak: String, cfg: &EnrichConfig) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EnrichError::Geocode(format!("client init failed: {e}")))?;

        Ok(Self {
            client,
            ak,
            geocode_url: cfg.geocode_url.clone(),
            place_url: cfg.place_url.clone(),
            queries: cfg.queries.clone(),
        })
    }
}

impl Geocoder for BaiduMapClient {
    fn geocode(&self, address: &str, city_name: &str) -> Result<Coordinate, EnrichError> {
        let params = [
            ("address", address),
            ("city", city_name),
            ("output", "json"),
            ("ak", self.ak.as_str()),
        ];

        let resp: GeocodeResponse = self
            .client
            .get(&self.geocode_url)
            .query(&params)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| EnrichError::Geocode(e.to_string()))?
            .json()
            .map_err(|e| EnrichError::Geocode(e.to_string()))?;

        location_from(resp)
    }
}

impl PlaceCounter for BaiduMapClient {
    fn place_count(
        &self,
        at: Coordinate,
        category: PoiCategory,
        radius_m: u32,
    ) -> Result<u32, EnrichError> {
        let location = format!("{},{}", at.lat, at.lng);
        let radius = radius_m.to_string();
        let params = [
            ("query", self.queries.query(category)),
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("output", "json"),
            ("ak", self.ak.as_str()),
        ];

        let resp: PlaceResponse = self
            .client
            .get(&self.place_url)
            .query(&params)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| EnrichError::PlaceLookup(e.to_string()))?
            .json()
            .map_err(|e| EnrichError::PlaceLookup(e.to_string()))?;

        count_from(resp)
    }
}

/// Non-zero status is a service-side failure (bad key, quota, no match).
fn location_from(resp: GeocodeResponse) -> Result<Coordinate, EnrichError> {
    if resp.status != 0 {
        return Err(EnrichError::Geocode(format!(
            "status {}: {}",
            resp.status,
            resp.message.unwrap_or_default()
        )));
    }

    resp.result
        .map(|r| r.location)
        .ok_or_else(|| EnrichError::Geocode("response has no location".into()))
}

fn count_from(resp: PlaceResponse) -> Result<u32, EnrichError> {
    if resp.status != 0 {
        return Err(EnrichError::PlaceLookup(format!(
            "status {}: {}",
            resp.status,
            resp.message.unwrap_or_default()
        )));
    }

    Ok(resp.results.len() as u32)
}
