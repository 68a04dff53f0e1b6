// geo/coord.rs
//
// BD-09 (map-service datum) -> GCJ-02 -> WGS-84.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const X_PI: f64 = PI * 3000.0 / 180.0;
/// Krasovsky 1940 semi-major axis.
const SEMI_MAJOR_AXIS: f64 = 6_378_245.0;
const ECCENTRICITY_SQUARED: f64 = 0.006_693_421_622_965_943_23;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Converts a raw geocoder coordinate into WGS-84.
///
/// Stage one undoes the BD-09 offset (shift, then polar radius/angle
/// correction). Stage two estimates the GCJ-02 bias at the intermediate
/// point and reflects it: `2 * intermediate - biased`.
pub fn correct(raw: Coordinate) -> Coordinate {
    let gcj = bd09_to_gcj02(raw);
    gcj02_to_wgs84(gcj)
}

pub fn bd09_to_gcj02(raw: Coordinate) -> Coordinate {
    let x = raw.lng - 0.0065;
    let y = raw.lat - 0.006;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * X_PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * X_PI).cos();
    Coordinate::new(z * theta.cos(), z * theta.sin())
}

pub fn gcj02_to_wgs84(gcj: Coordinate) -> Coordinate {
    let mut dlat = lat_bias(gcj.lng - 105.0, gcj.lat - 35.0);
    let mut dlng = lng_bias(gcj.lng - 105.0, gcj.lat - 35.0);

    let radlat = gcj.lat / 180.0 * PI;
    let magic = 1.0 - ECCENTRICITY_SQUARED * radlat.sin() * radlat.sin();
    let sqrt_magic = magic.sqrt();

    dlat = (dlat * 180.0) / ((SEMI_MAJOR_AXIS * (1.0 - ECCENTRICITY_SQUARED)) / (magic * sqrt_magic) * PI);
    dlng = (dlng * 180.0) / (SEMI_MAJOR_AXIS / sqrt_magic * radlat.cos() * PI);

    let biased_lat = gcj.lat + dlat;
    let biased_lng = gcj.lng + dlng;
    Coordinate::new(gcj.lng * 2.0 - biased_lng, gcj.lat * 2.0 - biased_lat)
}

fn lat_bias(lng: f64, lat: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * lng + 3.0 * lat + 0.2 * lat * lat + 0.1 * lng * lat
        + 0.2 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lat * PI).sin() + 40.0 * (lat / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (lat / 12.0 * PI).sin() + 320.0 * (lat * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn lng_bias(lng: f64, lat: f64) -> f64 {
    let mut ret = 300.0 + lng + 2.0 * lat + 0.1 * lng * lng + 0.1 * lng * lat
        + 0.1 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lng * PI).sin() + 40.0 * (lng / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (lng / 12.0 * PI).sin() + 300.0 * (lng / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}
