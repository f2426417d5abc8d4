pub mod cache;
pub mod client;
pub mod filter;

pub use cache::*;
pub use client::*;
pub use filter::*;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Geographic point a property sits on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Cache and dedup identity: both axes rounded to 4 decimals, e.g. `"40.7128,-74.0060"`.
    /// Points closer than ~11m collapse onto the same key. Exact binary ties round half to
    /// even; negative zero is folded into zero.
    pub fn cache_key(&self) -> String {
        format!("{:.4},{:.4}", self.lat + 0.0, self.lng + 0.0)
    }
}

/// Current conditions at a coordinate, temperature in °C and humidity in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature: f64,
    pub humidity: f64,
    pub weather_code: i32,
}

impl WeatherReading {
    pub const UNAVAILABLE_CODE: i32 = -1;

    /// Placeholder handed out when the upstream lookup failed
    pub fn unavailable() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            weather_code: Self::UNAVAILABLE_CODE,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.weather_code == Self::UNAVAILABLE_CODE
    }
}
