use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

use super::WeatherReading;

/// Named weather buckets a user can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Drizzle,
    Rainy,
    Snow,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 5] = [
        Self::Clear,
        Self::Cloudy,
        Self::Drizzle,
        Self::Rainy,
        Self::Snow,
    ];

    /// WMO codes reported by the weather api for this bucket.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn codes(&self) -> &'static [i32] {
        match self {
            Self::Clear => &[0],
            Self::Cloudy => &[1, 2, 3],
            Self::Drizzle => &[51, 52, 53, 54, 55, 56, 57],
            Self::Rainy => &[61, 62, 63, 64, 65, 66, 67, 80, 81, 82],
            // 80 (rain showers) is shared with rainy
            Self::Snow => &[71, 72, 73, 74, 75, 77, 80, 85, 86],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Drizzle => "drizzle",
            Self::Rainy => "rainy",
            Self::Snow => "snow",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|condition| condition.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_owned())
    }
}

/// Inclusive numeric bounds produced by the range validators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// What to do with a property whose weather could not be determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingWeather {
    #[default]
    Exclude,
    Include,
}

impl FromStr for MissingWeather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "include" => Ok(Self::Include),
            other => Err(format!("unknown missing weather policy: {}", other)),
        }
    }
}

/// Constraints a reading must satisfy, every axis optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
    pub conditions: Option<BTreeSet<i32>>,
}

impl FilterSpec {
    /// Build a filter from validated inputs, expanding condition names into their codes
    pub fn from_validated(
        temperature: Option<Range>,
        humidity: Option<Range>,
        conditions: Option<&[WeatherCondition]>,
    ) -> Self {
        Self {
            temp_min: temperature.map(|r| r.min),
            temp_max: temperature.map(|r| r.max),
            humidity_min: humidity.map(|r| r.min),
            humidity_max: humidity.map(|r| r.max),
            conditions: conditions.map(|conditions| {
                conditions
                    .iter()
                    .flat_map(|c| c.codes().iter().copied())
                    .collect()
            }),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.temp_min.is_none()
            && self.temp_max.is_none()
            && self.humidity_min.is_none()
            && self.humidity_max.is_none()
            && self.conditions.as_ref().map_or(true, BTreeSet::is_empty)
    }

    pub fn matches(&self, reading: &WeatherReading) -> bool {
        if self.temp_min.is_some_and(|min| reading.temperature < min) {
            return false;
        }
        if self.temp_max.is_some_and(|max| reading.temperature > max) {
            return false;
        }
        if self.humidity_min.is_some_and(|min| reading.humidity < min) {
            return false;
        }
        if self.humidity_max.is_some_and(|max| reading.humidity > max) {
            return false;
        }
        if let Some(codes) = &self.conditions {
            if !codes.is_empty() && !codes.contains(&reading.weather_code) {
                return false;
            }
        }
        true
    }

    /// Decide on a possibly missing reading; `None` and the failed-lookup placeholder both
    /// count as missing and are settled by `policy`.
    pub fn admits(&self, reading: Option<&WeatherReading>, policy: MissingWeather) -> bool {
        match reading {
            Some(reading) if !reading.is_unavailable() => self.matches(reading),
            _ => policy == MissingWeather::Include,
        }
    }
}
