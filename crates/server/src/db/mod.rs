pub mod sqlite;

pub use sqlite::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::weather::{Coordinate, WeatherReading};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to query property store: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to run property store migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to load seed data: {0}")]
    Seed(String),
}

/// A listing as stored, decoded with explicit optionality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl PropertyRecord {
    /// Only rows carrying both latitude and longitude can be enriched with weather
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

/// Search result: the stored listing plus the weather observed at its coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnrichedProperty {
    #[serde(flatten)]
    pub property: PropertyRecord,
    pub weather: Option<WeatherReading>,
}

/// One page of the property listing, ordered by id ascending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyQuery {
    pub skip: i64,
    pub take: i64,
    /// Case-sensitive substring matched against name, city or state
    pub search: Option<String>,
}

#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn find(&self, query: &PropertyQuery) -> Result<Vec<PropertyRecord>, StoreError>;
}
