use async_trait::async_trait;
use futures::{stream, StreamExt};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::{collections::HashMap, hash::Hash, sync::Arc};

use super::{Coordinate, WeatherCache, WeatherReading};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// Upper bound on upstream lookups in flight for one batch
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code";

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("Failed to reach weather api: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Weather api responded with status {0}")]
    Status(u16),
    #[error("Weather api response was malformed: {0}")]
    Malformed(String),
}

/// Source of current conditions for a single coordinate
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, coordinate: Coordinate) -> Result<WeatherReading, UpstreamError>;
}

/// Open-Meteo forecast api, queried for its `current` block only
pub struct OpenMeteo {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: i32,
}

impl OpenMeteo {
    pub fn new(
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteo {
    async fn current(&self, coordinate: Coordinate) -> Result<WeatherReading, UpstreamError> {
        let latitude = coordinate.lat.to_string();
        let longitude = coordinate.lng.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_FIELDS),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let current = body
            .current
            .ok_or_else(|| UpstreamError::Malformed(String::from("missing `current` block")))?;

        Ok(WeatherReading {
            temperature: current.temperature_2m,
            humidity: current.relative_humidity_2m,
            weather_code: current.weather_code,
        })
    }
}

/// Cached, deduplicating front for a [`WeatherSource`]
pub struct WeatherClient {
    source: Arc<dyn WeatherSource>,
    cache: Arc<WeatherCache>,
    ttl: time::Duration,
    concurrency: usize,
}

impl WeatherClient {
    pub fn new(source: Arc<dyn WeatherSource>, cache: Arc<WeatherCache>) -> Self {
        Self {
            source,
            cache,
            ttl: time::Duration::seconds(weather_search_core::DEFAULT_WEATHER_TTL_SECS as i64),
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    pub fn with_ttl(mut self, ttl: time::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    pub async fn fetch_one(&self, coordinate: Coordinate) -> Result<WeatherReading, UpstreamError> {
        let key = coordinate.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("weather cache hit: {}", key);
            return Ok(cached);
        }

        let reading = self.source.current(coordinate).await?;
        self.cache.set(&key, reading, self.ttl);
        Ok(reading)
    }

    /// Look up weather for many ids at once.
    ///
    /// Ids whose coordinates share a cache key are resolved by a single lookup. At most
    /// `concurrency` lookups run at the same time. A failed lookup hands every id on that
    /// key [`WeatherReading::unavailable`] instead of failing the batch.
    pub async fn fetch_batch<Id>(
        &self,
        items: Vec<(Id, Coordinate)>,
    ) -> HashMap<Id, WeatherReading>
    where
        Id: Eq + Hash,
    {
        let mut groups: Vec<(Coordinate, Vec<Id>)> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();
        for (id, coordinate) in items {
            let key = coordinate.cache_key();
            match index_by_key.get(&key) {
                Some(&idx) => groups[idx].1.push(id),
                None => {
                    index_by_key.insert(key, groups.len());
                    groups.push((coordinate, vec![id]));
                }
            }
        }

        let lookups: Vec<(usize, Coordinate)> = groups
            .iter()
            .map(|(coordinate, _)| *coordinate)
            .enumerate()
            .collect();
        let readings: Vec<(usize, WeatherReading)> = stream::iter(lookups)
            .map(|(idx, coordinate)| async move {
                let reading = match self.fetch_one(coordinate).await {
                    Ok(reading) => reading,
                    Err(e) => {
                        warn!(
                            "weather lookup failed for ({}, {}): {}",
                            coordinate.lat, coordinate.lng, e
                        );
                        WeatherReading::unavailable()
                    }
                };
                (idx, reading)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut results = HashMap::new();
        let mut groups: Vec<Option<Vec<Id>>> =
            groups.into_iter().map(|(_, ids)| Some(ids)).collect();
        for (idx, reading) in readings {
            if let Some(ids) = groups[idx].take() {
                for id in ids {
                    results.insert(id, reading);
                }
            }
        }
        results
    }
}
