use log::{debug, info};
use std::sync::Arc;

use crate::{
    db::{EnrichedProperty, PropertyQuery, PropertyRecord, PropertyStore, StoreError},
    weather::{FilterSpec, MissingWeather, WeatherClient},
};

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("Property store failed: {0}")]
    Store(#[from] StoreError),
}

/// Knobs for the paginated match accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    /// Rows requested from the store per page
    pub page_size: i64,
    /// Stop once this many properties matched
    pub target_results: usize,
    /// Maximum number of store pages read per search
    pub max_attempts: usize,
    pub on_missing_weather: MissingWeather,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            target_results: 20,
            max_attempts: 3,
            on_missing_weather: MissingWeather::default(),
        }
    }
}

pub struct PropertySearch {
    store: Arc<dyn PropertyStore>,
    weather: Arc<WeatherClient>,
    settings: SearchSettings,
}

impl PropertySearch {
    pub fn new(
        store: Arc<dyn PropertyStore>,
        weather: Arc<WeatherClient>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            store,
            weather,
            settings,
        }
    }

    /// Walk the store page by page, keeping properties whose current weather passes
    /// `filter`, until `target_results` matched, the store runs dry, or `max_attempts`
    /// pages were read. Matches beyond the attempt cap are never seen.
    pub async fn search(
        &self,
        search_text: Option<&str>,
        filter: &FilterSpec,
    ) -> Result<Vec<EnrichedProperty>, SearchError> {
        let target = self.settings.target_results;
        let mut matched: Vec<EnrichedProperty> = Vec::with_capacity(target);
        let mut skip = 0;
        let mut attempt = 0;

        while matched.len() < target && attempt < self.settings.max_attempts {
            let query = PropertyQuery {
                skip,
                take: self.settings.page_size,
                search: search_text.map(str::to_owned),
            };
            let rows = self.store.find(&query).await?;
            info!(
                "attempt {}: fetched {} properties",
                attempt + 1,
                rows.len()
            );
            if rows.is_empty() {
                break;
            }

            let mut rows = rows.into_iter().peekable();
            while matched.len() < target && rows.peek().is_some() {
                let needed = target - matched.len();
                let slice: Vec<PropertyRecord> = rows.by_ref().take(needed).collect();
                self.enrich_into(slice, filter, &mut matched).await;
            }

            skip += self.settings.page_size;
            attempt += 1;
        }

        info!("search finished with {} matching properties", matched.len());
        Ok(matched)
    }

    /// Fetch weather for `rows` in one batch and append those passing `filter` in order.
    /// Rows are fetched no more than the number still needed so a full page of matches
    /// does not pay for lookups it will discard.
    async fn enrich_into(
        &self,
        rows: Vec<PropertyRecord>,
        filter: &FilterSpec,
        matched: &mut Vec<EnrichedProperty>,
    ) {
        let coordinates = rows
            .iter()
            .filter_map(|row| row.coordinate().map(|c| (row.id, c)))
            .collect();
        let readings = self.weather.fetch_batch(coordinates).await;

        for row in rows {
            let reading = readings.get(&row.id);
            if !filter.admits(reading, self.settings.on_missing_weather) {
                continue;
            }
            debug!("property {} matched all filters", row.id);
            matched.push(EnrichedProperty {
                weather: reading.filter(|r| !r.is_unavailable()).copied(),
                property: row,
            });
        }
    }
}
