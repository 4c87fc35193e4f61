use chrono::{DateTime, Utc};
use common::errors::{AppError, ProviderError};
use common::models::{WeatherCreate, WeatherRecord, WeatherUpdate};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::api_client::{FetchedWeather, WeatherProvider};
use crate::store::WeatherStore;

/// Read-through cache over the weather store.
///
/// The store itself is the cache: a record younger than the freshness window
/// is served as-is, anything else is refreshed from the provider and written
/// back. A failed refresh never touches the stored record.
pub struct WeatherOrchestrator {
    store: Arc<dyn WeatherStore>,
    provider: Arc<dyn WeatherProvider>,
    freshness_window: Duration,
    fetch_timeout: Duration,
}

impl WeatherOrchestrator {
    pub fn new(
        store: Arc<dyn WeatherStore>,
        provider: Arc<dyn WeatherProvider>,
        freshness_window: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            freshness_window,
            fetch_timeout,
        }
    }

    /// Freshness-gated lookup.
    #[instrument(skip(self), fields(city = %city))]
    pub async fn lookup(&self, city: &str) -> Result<WeatherRecord, AppError> {
        let now = Utc::now();

        match self.store.get(city).await? {
            Some(record) if self.is_fresh(&record, now) => {
                info!(city = %city, "Returning cached weather data");
                Ok(record)
            }
            Some(record) => {
                info!(
                    city = %city,
                    age_ms = age(&record, now).as_millis() as u64,
                    "Cached weather expired, fetching from provider"
                );
                self.refresh(city).await
            }
            None => {
                info!(city = %city, "No cached weather, fetching from provider");
                self.refresh(city).await
            }
        }
    }

    /// Fetch from the provider and upsert, regardless of freshness.
    #[instrument(skip(self), fields(city = %city))]
    pub async fn refresh(&self, city: &str) -> Result<WeatherRecord, AppError> {
        let fetched = self.fetch(city).await?;

        self.store
            .upsert(
                &fetched.city,
                fetched.temperature,
                &fetched.description,
                Utc::now(),
            )
            .await
    }

    /// Direct create with no provider call; shares the per-city upsert so it
    /// can never add a second row for a known city.
    pub async fn create(&self, weather: &WeatherCreate) -> Result<WeatherRecord, AppError> {
        let city = weather.city.trim();
        if city.is_empty() {
            return Err(AppError::validation("City is required"));
        }

        self.store
            .upsert(city, weather.temperature, &weather.description, Utc::now())
            .await
    }

    /// Overwrite supplied fields and refresh the timestamp, whatever the
    /// record's freshness.
    pub async fn update(
        &self,
        city: &str,
        changes: &WeatherUpdate,
    ) -> Result<WeatherRecord, AppError> {
        self.store
            .update(city, changes, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("City not found"))
    }

    pub async fn list(&self) -> Result<Vec<WeatherRecord>, AppError> {
        self.store.list_records().await
    }

    pub fn is_fresh(&self, record: &WeatherRecord, now: DateTime<Utc>) -> bool {
        age(record, now) < self.freshness_window
    }

    async fn fetch(&self, city: &str) -> Result<FetchedWeather, ProviderError> {
        timeout(self.fetch_timeout, self.provider.fetch(city))
            .await
            .map_err(|_| ProviderError::new(format!("Weather fetch for {} timed out", city)))?
    }
}

/// Age of a record; a timestamp in the future counts as zero.
fn age(record: &WeatherRecord, now: DateTime<Utc>) -> Duration {
    (now - record.timestamp).to_std().unwrap_or_default()
}
