use async_trait::async_trait;
use common::errors::{AppError, ProviderError};
use common::http_client::HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Current conditions for a city, normalised to the stored record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedWeather {
    /// Provider's canonical spelling of the city
    pub city: String,
    pub temperature: f64,
    pub description: String,
}

/// Upstream source of current weather.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<FetchedWeather, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    name: String,
    main: MainReadings,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// OpenWeatherMap current-weather client (metric units).
pub struct OpenWeatherClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url,
            api_key,
        })
    }

    fn url_for(&self, city: &str) -> String {
        format!(
            "{}?q={}&appid={}&units=metric",
            self.base_url,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), fields(city = %city))]
    async fn fetch(&self, city: &str) -> Result<FetchedWeather, ProviderError> {
        info!(city = %city, "Fetching weather from OpenWeatherMap");

        let response: OpenWeatherResponse =
            self.http_client
                .get_json(&self.url_for(city))
                .await
                .map_err(|e| {
                    warn!(city = %city, error = %e, "OpenWeatherMap request failed");
                    match e {
                        AppError::HttpError { message, .. } => {
                            ProviderError::new(format!("OpenWeatherMap API error: {}", message))
                        }
                        other => ProviderError::new(format!("OpenWeatherMap API error: {}", other)),
                    }
                })?;

        let description = response
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or_else(|| {
                ProviderError::new("OpenWeatherMap API error: response has no weather conditions")
            })?;

        Ok(FetchedWeather {
            city: response.name,
            temperature: response.main.temp,
            description,
        })
    }
}
