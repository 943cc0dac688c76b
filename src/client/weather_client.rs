use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use secrecy::Secret;

use serde::Deserialize;

use url::Url;

use crate::domain::Weather;

/// WeatherAPI.com error code for an unknown location
const CITY_NOT_FOUND_CODE: i64 = 1006;

/// Various errors that can occur when fetching weather
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("City not found")]
    CityNotFound,
    #[error("Weather API request failed: {0}")]
    RequestFailed(String),
    #[error("Weather API request failed")]
    Http(#[from] reqwest::Error),
}

/// Source of current weather conditions
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<Weather, WeatherError>;
}

/// REST client for the WeatherAPI.com current conditions endpoint
#[derive(Debug)]
pub struct WeatherApiClient {
    client: Client,
    api_current_url: Url,
    api_key: Secret<String>,
}

impl WeatherApiClient {
    pub fn new(
        api_timeout: Duration,
        api_base_url: Url,
        api_key: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_current_url = api_base_url
            .join("v1/current.json")
            .context("Failed to create current weather endpoint URL")?;

        Ok(Self {
            client,
            api_current_url,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl WeatherSource for WeatherApiClient {
    #[tracing::instrument(name = "Fetch current weather", skip(self))]
    async fn fetch(&self, city: &str) -> Result<Weather, WeatherError> {
        use secrecy::ExposeSecret;

        let response = self
            .client
            .get(self.api_current_url.clone())
            .query(&[
                ("key", self.api_key.expose_secret().as_str()),
                ("q", city),
                ("aqi", "no"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: CurrentWeatherResponse = response.json().await?;

        if let Some(error) = body.error {
            if error.code == CITY_NOT_FOUND_CODE {
                return Err(WeatherError::CityNotFound);
            }
            return Err(WeatherError::RequestFailed(format!(
                "{} (code: {})",
                error.message, error.code
            )));
        }
        if !status.is_success() {
            return Err(WeatherError::RequestFailed(format!(
                "received status {}",
                status
            )));
        }

        let current = body
            .current
            .ok_or_else(|| WeatherError::RequestFailed("missing current conditions".into()))?;

        Ok(Weather {
            temperature: current.temp_c,
            humidity: current.humidity,
            description: current.condition.text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    current: Option<CurrentConditions>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}
