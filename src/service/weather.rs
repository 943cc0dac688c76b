use crate::client::WeatherSource;
use crate::domain::{CityName, Weather};
use crate::error::{Error, Result};

/// Look up current conditions for a city
#[tracing::instrument(name = "Get current weather", skip(source))]
pub async fn current_weather(source: &dyn WeatherSource, city: &str) -> Result<Weather> {
    let city: CityName = city.parse().map_err(Error::InvalidRequest)?;

    let weather = source.fetch(city.as_ref()).await.map_err(|e| {
        let e = Error::from(e);
        if let Error::ProviderUnavailable(source) = &e {
            tracing::error!(
                error.cause_chain = ?source,
                error.message = %source,
                "Weather provider request failed"
            );
        }
        e
    })?;

    Ok(weather)
}
