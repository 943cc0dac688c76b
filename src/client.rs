mod email_client;
mod weather_client;

pub use email_client::{Email, EmailClient, Notifier};
pub use weather_client::{WeatherApiClient, WeatherError, WeatherSource};
