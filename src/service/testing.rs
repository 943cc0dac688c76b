//! Test doubles for the service collaborators

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::client::{Notifier, WeatherError, WeatherSource};
use crate::domain::{EmailAddress, Weather};

#[derive(Debug, Clone, PartialEq)]
pub enum SentEmail {
    Confirmation {
        to: String,
        city: String,
        link: String,
    },
    WeatherUpdate {
        to: String,
        city: String,
        summary: String,
        link: String,
    },
}

/// Notifier that records every email instead of sending it
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn updates_to(&self, email: &str) -> usize {
        self.sent()
            .iter()
            .filter(|s| matches!(s, SentEmail::WeatherUpdate { to, .. } if to == email))
            .count()
    }

    fn check(&self, recipient: &EmailAddress) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().contains(recipient.as_ref()) {
            anyhow::bail!("mail server rejected {}", recipient);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send_confirmation(
        &self,
        recipient: &EmailAddress,
        city: &str,
        confirmation_link: &str,
    ) -> anyhow::Result<()> {
        self.check(recipient)?;
        self.sent.lock().unwrap().push(SentEmail::Confirmation {
            to: recipient.to_string(),
            city: city.to_string(),
            link: confirmation_link.to_string(),
        });
        Ok(())
    }

    async fn send_weather_update(
        &self,
        recipient: &EmailAddress,
        city: &str,
        summary: &str,
        unsubscribe_link: &str,
    ) -> anyhow::Result<()> {
        self.check(recipient)?;
        self.sent.lock().unwrap().push(SentEmail::WeatherUpdate {
            to: recipient.to_string(),
            city: city.to_string(),
            summary: summary.to_string(),
            link: unsubscribe_link.to_string(),
        });
        Ok(())
    }
}

/// Lets a test hold a fetch in flight until it decides to release it
#[derive(Debug, Default)]
pub struct FetchGate {
    pub entered: Notify,
    pub release: Notify,
}

/// Weather source answering from a fixed table; unknown cities are not found
#[derive(Debug, Default)]
pub struct StubWeather {
    known: HashMap<String, Weather>,
    failing: HashSet<String>,
    fetched: Mutex<Vec<String>>,
    gate: Option<Arc<FetchGate>>,
}

impl StubWeather {
    pub fn with_city(mut self, city: &str, description: &str) -> Self {
        self.known.insert(
            city.to_string(),
            Weather {
                temperature: 18.0,
                humidity: 55.0,
                description: description.to_string(),
            },
        );
        self
    }

    pub fn failing_for(mut self, city: &str) -> Self {
        self.failing.insert(city.to_string());
        self
    }

    pub fn gated(mut self, gate: Arc<FetchGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WeatherSource for StubWeather {
    async fn fetch(&self, city: &str) -> Result<Weather, WeatherError> {
        self.fetched.lock().unwrap().push(city.to_string());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.failing.contains(city) {
            return Err(WeatherError::RequestFailed("provider timed out".into()));
        }
        self.known
            .get(city)
            .cloned()
            .ok_or(WeatherError::CityNotFound)
    }
}
