use serde::{Deserialize, Serialize};

/// Current conditions for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    pub description: String,
}

impl Weather {
    /// Human-readable summary used in update emails
    pub fn summary(&self, city: &str) -> String {
        format!(
            "Current weather in {}: {}, {:.1}°C, humidity {:.0}%.",
            city, self.description, self.temperature, self.humidity
        )
    }
}
