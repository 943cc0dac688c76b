use std::fmt;
use std::str::FromStr;

use unicode_segmentation::UnicodeSegmentation;

const MAX_LEN: usize = 100;

/// A user supplied city name, forwarded as-is to the weather provider
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CityName(String);

impl FromStr for CityName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err("City cannot be empty".into());
        }
        if value.graphemes(true).count() > MAX_LEN {
            return Err("City name too long".into());
        }
        if value.chars().any(char::is_control) {
            return Err("City name contains invalid characters".into());
        }

        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for CityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
