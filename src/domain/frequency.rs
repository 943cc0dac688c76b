use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};

/// Hour of the day (UTC) at which daily notifications go out
pub const DAILY_NOTIFICATION_HOUR: u32 = 8;

/// How often a confirmed subscriber receives weather updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Hourly,
    Daily,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }

    /// Whether `now` falls on this frequency's notification boundary.
    ///
    /// Boundaries are minute-aligned: hourly fires during minute zero of every
    /// hour, daily during 08:00 UTC.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Hourly => now.minute() == 0,
            Self::Daily => now.hour() == DAILY_NOTIFICATION_HOUR && now.minute() == 0,
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            other => Err(format!(
                "Invalid frequency '{}', must be 'hourly' or 'daily'",
                other
            )),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
