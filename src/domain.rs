mod city_name;
mod email_address;
mod frequency;
mod weather;

pub use city_name::CityName;
pub use email_address::EmailAddress;
pub use frequency::{Frequency, DAILY_NOTIFICATION_HOUR};
pub use weather::Weather;
