mod token;

pub use token::{SubscriptionToken, TokenError};
