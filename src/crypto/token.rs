use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Errors that can occur when handling tokens
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is of invalid format")]
    InvalidFormat(#[from] uuid::Error),
}

/// Unguessable identifier embedded in confirmation and unsubscribe links.
///
/// Backed by a random (v4) UUID, so confirmation and unsubscribe tokens share
/// one identifier space. Stored natively as a Postgres `uuid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct SubscriptionToken(Uuid);

impl SubscriptionToken {
    /// Issue a fresh token
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for SubscriptionToken {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::try_parse(token.trim())?;
        Ok(Self(uuid))
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<SubscriptionToken> for Uuid {
    fn from(value: SubscriptionToken) -> Uuid {
        value.0
    }
}
