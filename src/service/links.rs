use url::Url;

use crate::crypto::SubscriptionToken;

/// Builds the links embedded in subscription emails from the public base URL
#[derive(Debug, Clone)]
pub struct Links {
    base_url: String,
}

impl Links {
    pub fn new(base_url: &Url) -> Self {
        let base_url = base_url.as_str().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn confirm(&self, token: &SubscriptionToken) -> String {
        format!("{}/api/confirm/{}", self.base_url, token)
    }

    pub fn unsubscribe(&self, token: &SubscriptionToken) -> String {
        format!("{}/api/unsubscribe/{}", self.base_url, token)
    }
}
