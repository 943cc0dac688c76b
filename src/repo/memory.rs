use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use tokio::sync::Mutex;

use uuid::Uuid;

use crate::crypto::SubscriptionToken;

use super::subscriptions::{
    NewSubscription, StoreError, StoreResult, Subscription, SubscriptionStore,
};

/// In-memory subscription store.
///
/// Enforces the same uniqueness rules as the Postgres schema, so it can stand
/// in for it in tests and local runs. Cloning shares the underlying state.
#[derive(Debug, Default, Clone)]
pub struct InMemorySubscriptionRepo {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    subscriptions: HashMap<Uuid, Subscription>,
    // Issued confirmation tokens, kept after confirmation
    confirmation_tokens: HashMap<SubscriptionToken, Uuid>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions, pending or confirmed
    pub async fn len(&self) -> usize {
        self.state.lock().await.subscriptions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<Subscription> {
        self.state.lock().await.subscriptions.get(&id).cloned()
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for InMemorySubscriptionRepo {
    async fn create(&self, new_subscription: &NewSubscription) -> StoreResult<Subscription> {
        let mut state = self.state.lock().await;

        let email = new_subscription.email.as_ref();
        let city = new_subscription.city.as_ref();
        if state
            .subscriptions
            .values()
            .any(|s| s.email == email && s.city == city)
        {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let subscription = Subscription {
            id: new_subscription.id,
            email: email.to_string(),
            city: city.to_string(),
            frequency: new_subscription.frequency.as_str().to_string(),
            confirmation_token: Some(new_subscription.confirmation_token),
            is_confirmed: false,
            unsubscribe_token: new_subscription.unsubscribe_token,
            created_at: now,
            updated_at: now,
        };

        state
            .confirmation_tokens
            .insert(new_subscription.confirmation_token, subscription.id);
        state
            .subscriptions
            .insert(subscription.id, subscription.clone());

        Ok(subscription)
    }

    async fn find_by_email_and_city(
        &self,
        email: &str,
        city: &str,
    ) -> StoreResult<Option<Subscription>> {
        let state = self.state.lock().await;
        Ok(state
            .subscriptions
            .values()
            .find(|s| s.email == email && s.city == city)
            .cloned())
    }

    async fn find_by_confirmation_token(
        &self,
        token: &SubscriptionToken,
    ) -> StoreResult<Option<Subscription>> {
        let state = self.state.lock().await;
        Ok(state
            .confirmation_tokens
            .get(token)
            .and_then(|id| state.subscriptions.get(id))
            .cloned())
    }

    async fn find_by_unsubscribe_token(
        &self,
        token: &SubscriptionToken,
    ) -> StoreResult<Option<Subscription>> {
        let state = self.state.lock().await;
        Ok(state
            .subscriptions
            .values()
            .find(|s| s.unsubscribe_token == *token)
            .cloned())
    }

    async fn confirm(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        match state.subscriptions.get_mut(&id) {
            Some(subscription) if !subscription.is_confirmed => {
                subscription.is_confirmed = true;
                subscription.confirmation_token = None;
                subscription.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(StoreError::AlreadyConfirmed),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.subscriptions.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        state.confirmation_tokens.retain(|_, owner| *owner != id);
        Ok(())
    }

    async fn list_all_confirmed(&self) -> StoreResult<Vec<Subscription>> {
        let state = self.state.lock().await;
        let mut confirmed: Vec<_> = state
            .subscriptions
            .values()
            .filter(|s| s.is_confirmed)
            .cloned()
            .collect();
        confirmed.sort_by_key(|s| s.created_at);
        Ok(confirmed)
    }
}
