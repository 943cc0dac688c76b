use std::sync::Arc;

use serde::Deserialize;

use uuid::Uuid;

use crate::client::Notifier;
use crate::crypto::SubscriptionToken;
use crate::domain::{CityName, EmailAddress, Frequency};
use crate::error::{Error, Result};
use crate::repo::{NewSubscription, SubscriptionStore};

use super::Links;

/// Raw subscription request, as submitted by the user
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionRequest {
    pub email: String,
    pub city: String,
    pub frequency: String,
}

/// Owns the subscription state machine:
/// `pending --confirm--> confirmed`, `pending | confirmed --unsubscribe--> removed`.
///
/// This is the only component that mutates subscription records.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    links: Links,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        links: Links,
    ) -> Self {
        Self {
            store,
            notifier,
            links,
        }
    }

    /// Create a pending subscription and email its confirmation link.
    ///
    /// A failed confirmation email is logged but does not undo the subscription.
    #[tracing::instrument(
        name = "Create a new subscription",
        skip(self, request),
        fields(
            email = %request.email,
            city = %request.city,
            frequency = %request.frequency,
            subscription_id = tracing::field::Empty,
        )
    )]
    pub async fn create(&self, request: SubscriptionRequest) -> Result<()> {
        let frequency: Frequency = request.frequency.parse().map_err(Error::InvalidFrequency)?;
        let email: EmailAddress = request.email.parse().map_err(Error::InvalidRequest)?;
        let city: CityName = request.city.parse().map_err(Error::InvalidRequest)?;

        let existing = self
            .store
            .find_by_email_and_city(email.as_ref(), city.as_ref())
            .await
            .map_err(|e| log_store_error(e, "Failed to check for an existing subscription"))?;
        if let Some(existing) = existing {
            tracing::info!(
                subscription_id = %existing.id,
                confirmed = existing.is_confirmed,
                "Subscription already requested for this email and city"
            );
            return Err(Error::AlreadyExists);
        }

        let new_subscription = NewSubscription {
            id: Uuid::new_v4(),
            email,
            city,
            frequency,
            confirmation_token: SubscriptionToken::generate(),
            unsubscribe_token: SubscriptionToken::generate(),
        };
        tracing::Span::current().record(
            "subscription_id",
            &tracing::field::display(new_subscription.id),
        );

        self.store
            .create(&new_subscription)
            .await
            .map_err(|e| log_store_error(e, "Failed to save subscription"))?;

        let confirmation_link = self.links.confirm(&new_subscription.confirmation_token);
        if let Err(e) = self
            .notifier
            .send_confirmation(
                &new_subscription.email,
                new_subscription.city.as_ref(),
                &confirmation_link,
            )
            .await
        {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to send confirmation email"
            );
        }

        tracing::info!("Subscription created, awaiting confirmation");
        Ok(())
    }

    /// Confirm a pending subscription by its confirmation token
    #[tracing::instrument(name = "Confirm a subscription", skip(self, token))]
    pub async fn confirm(&self, token: &str) -> Result<()> {
        let token: SubscriptionToken = token.parse().map_err(|_| Error::InvalidToken)?;

        let subscription = self
            .store
            .find_by_confirmation_token(&token)
            .await
            .map_err(|e| log_store_error(e, "Failed to find subscription by confirmation token"))?
            .ok_or(Error::NotFound)?;

        if subscription.is_confirmed {
            return Err(Error::AlreadyConfirmed);
        }

        self.store
            .confirm(subscription.id)
            .await
            .map_err(|e| log_store_error(e, "Failed to confirm subscription"))?;

        tracing::info!(subscription_id = %subscription.id, "Subscription confirmed");
        Ok(())
    }

    /// Permanently remove a subscription, pending or confirmed
    #[tracing::instrument(name = "Unsubscribe", skip(self, token))]
    pub async fn unsubscribe(&self, token: &str) -> Result<()> {
        let token: SubscriptionToken = token.parse().map_err(|_| Error::InvalidToken)?;

        let subscription = self
            .store
            .find_by_unsubscribe_token(&token)
            .await
            .map_err(|e| log_store_error(e, "Failed to find subscription by unsubscribe token"))?
            .ok_or(Error::NotFound)?;

        self.store
            .delete(subscription.id)
            .await
            .map_err(|e| log_store_error(e, "Failed to delete subscription"))?;

        tracing::info!(subscription_id = %subscription.id, "Subscription removed");
        Ok(())
    }
}

/// Convert a store error, logging it if it is a genuine collaborator failure
fn log_store_error(e: crate::repo::StoreError, message: &'static str) -> Error {
    let e = Error::from(e);
    if let Error::StoreUnavailable(source) = &e {
        tracing::error!(
            error.cause_chain = ?source,
            error.message = %source,
            "{}", message
        );
    }
    e
}
