use uuid::Uuid;

use chrono::{DateTime, Utc};

use sqlx::PgPool;

use crate::crypto::SubscriptionToken;
use crate::domain::{CityName, EmailAddress, Frequency};

/// Name of the unique constraint guarding one subscription per (email, city)
const EMAIL_CITY_CONSTRAINT: &str = "subscriptions_email_city_key";

/// Errors reported by a subscription store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A subscription for this email and city already exists")]
    Duplicate,
    #[error("Subscription not found or already confirmed")]
    AlreadyConfirmed,
    #[error("Subscription not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// New pending subscription, fully prepared by the lifecycle service
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub id: Uuid,
    pub email: EmailAddress,
    pub city: CityName,
    pub frequency: Frequency,
    pub confirmation_token: SubscriptionToken,
    pub unsubscribe_token: SubscriptionToken,
}

/// Stored Subscription record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    /// ID of the subscription
    pub id: Uuid,
    /// User supplied data, validated before insert
    pub email: String,
    pub city: String,
    /// Kept as stored text; readers parse it into a `Frequency`
    pub frequency: String,
    /// `None` once the subscription has been confirmed
    pub confirmation_token: Option<SubscriptionToken>,
    pub is_confirmed: bool,
    pub unsubscribe_token: SubscriptionToken,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription store contract, implemented for each backing storage.
/// NOTE: Intended to facilitate easier testing/mocking
#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new pending subscription.
    /// Fails with `Duplicate` if the (email, city) pair is taken.
    async fn create(&self, new_subscription: &NewSubscription) -> StoreResult<Subscription>;

    async fn find_by_email_and_city(
        &self,
        email: &str,
        city: &str,
    ) -> StoreResult<Option<Subscription>>;

    /// Resolves any confirmation token ever issued, including consumed ones
    async fn find_by_confirmation_token(
        &self,
        token: &SubscriptionToken,
    ) -> StoreResult<Option<Subscription>>;

    async fn find_by_unsubscribe_token(
        &self,
        token: &SubscriptionToken,
    ) -> StoreResult<Option<Subscription>>;

    /// Confirm a pending subscription.
    /// Fails with `AlreadyConfirmed` if no pending row matched.
    async fn confirm(&self, id: Uuid) -> StoreResult<()>;

    /// Fails with `NotFound` if no row matched
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn list_all_confirmed(&self) -> StoreResult<Vec<Subscription>>;
}

/// Postgres Subscription Repository
#[derive(Debug, Clone)]
pub struct PgSubscriptionRepo {
    pool: PgPool,
}

impl PgSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_SUBSCRIPTION: &str = r#"
    select s.id, s.email, s.city, s.frequency, s.confirmation_token, s.is_confirmed,
           s.unsubscribe_token, s.created_at, s.updated_at
    from subscriptions s
"#;

#[async_trait::async_trait]
impl SubscriptionStore for PgSubscriptionRepo {
    #[tracing::instrument(
        name = "Insert subscription",
        skip(self, new_subscription),
        fields(subscription_id = %new_subscription.id)
    )]
    async fn create(&self, new_subscription: &NewSubscription) -> StoreResult<Subscription> {
        let mut tx = self.pool.begin().await?;

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            insert into subscriptions
                (id, email, city, frequency, confirmation_token, is_confirmed, unsubscribe_token)
            values ($1, $2, $3, $4, $5, false, $6)
            returning id, email, city, frequency, confirmation_token, is_confirmed,
                      unsubscribe_token, created_at, updated_at
            "#,
        )
        .bind(new_subscription.id)
        .bind(new_subscription.email.as_ref())
        .bind(new_subscription.city.as_ref())
        .bind(new_subscription.frequency.as_str())
        .bind(new_subscription.confirmation_token)
        .bind(new_subscription.unsubscribe_token)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query("insert into confirmation_tokens (token, subscription_id) values ($1, $2)")
            .bind(new_subscription.confirmation_token)
            .bind(new_subscription.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Find subscription by email and city", skip(self))]
    async fn find_by_email_and_city(
        &self,
        email: &str,
        city: &str,
    ) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "{} where s.email = $1 and s.city = $2",
            SELECT_SUBSCRIPTION
        ))
        .bind(email)
        .bind(city)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Find subscription by confirmation token", skip_all)]
    async fn find_by_confirmation_token(
        &self,
        token: &SubscriptionToken,
    ) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "{} join confirmation_tokens t on t.subscription_id = s.id where t.token = $1",
            SELECT_SUBSCRIPTION
        ))
        .bind(*token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Find subscription by unsubscribe token", skip_all)]
    async fn find_by_unsubscribe_token(
        &self,
        token: &SubscriptionToken,
    ) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "{} where s.unsubscribe_token = $1",
            SELECT_SUBSCRIPTION
        ))
        .bind(*token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Confirm a subscription by id", skip(self))]
    async fn confirm(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            update subscriptions
            set is_confirmed = true, confirmation_token = null, updated_at = $2
            where id = $1 and is_confirmed = false
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyConfirmed);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Delete a subscription by id", skip(self))]
    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("delete from subscriptions where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Fetch all confirmed subscriptions", skip(self))]
    async fn list_all_confirmed(&self) -> StoreResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            "{} where s.is_confirmed order by s.created_at",
            SELECT_SUBSCRIPTION
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }
}

fn map_unique_violation(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_error)
            if db_error.is_unique_violation()
                && db_error.constraint() == Some(EMAIL_CITY_CONSTRAINT) =>
        {
            StoreError::Duplicate
        }
        _ => StoreError::Database(e),
    }
}
