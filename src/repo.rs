mod memory;
mod subscriptions;

pub use memory::InMemorySubscriptionRepo;
pub use subscriptions::{
    NewSubscription, PgSubscriptionRepo, StoreError, StoreResult, Subscription,
    SubscriptionStore,
};
