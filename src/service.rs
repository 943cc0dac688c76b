mod dispatcher;
mod links;
mod subscriptions;
mod weather;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{Dispatcher, TickOutcome, TickReport};
pub use links::Links;
pub use subscriptions::{SubscriptionRequest, SubscriptionService};
pub use weather::current_weather;
