use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::{Notifier, WeatherSource};
use crate::domain::{EmailAddress, Frequency};
use crate::repo::{Subscription, SubscriptionStore};

use super::Links;

/// Counts for a completed tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Confirmed subscriptions looked at
    pub checked: usize,
    /// Subscriptions whose boundary matched this tick
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickReport),
    /// A previous tick was still running
    SkippedOverlap,
    /// This minute was already handled by an earlier tick
    SkippedDuplicate,
    /// Confirmed subscriptions could not be listed
    Aborted,
}

/// Sends weather updates to confirmed subscribers whose notification
/// boundary matches the current minute.
///
/// Clones share the same overlap guard, so at most one tick runs at a time
/// across all of them.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn SubscriptionStore>,
    weather: Arc<dyn WeatherSource>,
    notifier: Arc<dyn Notifier>,
    links: Links,
    // Minute (seconds since epoch / 60) of the last completed tick
    guard: Arc<Mutex<Option<i64>>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        weather: Arc<dyn WeatherSource>,
        notifier: Arc<dyn Notifier>,
        links: Links,
    ) -> Self {
        Self {
            store,
            weather,
            notifier,
            links,
            guard: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a single tick at the current time
    pub async fn run_due_notifications(&self) -> TickOutcome {
        self.run_tick_at(Utc::now()).await
    }

    /// Run a single tick as if the time were `now`
    #[tracing::instrument(name = "Dispatch due notifications", skip(self))]
    pub async fn run_tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        let mut last_minute = match self.guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("Previous tick still running, skipping");
                return TickOutcome::SkippedOverlap;
            }
        };

        let minute = now.timestamp().div_euclid(60);
        if *last_minute == Some(minute) {
            tracing::debug!("Minute already dispatched, skipping");
            return TickOutcome::SkippedDuplicate;
        }

        let subscriptions = match self.store.list_all_confirmed().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to list confirmed subscriptions"
                );
                return TickOutcome::Aborted;
            }
        };

        let mut report = TickReport {
            checked: subscriptions.len(),
            ..TickReport::default()
        };
        for subscription in &subscriptions {
            match self.dispatch(subscription, now).await {
                Dispatch::NotDue => {}
                Dispatch::Sent => {
                    report.due += 1;
                    report.sent += 1;
                }
                Dispatch::Failed => {
                    report.due += 1;
                    report.failed += 1;
                }
            }
        }

        *last_minute = Some(minute);
        TickOutcome::Completed(report)
    }

    /// Handle a single subscription; every failure ends up logged here
    #[tracing::instrument(
        name = "Dispatch weather update",
        skip(self, subscription, now),
        fields(subscription_id = %subscription.id, city = %subscription.city)
    )]
    async fn dispatch(&self, subscription: &Subscription, now: DateTime<Utc>) -> Dispatch {
        let frequency: Frequency = match subscription.frequency.parse() {
            Ok(frequency) => frequency,
            Err(e) => {
                tracing::warn!(error.message = %e, "Skipping subscription with unknown frequency");
                return Dispatch::NotDue;
            }
        };
        if !frequency.is_due(now) {
            return Dispatch::NotDue;
        }

        let recipient: EmailAddress = match subscription.email.parse() {
            Ok(recipient) => recipient,
            Err(e) => {
                tracing::error!(
                    error.message = %e,
                    "Skipping subscription with invalid stored email"
                );
                return Dispatch::Failed;
            }
        };

        let weather = match self.weather.fetch(&subscription.city).await {
            Ok(weather) => weather,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to fetch weather"
                );
                return Dispatch::Failed;
            }
        };

        let summary = weather.summary(&subscription.city);
        let unsubscribe_link = self.links.unsubscribe(&subscription.unsubscribe_token);
        match self
            .notifier
            .send_weather_update(&recipient, &subscription.city, &summary, &unsubscribe_link)
            .await
        {
            Ok(()) => Dispatch::Sent,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to send weather update"
                );
                Dispatch::Failed
            }
        }
    }

    /// Fire a tick every `period` until `shutdown` flips to `true`.
    ///
    /// The first tick lands on the next whole minute. Each tick runs on its
    /// own task so a slow tick never delays the timer.
    pub async fn run_until_stopped(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now() + until_next_minute(Utc::now());
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(period_secs = period.as_secs(), "Dispatcher started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let dispatcher = self.clone();
                    tokio::spawn(async move {
                        match dispatcher.run_due_notifications().await {
                            TickOutcome::Completed(report) if report.due > 0 => tracing::info!(
                                checked = report.checked,
                                due = report.due,
                                sent = report.sent,
                                failed = report.failed,
                                "Tick completed"
                            ),
                            outcome => tracing::debug!(?outcome, "Tick finished"),
                        }
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Dispatcher stopped");
    }
}

enum Dispatch {
    NotDue,
    Sent,
    Failed,
}

fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let into_minute = Duration::from_secs(now.timestamp().rem_euclid(60) as u64)
        + Duration::from_nanos(u64::from(now.timestamp_subsec_nanos()));
    Duration::from_secs(60).saturating_sub(into_minute)
}
