use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Context;

use sqlx::postgres::PgPoolOptions;

use tokio::sync::watch;

use weather_subscriptions::app::{self, Components};
use weather_subscriptions::client::{EmailClient, WeatherApiClient};
use weather_subscriptions::repo::PgSubscriptionRepo;
use weather_subscriptions::service::Links;
use weather_subscriptions::settings::Settings;
use weather_subscriptions::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    let subscriber = telemetry::create_subscriber(settings.app.log_filter(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(settings.database.with_db());
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let email_client = EmailClient::new(
        settings.email.sender()?,
        settings.email.api_timeout(),
        settings.email.api_base_url()?,
        settings.email.api_auth_token(),
    )?;
    let weather_client = WeatherApiClient::new(
        settings.weather.api_timeout(),
        settings.weather.api_base_url()?,
        settings.weather.api_key(),
    )?;
    let tick_interval = settings.scheduler.tick_interval()?;

    let components = Components::new(
        Arc::new(PgSubscriptionRepo::new(pool)),
        Arc::new(weather_client),
        Arc::new(email_client),
        Links::new(&settings.app.base_url()?),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = tokio::spawn(
        components
            .dispatcher
            .clone()
            .run_until_stopped(tick_interval, shutdown_rx),
    );

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!(addr = ?listener.local_addr()?, "Listening");

    let result = app::run(listener, components.service, components.weather)?
        .await
        .context("Failed to run app");

    // The server has stopped; let the dispatcher wind down
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Dispatcher already stopped before shutdown was signalled");
    }
    dispatcher.await.context("Dispatcher task panicked")?;

    result
}
