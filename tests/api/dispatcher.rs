use chrono::{TimeZone, Utc};

use claims::assert_matches;

use reqwest::StatusCode;

use weather_subscriptions::service::{TickOutcome, TickReport};

use crate::helpers::{extract_link, token_of, SubscribeForm, TestApp};

#[tokio::test]
async fn daily_subscriber_gets_updates_until_unsubscribed() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.serve_weather("Kyiv", "Sunny").await;

    let confirmation_link = app
        .subscribe_and_get_confirmation_link(&SubscribeForm::new("test@test.com", "Kyiv", "daily"))
        .await;
    let res = app.confirm(token_of(&confirmation_link)).await.unwrap();
    assert_eq!(StatusCode::OK, res.status());

    // Not on the daily boundary
    let outcome = app
        .dispatcher
        .run_tick_at(Utc.with_ymd_and_hms(2025, 5, 17, 9, 0, 0).unwrap())
        .await;
    assert_matches!(outcome, TickOutcome::Completed(TickReport { due: 0, .. }));

    let outcome = app
        .dispatcher
        .run_tick_at(Utc.with_ymd_and_hms(2025, 5, 18, 8, 0, 0).unwrap())
        .await;
    assert_eq!(
        TickOutcome::Completed(TickReport {
            checked: 1,
            due: 1,
            sent: 1,
            failed: 0
        }),
        outcome
    );

    let bodies = app.sent_email_bodies().await;
    assert_eq!(2, bodies.len());
    let update = &bodies[1];
    assert!(update.contains("Current weather in Kyiv: Sunny, 21.0°C, humidity 40%."));
    let unsubscribe_link = extract_link(update);
    assert!(unsubscribe_link.contains("/api/unsubscribe/"));

    let res = app
        .client
        .get(&unsubscribe_link)
        .send()
        .await
        .expect("Failed to follow unsubscribe link");
    assert_eq!(StatusCode::OK, res.status());

    let outcome = app
        .dispatcher
        .run_tick_at(Utc.with_ymd_and_hms(2025, 5, 19, 8, 0, 0).unwrap())
        .await;
    assert_matches!(outcome, TickOutcome::Completed(TickReport { checked: 0, .. }));
    assert_eq!(2, app.sent_email_bodies().await.len());
}

#[tokio::test]
async fn pending_subscriptions_are_not_notified() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.serve_weather("Kyiv", "Sunny").await;

    app.subscribe_and_get_confirmation_link(&SubscribeForm::new("test@test.com", "Kyiv", "hourly"))
        .await;

    let outcome = app
        .dispatcher
        .run_tick_at(Utc.with_ymd_and_hms(2025, 5, 17, 13, 0, 0).unwrap())
        .await;

    assert_matches!(outcome, TickOutcome::Completed(TickReport { checked: 0, .. }));
    assert_eq!(1, app.sent_email_bodies().await.len());
}

#[tokio::test]
async fn provider_outage_for_one_city_spares_the_others() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    // Only Lviv is served; Kyiv falls through to a 404 from the mock server
    app.serve_weather("Lviv", "Cloudy").await;

    for (email, city) in [("a@test.com", "Kyiv"), ("b@test.com", "Lviv")] {
        let link = app
            .subscribe_and_get_confirmation_link(&SubscribeForm::new(email, city, "hourly"))
            .await;
        app.confirm(token_of(&link)).await.unwrap();
    }

    let outcome = app
        .dispatcher
        .run_tick_at(Utc.with_ymd_and_hms(2025, 5, 17, 13, 0, 0).unwrap())
        .await;

    assert_eq!(
        TickOutcome::Completed(TickReport {
            checked: 2,
            due: 2,
            sent: 1,
            failed: 1
        }),
        outcome
    );
    let bodies = app.sent_email_bodies().await;
    assert!(bodies[2].contains("Current weather in Lviv"));
}
