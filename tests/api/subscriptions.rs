use reqwest::StatusCode;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{extract_link, token_of, SubscribeForm, TestApp};

#[tokio::test]
async fn subscribe_returns_success_for_valid_request() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;

    let res = app
        .subscribe(&SubscribeForm::new("test@test.com", "Kyiv", "daily"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].is_string());

    let stored = app.stored("test@test.com", "Kyiv").await;
    assert!(!stored.is_confirmed);
    assert_eq!("daily", stored.frequency);
}

#[tokio::test]
async fn subscribe_returns_bad_request_for_invalid_data() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;

    let test_cases = vec![
        (
            "missing email",
            SubscribeForm {
                email: None,
                city: Some("Kyiv".into()),
                frequency: Some("daily".into()),
            },
        ),
        (
            "missing city",
            SubscribeForm {
                email: Some("test@test.com".into()),
                city: None,
                frequency: Some("daily".into()),
            },
        ),
        (
            "missing frequency",
            SubscribeForm {
                email: Some("test@test.com".into()),
                city: Some("Kyiv".into()),
                frequency: None,
            },
        ),
        (
            "malformed email",
            SubscribeForm::new("bad email address", "Kyiv", "daily"),
        ),
        ("unknown frequency", SubscribeForm::new("test@test.com", "Kyiv", "weekly")),
    ];

    for (desc, form) in test_cases {
        let res = app.subscribe(&form).await.expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload was {}",
            desc
        );
        let body: serde_json::Value = res.json().await.unwrap();
        assert!(body["error"].is_string(), "No error body for {}", desc);
    }

    assert!(app.store.is_empty().await);
    assert!(app.sent_email_bodies().await.is_empty());
}

#[tokio::test]
async fn subscribe_sends_a_confirmation_email_with_link() {
    let app = TestApp::spawn().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        // Expect a send-email request
        .expect(1)
        .mount(&app.email_server)
        .await;

    let _res = app
        .subscribe(&SubscribeForm::new("test@test.com", "Kyiv", "hourly"))
        .await
        .expect("Failed to execute request");

    let email_request = &app.email_server.received_requests().await.unwrap()[0];

    let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
    let html_link = extract_link(body["HtmlBody"].as_str().unwrap());
    let text_link = extract_link(body["TextBody"].as_str().unwrap());

    assert_eq!(html_link, text_link);
    assert!(text_link.contains("/api/confirm/"));
}

#[tokio::test]
async fn subscribe_twice_for_same_city_conflicts() {
    let app = TestApp::spawn().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        // No resend for the duplicate
        .expect(1)
        .mount(&app.email_server)
        .await;

    let form = SubscribeForm::new("test@test.com", "Kyiv", "daily");
    let first = app.subscribe(&form).await.expect("Failed to execute request");
    let second = app.subscribe(&form).await.expect("Failed to execute request");
    let other_city = app
        .subscribe(&SubscribeForm::new("test@test.com", "Lviv", "daily"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, first.status());
    assert_eq!(StatusCode::CONFLICT, second.status());
    assert_eq!(StatusCode::OK, other_city.status());
    assert_eq!(2, app.store.len().await);
}

#[tokio::test]
async fn subscribe_succeeds_if_email_send_fails() {
    let app = TestApp::spawn().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        // Ensure that send-email fails
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let res = app
        .subscribe(&SubscribeForm::new("test@test.com", "Kyiv", "daily"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(1, app.store.len().await);
}

#[tokio::test]
async fn subscription_can_be_confirmed_once() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;

    let link = app
        .subscribe_and_get_confirmation_link(&SubscribeForm::new("test@test.com", "Kyiv", "daily"))
        .await;

    let res = app
        .client
        .get(&link)
        .send()
        .await
        .expect("Failed to follow confirmation link");
    assert_eq!(StatusCode::OK, res.status());
    let first: serde_json::Value = res.json().await.unwrap();

    let stored = app.stored("test@test.com", "Kyiv").await;
    assert!(stored.is_confirmed);
    assert!(stored.confirmation_token.is_none());

    let res = app
        .confirm(token_of(&link))
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());
    let second: serde_json::Value = res.json().await.unwrap();

    assert_ne!(first["message"], second["message"]);
}

#[tokio::test]
async fn confirm_rejects_malformed_and_unknown_tokens() {
    let app = TestApp::spawn().await;

    let malformed = app.confirm("not-a-token").await.unwrap();
    let unknown = app
        .confirm("67e55044-10b1-426f-9247-bb680e5fe0c8")
        .await
        .unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, malformed.status());
    assert_eq!(StatusCode::NOT_FOUND, unknown.status());
}

#[tokio::test]
async fn unsubscribe_removes_subscription() {
    let app = TestApp::spawn().await;
    app.accept_emails().await;

    app.subscribe_and_get_confirmation_link(&SubscribeForm::new("test@test.com", "Kyiv", "daily"))
        .await;
    let stored = app.stored("test@test.com", "Kyiv").await;
    let token = stored.unsubscribe_token.to_string();

    let first = app.unsubscribe(&token).await.unwrap();
    let second = app.unsubscribe(&token).await.unwrap();
    let malformed = app.unsubscribe("nope").await.unwrap();

    assert_eq!(StatusCode::OK, first.status());
    assert_eq!(StatusCode::NOT_FOUND, second.status());
    assert_eq!(StatusCode::BAD_REQUEST, malformed.status());
    assert!(app.store.is_empty().await);
}
