use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::Serialize;

use secrecy::Secret;

use url::Url;

use crate::domain::EmailAddress;

const POSTMARK_TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Delivers subscription emails
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(
        &self,
        recipient: &EmailAddress,
        city: &str,
        confirmation_link: &str,
    ) -> anyhow::Result<()>;

    async fn send_weather_update(
        &self,
        recipient: &EmailAddress,
        city: &str,
        summary: &str,
        unsubscribe_link: &str,
    ) -> anyhow::Result<()>;
}

/// Email message contents
#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl Email {
    pub fn confirmation(city: &str, confirmation_link: &str) -> Self {
        Self {
            subject: format!("Confirm your weather subscription for {}", city),
            html_body: format!(
                "<h1>Almost there!</h1>\
                <p>You asked for weather updates for {}.<br />\
                Click <a href=\"{}\">here</a> to confirm your subscription.</p>",
                city, confirmation_link
            ),
            text_body: format!(
                "You asked for weather updates for {}.\n\nTo confirm your subscription, visit this web page: {}",
                city, confirmation_link
            ),
        }
    }

    pub fn weather_update(city: &str, summary: &str, unsubscribe_link: &str) -> Self {
        Self {
            subject: format!("Your weather update for {}", city),
            html_body: format!(
                "<p>{}</p><p><small>No longer interested? \
                <a href=\"{}\">Unsubscribe</a>.</small></p>",
                summary, unsubscribe_link
            ),
            text_body: format!(
                "{}\n\nNo longer interested? Unsubscribe here: {}",
                summary, unsubscribe_link
            ),
        }
    }
}

#[derive(Debug)]
pub struct EmailClient {
    client: Client,
    sender: EmailAddress,

    api_send_email_url: Url,
    api_auth_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        sender: EmailAddress,
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_send_email_url = api_base_url
            .join("email")
            .context("Failed to create send email endpoint URL")?;

        Ok(Self {
            client,
            sender,
            api_send_email_url,
            api_auth_token,
        })
    }

    #[tracing::instrument(name = "Send email", skip(self, email), fields(subject = %email.subject))]
    pub async fn send(
        &self,
        recipient: &EmailAddress,
        email: &Email,
    ) -> Result<(), reqwest::Error> {
        use secrecy::ExposeSecret;

        let body = SendEmailRequest {
            to: recipient.as_ref(),
            from: self.sender.as_ref(),
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: &email.text_body,
        };

        self.client
            .post(self.api_send_email_url.clone())
            .header(POSTMARK_TOKEN_HEADER, self.api_auth_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for EmailClient {
    async fn send_confirmation(
        &self,
        recipient: &EmailAddress,
        city: &str,
        confirmation_link: &str,
    ) -> anyhow::Result<()> {
        let email = Email::confirmation(city, confirmation_link);
        self.send(recipient, &email)
            .await
            .context("Failed to send confirmation email")
    }

    async fn send_weather_update(
        &self,
        recipient: &EmailAddress,
        city: &str,
        summary: &str,
        unsubscribe_link: &str,
    ) -> anyhow::Result<()> {
        let email = Email::weather_update(city, summary, unsubscribe_link);
        self.send(recipient, &email)
            .await
            .context("Failed to send weather update email")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}
