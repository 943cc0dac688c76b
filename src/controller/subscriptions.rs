use actix_web::{get, post, web, HttpResponse, Responder};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::service::{SubscriptionRequest, SubscriptionService};

use super::RestResult;

/// Form deserialization wrapper for new subscriptions.
/// Missing fields come through empty and fail validation downstream.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    frequency: String,
}

impl From<SubscribeForm> for SubscriptionRequest {
    fn from(form: SubscribeForm) -> Self {
        Self {
            email: form.email,
            city: form.city,
            frequency: form.frequency,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

fn message(message: &'static str) -> HttpResponse {
    HttpResponse::Ok().json(Message { message })
}

/// Create a pending subscription and send its confirmation email
#[tracing::instrument(name = "Subscribe request", skip(service, form))]
#[post("/subscribe")]
async fn subscribe(
    service: web::Data<SubscriptionService>,
    form: web::Form<SubscribeForm>,
) -> RestResult<impl Responder> {
    service.create(form.into_inner().into()).await?;

    Ok(message("Subscription successful. Confirmation email sent."))
}

/// Subscription confirmation endpoint
#[tracing::instrument(name = "Confirm request", skip(service, path))]
#[get("/confirm/{token}")]
async fn confirm(
    service: web::Data<SubscriptionService>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let (token,) = path.into_inner();

    match service.confirm(&token).await {
        Ok(()) => Ok(message("Subscription confirmed successfully")),
        Err(Error::AlreadyConfirmed) => Ok(message("Subscription already confirmed")),
        Err(e) => Err(e.into()),
    }
}

/// Unsubscribe endpoint, linked from every weather update
#[tracing::instrument(name = "Unsubscribe request", skip(service, path))]
#[get("/unsubscribe/{token}")]
async fn unsubscribe(
    service: web::Data<SubscriptionService>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let (token,) = path.into_inner();

    service.unsubscribe(&token).await?;

    Ok(message("Unsubscribed successfully"))
}

/// Subscription lifecycle endpoints
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(subscribe).service(confirm).service(unsubscribe);
}
