use actix_web::{get, web, HttpResponse, Responder};

use serde::Deserialize;

use crate::client::WeatherSource;
use crate::service::current_weather;

use super::RestResult;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    city: String,
}

/// Current weather for a city
#[tracing::instrument(name = "Weather request", skip(source))]
#[get("/weather")]
async fn weather(
    source: web::Data<dyn WeatherSource>,
    query: web::Query<WeatherQuery>,
) -> RestResult<impl Responder> {
    let weather = current_weather(source.get_ref(), &query.city).await?;

    Ok(HttpResponse::Ok().json(weather))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(weather);
}
