use actix_web::dev::HttpServiceFactory;
use actix_web::web;

mod error;
pub mod subscriptions;
pub mod weather;

pub use error::{RestError, RestResult};

/// All API endpoints, mounted under `/api`
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api")
        .configure(subscriptions::routes)
        .configure(weather::routes)
}
