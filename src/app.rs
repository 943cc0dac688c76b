use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use tracing_actix_web::TracingLogger;

use crate::client::{Notifier, WeatherSource};
use crate::controller;
use crate::repo::SubscriptionStore;
use crate::service::{Dispatcher, Links, SubscriptionService};

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

/// The long-lived components shared by the HTTP server and the dispatcher
#[derive(Clone)]
pub struct Components {
    pub service: SubscriptionService,
    pub dispatcher: Dispatcher,
    pub weather: Arc<dyn WeatherSource>,
}

impl Components {
    /// Wire the lifecycle service and the dispatcher over the same collaborators
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        weather: Arc<dyn WeatherSource>,
        notifier: Arc<dyn Notifier>,
        links: Links,
    ) -> Self {
        let service = SubscriptionService::new(store.clone(), notifier.clone(), links.clone());
        let dispatcher = Dispatcher::new(store, weather.clone(), notifier, links);

        Self {
            service,
            dispatcher,
            weather,
        }
    }
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    service: SubscriptionService,
    weather: Arc<dyn WeatherSource>,
) -> anyhow::Result<Server> {
    // Wrap application data
    let service = web::Data::new(service);
    let weather: web::Data<dyn WeatherSource> = web::Data::from(weather);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(service.clone())
            .app_data(weather.clone())
            .service(health_check)
            .service(controller::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
