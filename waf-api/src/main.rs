//! # WAF API
//!
//! The control-plane HTTP server for the multi-tenant Web Application
//! Firewall: CRUD over the global and per-route rule sets, the route
//! directory, error pages, administrator accounts, and the `/ingress/evaluate`
//! endpoint that drives the `waf-core` pipeline directly (in-process, not
//! over the wire — see `waf_core::pipeline::Pipeline`).
//!
//! Grounded in the teacher's `router-api/src/main.rs`: clap argument
//! parsing, `env_logger`, permissive CORS for the control UI, and an
//! actix-web `HttpServer` with a fixed worker count.

mod api;
mod auth;
mod config;
mod error_response;
mod sinks;
mod state;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;

use config::Cli;
use state::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));
    env_logger::init();

    let cli = Cli::parse();
    let bind_address = cli.bind_address();

    log::info!("opening tenant stores under {}", cli.data_dir.display());
    let state = web::Data::new(
        AppState::new(cli.data_dir.clone(), cli.event_channel_capacity, cli.default_deadline())
            .expect("failed to initialize application state"),
    );

    log::info!("starting WAF API server on {bind_address}");
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(2 * 1024 * 1024))
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(api::configure)
    })
    .bind(&bind_address)?
    .workers(4)
    .run()
    .await
}
