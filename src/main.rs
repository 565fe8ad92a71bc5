use std::{sync::Arc, time::Duration};

use axum::{http::Method, routing::get};
use axum_prometheus::PrometheusMetricLayer;
use config::Config;
use cqrs::ProcessMpesaCallbackCommandHandler;
use dotenv::dotenv;
use repositories::{
    FirestoreCartRepository, FirestoreInitializationInfo, SupabaseCheckoutSessionRepository,
    SupabaseInitializationInfo, SupabaseOrderRepository,
};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod config;
mod domain;
mod repositories;
mod dtos;
mod cqrs;
mod state;
mod routes;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::from_env().unwrap();

    tracing_subscriber::
    fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .with_ansi(false)
    .json()
    .with_file(true)
    .with_line_number(true)
    .with_current_span(true)
    .init();

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .unwrap();

    let firestore_info = FirestoreInitializationInfo {
        documents_url: config.firestore_url.clone(),
    };
    let supabase_info = SupabaseInitializationInfo {
        base_url: config.supabase_url.clone(),
        service_key: config.supabase_service_key.clone(),
    };

    let cart_repository = Arc::new(FirestoreCartRepository::new(http.clone(), &firestore_info));
    let order_repository = Arc::new(SupabaseOrderRepository::new(http.clone(), &supabase_info));
    let session_repository = Arc::new(SupabaseCheckoutSessionRepository::new(http, &supabase_info));

    let process_callback_handler = Arc::new(ProcessMpesaCallbackCommandHandler::new(
        order_repository,
        cart_repository,
        session_repository,
        config.always_ack_provider,
    ));

    let state = Arc::new(AppState {
        process_callback_handler: process_callback_handler,
    });

    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await.unwrap();

    axum::serve(listener, routes::app(state)

        .route("/metrics", get(|| async move {metrics_handle.render()}))

        .layer(prometheus_layer)
        .layer(
            ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::very_permissive().allow_methods([Method::GET, Method::POST]))
        )).await.unwrap();
}
