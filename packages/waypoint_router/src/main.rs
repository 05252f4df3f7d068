use axum::serve;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use waypoint_router::api::{AppState, build_router};
use waypoint_router::common::config::ServiceConfig;
use waypoint_router::loading::load_graph_store;

fn initialize_tracer() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine, the process environment is still used
    dotenv().ok();

    initialize_tracer();

    let config =
        ServiceConfig::from_env().expect("Invalid service configuration!");

    info!(source = ?config.graph_source, "loading road network");
    let store = load_graph_store(&config)
        .await
        .expect("Error loading road network!");

    let bind_addr = config.bind_addr;
    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config),
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Error binding to listen address!");
    info!(%bind_addr, "serving");
    serve(listener, router).await.expect("Error serving API!");
}
