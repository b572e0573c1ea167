//! # Stellar Node
//!
//! HTTP server for the planet catalog and the constellation workflow.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod api;
pub mod auth;
pub mod config;
pub mod state;

use config::NodeConfig;
use state::AppState;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Run the node until the listener fails.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let state = AppState::from_config(&config).await?;
    let app = create_router(state);

    info!("listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health_check))
        // Accounts
        .route("/api/v1/users/register", post(api::user::register))
        .route("/api/v1/users/login", post(api::user::login))
        .route("/api/v1/users/logout", post(api::user::logout))
        // Constellations
        .route(
            "/api/v1/constellations",
            get(api::constellation::list_constellations),
        )
        .route(
            "/api/v1/constellations/:id",
            get(api::constellation::get_constellation)
                .put(api::constellation::update_constellation)
                .delete(api::constellation::delete_constellation),
        )
        .route(
            "/api/v1/constellations/:id/status",
            put(api::constellation::update_status),
        )
        .route("/api/v1/draft/submit", post(api::constellation::submit_draft))
        // Catalog
        .route(
            "/api/v1/planets",
            get(api::planet::list_planets).post(api::planet::create_planet),
        )
        .route(
            "/api/v1/planets/:id",
            get(api::planet::get_planet)
                .put(api::planet::update_planet)
                .delete(api::planet::delete_planet),
        )
        .route("/api/v1/planets/:id/image", post(api::planet::upload_image))
        .route(
            "/api/v1/planets/:id/draft",
            post(api::planet::add_to_draft).delete(api::planet::remove_from_draft),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.body_limit)),
        )
        .with_state(state)
}
