//! Backend of a kos (boarding-house) rental marketplace.
//!
//!
//!
//! # General Infrastructure
//! - Single axum server in front of one SQLite database
//! - Authentication happens upstream, the gateway forwards the user id in `X-User-Id`
//! - Two roles: **owner** lists kos and decides bookings, **society** books, reviews and likes
//! - Images are stored elsewhere, we only keep their paths
//!
//!
//!
//! # Booking Flow
//! - Society member requests a stay, booking starts as `pending`
//! - Owner accepts or rejects it
//! - Accepting takes a room off `available_rooms` and marks every day of the stay
//!   in the calendar, refusing if the kos or any of those days is full
//! - Rejecting an accepted booking hands the room and the days back
//! - Pending bookings can be cancelled by whoever made them
//!
//! See the `rooms` crate for the rules, [`database::bookings`] for how they are applied.
//!
//!
//!
//! # Notes
//!
//! ## Counter and calendar
//! `available_rooms` answers "can anyone still move in", the calendar answers
//! "which days are taken". Keeping both costs one extra write per stay day on
//! acceptance, and lets the listing page filter on a plain column.
//!
//! If they ever disagree with the accepted bookings (manual SQL, restored backups),
//! `process reconcile` rebuilds both.
//!
//!
//!
//! # Setup
//!
//! Run the server.
//! ```sh
//! RUST_LOG=info KOS_DATABASE_PATH=kos.db cargo run -p kos
//! ```
//!
//! Seed fixtures.
//! ```sh
//! cargo run -p process -- seed fixtures.json
//! ```
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{delete, get, post, put},
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod search;
pub mod state;
pub mod utils;

use config::Config;
use routes::{bookings, dashboard, health_handler, kos, reviews, users};
use state::State;
use utils::USER_HEADER;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config)?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = build_router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_HEADER)])
        .max_age(state.config.cors_max_age);

    Router::new()
        .route("/health", get(health_handler))
        .route("/users", post(users::register_handler))
        .route("/users/me", get(users::me_handler))
        .route("/kos", get(kos::search_handler).post(kos::create_handler))
        .route(
            "/kos/{id}",
            get(kos::detail_handler)
                .put(kos::update_handler)
                .delete(kos::delete_handler),
        )
        .route("/kos/{id}/facilities", post(kos::add_facility_handler))
        .route(
            "/kos/{id}/facilities/{facility_id}",
            put(kos::rename_facility_handler).delete(kos::remove_facility_handler),
        )
        .route("/kos/{id}/images", post(kos::add_image_handler))
        .route(
            "/kos/{id}/images/{image_id}",
            delete(kos::remove_image_handler),
        )
        .route(
            "/kos/{id}/reviews",
            get(reviews::list_handler).post(reviews::create_handler),
        )
        .route("/kos/{id}/like", post(kos::like_handler))
        .route("/kos/{id}/calendar", get(kos::calendar_handler))
        .route("/likes", get(kos::likes_handler))
        .route("/reviews/{id}/reply", put(reviews::reply_handler))
        .route("/reviews/{id}", delete(reviews::delete_handler))
        .route(
            "/bookings",
            get(bookings::list_handler).post(bookings::create_handler),
        )
        .route(
            "/bookings/{id}",
            get(bookings::get_handler).delete(bookings::cancel_handler),
        )
        .route("/bookings/{id}/status", put(bookings::status_handler))
        .route("/dashboard", get(dashboard::dashboard_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
