use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod config;
pub mod error;
pub mod state;
pub mod crypto {
    pub mod token;
}

pub mod models {
    pub mod caller;
    pub mod live_session;
}

pub mod repositories {
    pub mod live_session;
}

pub mod services {
    pub mod live;
}

pub mod handlers {
    pub mod live;
}

pub mod middleware_layer {
    pub mod identity;
}

pub mod validation {
    pub mod live;
}

use state::AppState;

/// Builds the live-session API router. Every route requires a caller identity.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/live/token", post(handlers::live::issue_token))
        .route(
            "/api/live/sessions",
            get(handlers::live::list_sessions).post(handlers::live::create_session),
        )
        .route(
            "/api/live/sessions/{session_id}",
            delete(handlers::live::close_session),
        )
        .route_layer(from_fn(middleware_layer::identity::require_caller))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
}
