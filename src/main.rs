use anyhow::Context;
use http::{HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huddle::config::Config;
use huddle::middleware_layer::identity::{
    ORGANIZATION_ID_HEADER, SUBSCRIPTION_TIER_HEADER, USER_ID_HEADER, USER_NAME_HEADER,
};
use huddle::state::AppState;

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("⚠️  Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(USER_ID_HEADER),
            header::HeaderName::from_static(USER_NAME_HEADER),
            header::HeaderName::from_static(ORGANIZATION_ID_HEADER),
            header::HeaderName::from_static(SUBSCRIPTION_TIER_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(100)
            .use_headers()
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let app = huddle::router(state)
        .layer(tower_governor::GovernorLayer::new(governor_conf))
        .layer(cors_layer(&config));

    let addr = config.bind_addr;
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
