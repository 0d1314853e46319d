use crate::config::Config;
use crate::repositories::live_session::SessionRegistry;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The registry of live sessions.
    pub registry: SessionRegistry,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn new(config: &Config) -> Self {
        let registry = SessionRegistry::new(config.session_retention);
        tracing::info!(
            "✅ Session registry initialized (retention {}s)",
            config.session_retention.as_secs()
        );

        if config.media.is_none() {
            tracing::warn!("⚠️  Live session provider not configured, tokens run in demo mode");
        }

        AppState {
            config: config.clone(),
            registry,
        }
    }
}
