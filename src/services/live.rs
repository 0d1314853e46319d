//! Live-session coordination: entitlement checks plus the registry and
//! token issuance.

use serde::Serialize;

use crate::{
    crypto::token,
    error::{AppError, Result},
    models::{caller::Caller, live_session::{HostIdentity, LiveSession}},
    state::AppState,
    validation::live::{parse_kind, validate_session_id, validate_title},
};

/// Placeholder token returned when the provider is not configured.
pub const DEMO_TOKEN: &str = "demo-token";

/// The response to an access token request.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub session_id: String,
    pub app_id: u32,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<bool>,
}

fn require_entitlement(caller: &Caller) -> Result<()> {
    if caller.subscription_tier.includes_live_sessions() {
        Ok(())
    } else {
        tracing::debug!(
            "User {} on {:?} tier denied live sessions",
            caller.id,
            caller.subscription_tier
        );
        Err(AppError::Entitlement)
    }
}

/// Issues an access token for joining a live session.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `caller` - The authenticated caller.
/// * `session_id` - The session to join.
///
/// # Returns
///
/// A sealed token, or a demo placeholder when the provider is not configured.
pub async fn issue_access_token(
    state: &AppState,
    caller: &Caller,
    session_id: Option<&str>,
) -> Result<AccessToken> {
    require_entitlement(caller)?;
    let session_id = validate_session_id(session_id)?;

    let is_host = state
        .registry
        .lookup_host(session_id)
        .await
        .is_some_and(|host| host.user_id == caller.id);

    let Some(media) = state.config.media.as_ref() else {
        tracing::debug!("Issuing demo token for session {}", session_id);
        return Ok(AccessToken {
            token: DEMO_TOKEN.to_string(),
            user_id: caller.id.to_string(),
            user_name: caller.display_name.clone(),
            session_id: session_id.to_string(),
            app_id: 0,
            is_host,
            demo: Some(true),
        });
    };

    let lifetime = i64::try_from(state.config.token_ttl.as_secs())
        .map_err(|_| AppError::Internal("Token lifetime out of range".to_string()))?;
    let user_id = caller.id.to_string();
    let sealed = token::issue_token(media.app_id, &user_id, &media.app_secret, lifetime, "")?;

    tracing::info!("🔑 Access token issued to {} for session {}", user_id, session_id);

    Ok(AccessToken {
        token: sealed,
        user_id,
        user_name: caller.display_name.clone(),
        session_id: session_id.to_string(),
        app_id: media.app_id,
        is_host,
        demo: None,
    })
}

/// Creates a live session hosted by the caller.
pub async fn create_session(
    state: &AppState,
    caller: &Caller,
    title: Option<&str>,
    kind: Option<&str>,
) -> Result<LiveSession> {
    require_entitlement(caller)?;
    let title = validate_title(title)?;
    let kind = parse_kind(kind)?;

    let session = state
        .registry
        .create(title, kind, HostIdentity::from(caller), caller.organization_id)
        .await;

    tracing::debug!("Live sessions now tracked: {}", state.registry.len().await);
    Ok(session)
}

/// Lists the live sessions of the caller's organization.
pub async fn list_sessions(state: &AppState, caller: &Caller) -> Vec<LiveSession> {
    state.registry.list(caller.organization_id).await
}

/// Closes a session. Only its host may do so.
pub async fn close_session(state: &AppState, caller: &Caller, session_id: &str) -> Result<()> {
    state.registry.close(session_id, caller.id).await?;
    tracing::debug!("Live sessions now tracked: {}", state.registry.len().await);
    Ok(())
}
