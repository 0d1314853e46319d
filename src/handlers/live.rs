use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::{caller::Caller, live_session::LiveSession},
    services::live as live_service,
    state::AppState,
};

/// The request payload for issuing an access token.
#[derive(Deserialize, Debug, Default)]
pub struct TokenRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The request payload for creating a live session.
#[derive(Deserialize, Debug, Default)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// The response payload for listing live sessions.
#[derive(Serialize)]
pub struct SessionList {
    pub count: usize,
    pub sessions: Vec<LiveSession>,
}

/// Parses a JSON request body. A missing or malformed body yields the
/// empty request, so entitlement is checked before field validation.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    if body.is_empty() {
        return T::default();
    }
    sonic_rs::from_slice::<Option<T>>(body)
        .unwrap_or_else(|e| {
            tracing::debug!("Ignoring malformed request body: {}", e);
            None
        })
        .unwrap_or_default()
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Result<Response> {
    let body = sonic_rs::to_string(body)
        .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;
    Ok((status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Issues an access token for a live session.
#[axum::debug_handler]
pub async fn issue_token(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> Result<Response> {
    let req: TokenRequest = parse_body(&body);
    let token =
        live_service::issue_access_token(&state, &caller, req.session_id.as_deref()).await?;
    json_response(StatusCode::OK, &token)
}

/// Creates a new live session.
#[axum::debug_handler]
pub async fn create_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> Result<Response> {
    let req: CreateSessionRequest = parse_body(&body);
    let session = live_service::create_session(
        &state,
        &caller,
        req.title.as_deref(),
        req.kind.as_deref(),
    )
    .await?;

    json_response(StatusCode::CREATED, &session)
}

/// Lists the live sessions of the caller's organization.
#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Response> {
    let sessions = live_service::list_sessions(&state, &caller).await;

    json_response(
        StatusCode::OK,
        &SessionList {
            count: sessions.len(),
            sessions,
        },
    )
}

/// Closes a live session.
#[axum::debug_handler]
pub async fn close_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    live_service::close_session(&state, &caller, &session_id).await?;
    Ok((
        StatusCode::OK,
        [(http::header::CONTENT_TYPE, "application/json")],
        r#"{"message":"Session closed"}"#,
    )
        .into_response())
}
