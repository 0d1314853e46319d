use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::caller::{Caller, SubscriptionTier};

/// Header carrying the verified user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";
/// Header carrying the user's organization id.
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";
/// Header carrying the user's subscription tier.
pub const SUBSCRIPTION_TIER_HEADER: &str = "x-subscription-tier";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Builds the caller from the identity headers set by the auth gateway.
///
/// # Returns
///
/// An `Option` containing the `Caller`, `None` if any header is missing or malformed.
pub fn caller_from_headers(headers: &HeaderMap) -> Option<Caller> {
    Some(Caller {
        id: Uuid::parse_str(header(headers, USER_ID_HEADER)?).ok()?,
        display_name: header(headers, USER_NAME_HEADER)?.to_string(),
        organization_id: Uuid::parse_str(header(headers, ORGANIZATION_ID_HEADER)?).ok()?,
        subscription_tier: header(headers, SUBSCRIPTION_TIER_HEADER)?
            .parse::<SubscriptionTier>()
            .ok()?,
    })
}

/// A middleware that requires a verified caller identity.
///
/// # Arguments
///
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `StatusCode`.
pub async fn require_caller(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let caller = caller_from_headers(request.headers()).ok_or_else(|| {
        tracing::warn!("❌ Missing or malformed caller identity headers");
        StatusCode::UNAUTHORIZED
    })?;

    tracing::debug!("✅ Caller identified: {}", caller.id);

    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
