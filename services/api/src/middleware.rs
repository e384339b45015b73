//! Authentication and rate limiting middleware

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Identity of the authenticated caller, injected into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
}

/// Authentication middleware
///
/// Validates the bearer token and stores the [`Requester`] for handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(authorization) =
        bearer.ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let claims = state
        .jwt_service
        .validate_token(authorization.token())
        .map_err(|e| {
            error!("Failed to validate token: {}", e);
            ApiError::Unauthorized("invalid or expired token".to_string())
        })?;

    req.extensions_mut().insert(Requester { id: claims.sub });

    Ok(next.run(req).await)
}

/// Rate limiting middleware keyed by client address
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.is_allowed(&key).await {
        warn!("Rate limit exceeded for {}", key);
        return Err(ApiError::TooManyRequests);
    }

    Ok(next.run(req).await)
}
