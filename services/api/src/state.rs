//! Application state shared across handlers

use std::sync::Arc;

use crate::{jwt::JwtService, rate_limiter::RateLimiter, services::UserService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
}
