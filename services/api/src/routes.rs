//! API service routes

use std::time::Duration;

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{Requester, auth_middleware, rate_limit_middleware},
    models::{SuccessResponse, UserCreate, UserLogin, UserUpdate},
    validation,
};

/// Create the router for the API service
///
/// User routes are nested under `{api_prefix}/users`.
pub fn create_router(state: AppState, api_prefix: &str, request_timeout: Duration) -> Router {
    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/", get(get_all_users))
        .route(
            "/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let users_path = format!("{}/users", api_prefix.trim_end_matches('/'));

    Router::new()
        .route("/health", get(health_check))
        .nest(&users_path, public_routes.merge(protected_routes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "todo-api"
    }))
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| ApiError::Validation(format!("invalid user id: {}", e)))
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(mut data) = payload?;
    validation::validate_registration(&data).map_err(ApiError::Validation)?;

    let id = state
        .user_service
        .register(&mut data)
        .await
        .map_err(ApiError::client)?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(id))))
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(data) = payload?;
    validation::validate_login(&data).map_err(ApiError::Validation)?;

    info!("Login attempt for user: {}", data.email);

    let token = state
        .user_service
        .login(&data)
        .await
        .map_err(ApiError::client)?;

    Ok(Json(SuccessResponse::new(token)))
}

/// Get all users
pub async fn get_all_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state
        .user_service
        .get_all_users()
        .await
        .map_err(ApiError::client)?;

    Ok(Json(SuccessResponse::new(users)))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let user = state.user_service.get_user_by_id(id).await?;

    Ok(Json(SuccessResponse::new(user)))
}

/// Update the requester's own profile
pub async fn update_user(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let Json(data) = payload?;

    if requester.id != id {
        return Err(ApiError::Unauthorized(
            "unauthorized: ID does not match".to_string(),
        ));
    }

    validation::validate_update(&data).map_err(ApiError::Validation)?;

    state.user_service.update_user(id, &data).await?;

    Ok(Json(SuccessResponse::new(true)))
}

/// Delete a user by ID
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.user_service.delete_user(id).await?;

    Ok(Json(SuccessResponse::new(true)))
}
