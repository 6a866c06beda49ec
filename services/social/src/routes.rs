//! Social service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use common::error::DatabaseResult;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    graph,
    middleware::{AuthUser, auth_middleware},
    models::{ClearNotificationsResponse, MessageResponse, RegisterRequest, UpdateUserRequest},
    notifications, profile,
    repositories::FollowOutcome,
    suggestions,
};

/// Create the router for the social service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/followers/:username", get(get_followers))
        .route("/following/:username", get(get_following))
        .route("/search/:query", get(search_users))
        .route("/users/profile/:username", get(get_user_profile))
        .route("/users/follow/:id", post(follow_unfollow_user))
        .route("/users/suggested", get(get_suggested_users))
        .route("/users/update", patch(update_user))
        .route(
            "/notifications",
            get(get_notifications).delete(delete_notifications),
        )
        .route("/notifications/:id", delete(delete_notification))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(register_user))
        .merge(protected_routes)
        .with_state(state)
}

fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {} id", what)))
}

fn store_reachable(result: DatabaseResult<bool>) -> bool {
    result.unwrap_or_else(|e| {
        error!("Store health check failed: {}", e);
        false
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = store_reachable(state.store.health_check().await);
    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if store_ok { "ok" } else { "degraded" },
            "service": "social-service",
            "store": store_ok,
        })),
    )
}

/// Register a new account
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = profile::register(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Followers of a user
pub async fn get_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let users = graph::get_followers(state.store.as_ref(), &username).await?;
    Ok(Json(users))
}

/// Users a user follows
pub async fn get_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let users = graph::get_following(state.store.as_ref(), &username).await?;
    Ok(Json(users))
}

/// Search users by username
pub async fn search_users(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let users = graph::search_users(state.store.as_ref(), &query).await?;
    Ok(Json(users))
}

/// Public profile of a user
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = profile::get_profile(state.store.as_ref(), &username).await?;
    Ok(Json(user))
}

/// Follow or unfollow a user
pub async fn follow_unfollow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target_id = parse_id(&id, "user")?;

    // A missing party is a client error on this endpoint
    let outcome = graph::follow_unfollow(state.store.as_ref(), user.id, target_id)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(msg) => ApiError::BadRequest(msg),
            other => other,
        })?;

    let message = match outcome {
        FollowOutcome::Followed => "User followed successfully",
        FollowOutcome::Unfollowed => "User unfollowed successfully",
    };
    Ok(Json(MessageResponse::new(message)))
}

/// Users the caller might want to follow
pub async fn get_suggested_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let users =
        suggestions::suggested_users(state.store.as_ref(), user.id, state.suggestion_limit)
            .await?;
    Ok(Json(users))
}

/// Update the caller's profile
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = profile::update_user(state.store.as_ref(), user.id, payload).await?;
    Ok(Json(updated))
}

/// Notifications addressed to the caller
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let items = notifications::list(state.store.as_ref(), user.id).await?;
    Ok(Json(items))
}

/// Delete all of the caller's notifications
pub async fn delete_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let deleted = notifications::clear(state.store.as_ref(), user.id).await?;
    Ok(Json(ClearNotificationsResponse {
        message: "Notifications deleted successfully".to_string(),
        deleted,
    }))
}

/// Delete one of the caller's notifications
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let notification_id = parse_id(&id, "notification")?;
    notifications::delete_one(state.store.as_ref(), user.id, notification_id).await?;
    Ok(Json(MessageResponse::new("Notification deleted successfully")))
}
