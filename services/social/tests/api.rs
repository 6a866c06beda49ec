//! End-to-end tests for the social service router
//!
//! Requests go through the full axum stack, including JWT verification, with
//! an in-memory store behind it. Tokens are signed with the fixture key pair.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot
use uuid::Uuid;

use social::{
    AppState,
    middleware::{Claims, JwtConfig, JwtVerifier, TokenType},
    repositories::MemoryStore,
    routes,
};

const PRIVATE_KEY: &str = include_str!("fixtures/jwt_private.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/jwt_public.pem");

// ============================================================================
// Helper Functions
// ============================================================================

fn create_test_app() -> Router {
    let jwt_verifier = JwtVerifier::new(&JwtConfig {
        public_key: PUBLIC_KEY.to_string(),
    })
    .expect("fixture public key");

    routes::create_router(AppState {
        store: Arc::new(MemoryStore::new()),
        jwt_verifier,
        suggestion_limit: 10,
    })
}

fn token_for(user_id: Uuid, token_type: TokenType) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user_id,
        roles: vec!["user".to_string()],
        permissions: vec![],
        iat: now,
        exp: now + 900,
        token_type,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).expect("fixture private key"),
    )
    .expect("sign token")
}

/// Helper to send a request and get the decoded JSON response
async fn send_request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request_builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        request_builder = request_builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body_json) => request_builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body_json).unwrap()))
            .unwrap(),
        None => request_builder.body(Body::empty()).unwrap(),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };

    (status, value)
}

/// Register a user and return its id together with an access token
async fn register(app: &Router, username: &str) -> (Uuid, String) {
    let (status, body) = send_request(
        app,
        "POST",
        "/users",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "fullName": format!("{username} tester"),
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    (id, token_for(id, TokenType::Access))
}

fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("array body")
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Public Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let (status, body) = send_request(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = create_test_app();
    register(&app, "ada").await;

    let (status, body) = send_request(
        &app,
        "POST",
        "/users",
        None,
        Some(json!({
            "username": "ada",
            "email": "another@example.com",
            "fullName": "Ada Again",
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username is already taken");

    let (status, _) = send_request(
        &app,
        "POST",
        "/users",
        None,
        Some(json!({
            "username": "grace",
            "email": "grace@example.com",
            "fullName": "Grace",
            "password": "12345",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_a_valid_access_token() {
    let app = create_test_app();
    let (ada, _) = register(&app, "ada").await;

    let (status, body) = send_request(&app, "GET", "/users/suggested", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) =
        send_request(&app, "GET", "/users/suggested", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = token_for(ada, TokenType::Refresh);
    let (status, _) = send_request(&app, "GET", "/users/suggested", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Social Graph Tests
// ============================================================================

#[tokio::test]
async fn test_follow_toggle_scenario() {
    let app = create_test_app();
    let (ada, ada_token) = register(&app, "ada").await;
    let (bob, bob_token) = register(&app, "bob").await;

    let (status, body) = send_request(
        &app,
        "POST",
        &format!("/users/follow/{bob}"),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User followed successfully");

    let (_, following) = send_request(&app, "GET", "/following/ada", Some(&ada_token), None).await;
    assert_eq!(ids(&following), vec![bob.to_string()]);
    assert_eq!(following[0]["username"], "bob");
    assert!(following[0].get("fullName").is_some());
    assert!(following[0].get("profileImg").is_some());
    assert!(following[0].get("bio").is_some());

    let (_, followers) = send_request(&app, "GET", "/followers/bob", Some(&ada_token), None).await;
    assert_eq!(ids(&followers), vec![ada.to_string()]);

    let (_, notifications) =
        send_request(&app, "GET", "/notifications", Some(&bob_token), None).await;
    let notifications = notifications.as_array().unwrap().clone();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "follow");
    assert_eq!(notifications[0]["from"]["id"], ada.to_string());
    assert_eq!(notifications[0]["to"], bob.to_string());
    assert_eq!(notifications[0]["read"], false);

    let (status, body) = send_request(
        &app,
        "POST",
        &format!("/users/follow/{bob}"),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User unfollowed successfully");

    let (_, following) = send_request(&app, "GET", "/following/ada", Some(&ada_token), None).await;
    assert!(ids(&following).is_empty());
    let (_, followers) = send_request(&app, "GET", "/followers/bob", Some(&ada_token), None).await;
    assert!(ids(&followers).is_empty());

    let (status, body) =
        send_request(&app, "DELETE", "/notifications", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (_, notifications) =
        send_request(&app, "GET", "/notifications", Some(&bob_token), None).await;
    assert_eq!(notifications, json!([]));
}

#[tokio::test]
async fn test_follow_rejections() {
    let app = create_test_app();
    let (ada, ada_token) = register(&app, "ada").await;

    let (status, body) = send_request(
        &app,
        "POST",
        &format!("/users/follow/{ada}"),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You can't follow/unfollow yourself");

    let (status, body) = send_request(
        &app,
        "POST",
        &format!("/users/follow/{}", Uuid::new_v4()),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User not found");

    let (status, _) =
        send_request(&app, "POST", "/users/follow/not-a-uuid", Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_username_is_404() {
    let app = create_test_app();
    let (_, token) = register(&app, "ada").await;

    for path in ["/followers/nobody", "/following/nobody", "/users/profile/nobody"] {
        let (status, body) = send_request(&app, "GET", path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["error"], "User not found");
    }
}

#[tokio::test]
async fn test_search_matches_one_username() {
    let app = create_test_app();
    let (_, token) = register(&app, "ada_lovelace").await;
    let (grace, _) = register(&app, "GraceHopper").await;

    let (status, body) = send_request(&app, "GET", "/search/hopp", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![grace.to_string()]);
}

#[tokio::test]
async fn test_profile_never_exposes_password() {
    let app = create_test_app();
    let (ada, ada_token) = register(&app, "ada").await;
    let (bob, _) = register(&app, "bob").await;
    send_request(
        &app,
        "POST",
        &format!("/users/follow/{bob}"),
        Some(&ada_token),
        None,
    )
    .await;

    let (status, body) = send_request(&app, "GET", "/users/profile/ada", Some(&ada_token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], ada.to_string());
    assert_eq!(body["following"], json!([bob.to_string()]));
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

// ============================================================================
// Suggestion Tests
// ============================================================================

#[tokio::test]
async fn test_suggestions_exclude_self_and_followed() {
    let app = create_test_app();
    let (me, token) = register(&app, "mia").await;
    let (friend, _) = register(&app, "friend").await;
    for i in 0..12 {
        register(&app, &format!("user{i}")).await;
    }
    send_request(
        &app,
        "POST",
        &format!("/users/follow/{friend}"),
        Some(&token),
        None,
    )
    .await;

    let (status, body) = send_request(&app, "GET", "/users/suggested", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let suggested = ids(&body);
    assert_eq!(suggested.len(), 10);
    assert!(!suggested.contains(&me.to_string()));
    assert!(!suggested.contains(&friend.to_string()));
}

// ============================================================================
// Profile Update Tests
// ============================================================================

#[tokio::test]
async fn test_update_profile() {
    let app = create_test_app();
    let (_, token) = register(&app, "ada").await;

    let (status, body) = send_request(
        &app,
        "PATCH",
        "/users/update",
        Some(&token),
        Some(json!({ "newPassword": "secret2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Please provide both current password and new password"
    );

    let (status, body) = send_request(
        &app,
        "PATCH",
        "/users/update",
        Some(&token),
        Some(json!({ "currentPassword": "nope-nope", "newPassword": "secret2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, body) = send_request(
        &app,
        "PATCH",
        "/users/update",
        Some(&token),
        Some(json!({
            "currentPassword": "secret1",
            "newPassword": "secret2",
            "bio": "first programmer",
            "coverImg": "https://img.example.com/cover.png",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "first programmer");
    assert_eq!(body["coverImg"], "https://img.example.com/cover.png");
    assert!(body.get("password").is_none());
}

// ============================================================================
// Notification Tests
// ============================================================================

#[tokio::test]
async fn test_delete_single_notification() {
    let app = create_test_app();
    let (_, ada_token) = register(&app, "ada").await;
    let (bob, bob_token) = register(&app, "bob").await;
    send_request(
        &app,
        "POST",
        &format!("/users/follow/{bob}"),
        Some(&ada_token),
        None,
    )
    .await;

    let (_, notifications) =
        send_request(&app, "GET", "/notifications", Some(&bob_token), None).await;
    let id = notifications[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send_request(
        &app,
        "DELETE",
        &format!("/notifications/{id}"),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_request(
        &app,
        "DELETE",
        &format!("/notifications/{id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, notifications) =
        send_request(&app, "GET", "/notifications", Some(&bob_token), None).await;
    assert_eq!(notifications, json!([]));
}
