//! Router tests that stop before any database or Redis round-trip

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use catalog_server::{
    api, clock::FixedClock, config::AppConfig, models::user::UserClaims,
    services::redis::RedisService, AppState,
};

const INSTANCE_ID: &str = "4f1c6a3e-8a8c-4d2b-9b7e-0c8f2a1d5e60";

fn app() -> (Router, String) {
    let config = AppConfig::default();
    let secret = config.auth.jwt_secret.clone();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    let redis = RedisService::new(&config.redis.url).expect("redis client");
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let state = AppState::new(config, pool, redis, Arc::new(FixedClock(today)));
    (api::router(state), secret)
}

fn token(secret: &str, librarian: bool) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "reader".to_string(),
        user_id: 7,
        can_mark_return: librarian,
        exp: now + 3600,
        iat: now,
    }
    .create_token(secret)
    .unwrap()
}

fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app();

    let response = app.oneshot(get("/api/v1/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_renew_requires_authentication() {
    let (app, _) = app();
    let uri = format!("/api/v1/book-instances/{}/renew", INSTANCE_ID);

    let response = app
        .oneshot(json_request(Method::POST, &uri, None, json!({ "renewal_date": "2024-01-15" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_renew_requires_librarian_permission() {
    let (app, secret) = app();
    let reader = token(&secret, false);
    let uri = format!("/api/v1/book-instances/{}/renew", INSTANCE_ID);

    let response = app
        .oneshot(json_request(
            Method::POST,
            &uri,
            Some(&reader),
            json!({ "renewal_date": "2024-01-15" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Librarian permission required");
}

#[tokio::test]
async fn test_renewal_form_requires_librarian_permission() {
    let (app, secret) = app();
    let reader = token(&secret, false);
    let uri = format!("/api/v1/book-instances/{}/renew", INSTANCE_ID);

    let response = app.oneshot(get(&uri, Some(&reader))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_renew_without_date_is_rejected() {
    let (app, secret) = app();
    let librarian = token(&secret, true);
    let uri = format!("/api/v1/book-instances/{}/renew", INSTANCE_ID);

    let response = app
        .oneshot(json_request(
            Method::POST,
            &uri,
            Some(&librarian),
            json!({ "renewal_date": "not a date" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_all_borrowed_requires_librarian_permission() {
    let (app, secret) = app();
    let reader = token(&secret, false);

    let response = app.oneshot(get("/api/v1/borrowed", Some(&reader))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_my_borrowed_requires_authentication() {
    let (app, _) = app();

    let response = app.oneshot(get("/api/v1/borrowed/mine", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lend_requires_librarian_permission() {
    let (app, secret) = app();
    let reader = token(&secret, false);
    let uri = format!("/api/v1/book-instances/{}/lend", INSTANCE_ID);

    let response = app
        .oneshot(json_request(Method::POST, &uri, Some(&reader), json!({ "borrower_id": 7 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_token_is_rejected_on_public_page() {
    let (app, _) = app();

    let response = app
        .oneshot(get("/api/v1/index", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({
                "username": "newreader",
                "email": "newreader@example.org",
                "password1": "correct horse",
                "password2": "battery staple"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "password2: The two password fields didn't match");
}

#[tokio::test]
async fn test_register_validates_fields() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({
                "username": "nr",
                "email": "not-an-email",
                "password1": "short",
                "password2": "short"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("email: Invalid email format"));
    assert!(message.contains("password1: Password must be at least 8 characters"));
    assert!(message.contains("username: Username must be 3-150 characters"));
}

#[tokio::test]
async fn test_create_book_validates_isbn_length() {
    let (app, secret) = app();
    let librarian = token(&secret, true);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/books",
            Some(&librarian),
            json!({ "title": "Mort", "isbn": "12345" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = app();

    let response = app
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/book-instances/{id}/renew"]["post"].is_object());
}

#[tokio::test]
async fn test_huge_page_number_is_rejected() {
    for uri in [
        "/api/v1/books?page=9223372036854775807",
        "/api/v1/authors?page=9223372036854775807",
    ] {
        let (app, _) = app();

        let response = app.oneshot(get(uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["error"], "BadValue");
    }
}

#[tokio::test]
async fn test_borrowed_huge_page_number_is_rejected() {
    let (app, secret) = app();
    let reader = token(&secret, false);

    let response = app
        .oneshot(get("/api/v1/borrowed/mine?page=9223372036854775807", Some(&reader)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_checks_trimmed_username() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({
                "username": "  ab  ",
                "email": "reader@example.org",
                "password1": "correct horse",
                "password2": "correct horse"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "username: Username must be 3-150 characters");
}
