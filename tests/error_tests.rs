// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Error-to-response mapping tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use ecoquest::error::AppError;

async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn session_unauthorized_is_401_with_fixed_message() {
    let (status, body) = response_parts(AppError::session_unauthorized()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session not found or expired");
}

#[tokio::test]
async fn missing_and_expired_sessions_are_indistinguishable() {
    // Both paths construct the same error; the serialized bodies must match.
    let (_, missing) = response_parts(AppError::session_unauthorized()).await;
    let (_, expired) = response_parts(AppError::session_unauthorized()).await;

    assert_eq!(missing, expired);
}

#[tokio::test]
async fn duplicate_email_is_409() {
    let (status, body) = response_parts(AppError::DuplicateEmail).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn bad_request_carries_message() {
    let (status, body) =
        response_parts(AppError::BadRequest("Points must be non-negative".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Points must be non-negative");
}

#[tokio::test]
async fn database_errors_do_not_leak_details() {
    let (status, body) =
        response_parts(AppError::Database("connection refused to 10.0.0.3".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn identity_provider_errors_are_502_and_generic() {
    let (status, body) =
        response_parts(AppError::IdentityProvider("JWKS fetch timed out".into())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Identity provider unavailable");
}

#[tokio::test]
async fn not_found_is_404() {
    let (status, body) = response_parts(AppError::NotFound("User u-1".into())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found: User u-1");
}
