// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! End-to-end auth flows against the Firestore emulator.
//!
//! All tests are skipped unless FIRESTORE_EMULATOR_HOST is set.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use ecoquest::models::Session;
use ecoquest::services::VerifiedClaims;
use ecoquest::time_utils::format_utc_rfc3339;
use std::collections::HashMap;
use tower::ServiceExt;

mod common;

fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, uuid::Uuid::new_v4())
}

async fn request_json(
    app: axum::Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_signup_login_logout_flow() {
    require_emulator!();

    let state = common::build_state(common::legacy_config(), common::test_db().await);
    let app = ecoquest::routes::create_router(state);

    let email = unique_email("flow");

    // Signup: 201, sanitized body, no credential fields
    let (status, body) = request_json(
        app.clone(),
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "pw123456",
            "firstName": "A",
            "lastName": "B",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_string());
    assert_eq!(body["email"], email);
    assert_eq!(body["firstName"], "A");
    assert_eq!(body["lastName"], "B");
    assert_eq!(body["role"], "user");
    assert_eq!(body["leaderboardScore"], 0);
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("verificationToken").is_none());
    assert!(body.get("passwordResetToken").is_none());

    // Duplicate email: 409
    let (status, _) = request_json(
        app.clone(),
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "pw123456",
            "firstName": "A",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Login with wrong password: 401
    let (status, _) = request_json(
        app.clone(),
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({"email": email, "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Login: 200 with sessionId + user
    let (status, body) = request_json(
        app.clone(),
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({"email": email, "password": "pw123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"].get("password").is_none());

    // Logout: 200 with sanitized session (no timestamps)
    let (status, body) = request_json(
        app.clone(),
        "POST",
        "/auth/logout",
        None,
        Some(serde_json::json!({"sessionId": session_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session_id.as_str());
    assert!(body.get("expiresAt").is_none());
    assert!(body.get("createdAt").is_none());

    // Repeat logout: the session no longer exists, so 401
    let (status, body) = request_json(
        app,
        "POST",
        "/auth/logout",
        None,
        Some(serde_json::json!({"sessionId": session_id})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session not found or expired");
}

#[tokio::test]
async fn test_expired_session_indistinguishable_from_missing() {
    require_emulator!();

    let db = common::test_db().await;
    let state = common::build_state(common::legacy_config(), db.clone());
    let app = ecoquest::routes::create_router(state);

    // Plant an already-expired session
    let expired = Session {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: uuid::Uuid::new_v4().to_string(),
        token: "opaque".to_string(),
        created_at: format_utc_rfc3339(chrono::Utc::now() - chrono::Duration::days(8)),
        expires_at: format_utc_rfc3339(chrono::Utc::now() - chrono::Duration::hours(1)),
    };
    db.insert_session(&expired).await.unwrap();

    let (status, expired_body) = request_json(
        app.clone(),
        "POST",
        "/auth/logout",
        None,
        Some(serde_json::json!({"sessionId": expired.id})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Expired record is eagerly deleted on detection
    assert!(db.get_session(&expired.id).await.unwrap().is_none());

    let (status, missing_body) = request_json(
        app,
        "POST",
        "/auth/logout",
        None,
        Some(serde_json::json!({"sessionId": uuid::Uuid::new_v4().to_string()})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Byte-identical error bodies for expired vs. never-created
    assert_eq!(expired_body, missing_body);
}

#[tokio::test]
async fn test_profile_partial_update_preserves_other_fields() {
    require_emulator!();

    let state = common::build_state(common::legacy_config(), common::test_db().await);
    let app = ecoquest::routes::create_router(state);

    let email = unique_email("partial");

    let (_, _) = request_json(
        app.clone(),
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "pw123456",
            "firstName": "Before",
            "lastName": "Kept",
        })),
    )
    .await;

    let (_, body) = request_json(
        app.clone(),
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({"email": email, "password": "pw123456"})),
    )
    .await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    // Legacy mode: the session id doubles as the bearer credential
    let (status, body) = request_json(
        app.clone(),
        "PUT",
        "/auth/profile",
        Some(&session_id),
        Some(serde_json::json!({"firstName": "X"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["firstName"], "X");
    assert_eq!(body["user"]["lastName"], "Kept");

    // And the update is durable
    let (_, body) = request_json(app, "GET", "/auth/profile", Some(&session_id), None).await;
    assert_eq!(body["user"]["firstName"], "X");
    assert_eq!(body["user"]["lastName"], "Kept");
}

#[tokio::test]
async fn test_quiz_submission_updates_score() {
    require_emulator!();

    let state = common::build_state(common::legacy_config(), common::test_db().await);
    let app = ecoquest::routes::create_router(state);

    let email = unique_email("score");

    request_json(
        app.clone(),
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "pw123456",
            "firstName": "Scorer",
        })),
    )
    .await;

    let (_, body) = request_json(
        app.clone(),
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({"email": email, "password": "pw123456"})),
    )
    .await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    // 50 points in five submissions
    for _ in 0..5 {
        let (status, _) = request_json(
            app.clone(),
            "POST",
            "/quiz/submit",
            Some(&session_id),
            Some(serde_json::json!({"points": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // 50 + 10 = 60
    let (status, body) = request_json(
        app.clone(),
        "POST",
        "/quiz/submit",
        Some(&session_id),
        Some(serde_json::json!({"points": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["leaderboardScore"], 60);

    // Negative points: rejected before any mutation
    let (status, _) = request_json(
        app.clone(),
        "POST",
        "/quiz/submit",
        Some(&session_id),
        Some(serde_json::json!({"points": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = request_json(app, "GET", "/auth/profile", Some(&session_id), None).await;
    assert_eq!(body["user"]["leaderboardScore"], 60);
}

#[tokio::test]
async fn test_concurrent_first_sight_provisioning_creates_one_user() {
    require_emulator!();

    let db = common::test_db().await;
    let reconciler = ecoquest::services::IdentityReconciler::new(
        db.clone(),
        "https://ecoquest.app/".to_string(),
    );

    let subject = format!("auth0|{}", uuid::Uuid::new_v4());
    let claims = VerifiedClaims {
        subject: subject.clone(),
        email: Some(unique_email("jit")),
        given_name: Some("Jit".to_string()),
        family_name: None,
        name: None,
        extra: HashMap::new(),
    };

    let (a, b) = tokio::join!(reconciler.resolve(&claims), reconciler.resolve(&claims));

    let a = a.unwrap();
    let b = b.unwrap();

    // Exactly one record exists for the subject, and both calls returned it
    assert_eq!(a.id, b.id);
    let indexed = db.find_user_id_by_subject(&subject).await.unwrap();
    assert_eq!(indexed.as_deref(), Some(a.id.as_str()));
    assert_eq!(a.role, ecoquest::models::Role::User);
    assert_eq!(a.leaderboard_score, 0);
}
