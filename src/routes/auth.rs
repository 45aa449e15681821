// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Legacy authentication routes: signup, login, logout and account deletion
//! driven by opaque session identifiers.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::{PublicUser, Role, SanitizedSession, User};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/delete-account", post(delete_account))
}

// ─── Signup ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Field-format policy checked after presence validation.
#[derive(Validate)]
struct CredentialPolicy {
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
}

/// Create a user with a hashed password.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    let (Some(email), Some(password), Some(first_name)) =
        (&body.email, &body.password, &body.first_name)
    else {
        return Err(AppError::BadRequest(
            "Missing required fields: email, password, firstName".to_string(),
        ));
    };

    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() || first_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing required fields: email, password, firstName".to_string(),
        ));
    }

    let policy = CredentialPolicy {
        email: email.clone(),
        password: password.clone(),
    };
    policy
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = format_utc_rfc3339(chrono::Utc::now());
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        subject: None,
        email: email.clone(),
        first_name: first_name.trim().to_string(),
        last_name: body.last_name.as_deref().map(|s| s.trim().to_string()),
        role: Role::User,
        leaderboard_score: 0,
        password_hash: Some(hash_password(password)?),
        email_verified: false,
        verification_token: None,
        password_reset_token: None,
        created_at: now.clone(),
        updated_at: now,
    };

    // Reserve the email before writing the user document; the index create
    // is the uniqueness guard.
    if !state.db.create_email_index(&email, &user.id).await? {
        return Err(AppError::DuplicateEmail);
    }

    if let Err(e) = state.db.insert_user(&user).await {
        // Roll back the reservation so the email is not left pointing at a
        // user that was never written.
        if let Err(rollback) = state.db.delete_email_index(&email).await {
            tracing::error!(email = %email, error = %rollback, "Email index rollback failed");
        }
        return Err(e);
    }

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(user.sanitize())))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: String,
    pub user: PublicUser,
}

/// Verify credentials and open a session.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let invalid_credentials =
        || AppError::Unauthorized("Invalid email or password".to_string());

    let (Some(email), Some(password)) = (&body.email, &body.password) else {
        return Err(invalid_credentials());
    };

    let email = normalize_email(email);

    let user_id = state
        .db
        .find_user_id_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid_credentials)?;
    if !verify_password(password, hash) {
        return Err(invalid_credentials());
    }

    let session = state.sessions.create_session(&user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        session_id: session.id,
        user: user.sanitize(),
    }))
}

// ─── Logout / Account Deletion ───────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRequest {
    session_id: Option<String>,
}

/// Terminate a session. A second logout with the same identifier is a 401:
/// the session no longer exists.
async fn logout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SanitizedSession>> {
    let session_id = body
        .session_id
        .as_deref()
        .ok_or_else(AppError::session_unauthorized)?;

    let session = state.sessions.validate_session(session_id).await?;
    state.sessions.delete_session(&session.id).await?;

    tracing::info!(session_id = %session.id, "Session terminated");
    Ok(Json(session.sanitize()))
}

/// Delete the account owning the presented session, cascading to its
/// sessions and uniqueness-index entries.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SanitizedSession>> {
    let session_id = body
        .session_id
        .as_deref()
        .ok_or_else(AppError::session_unauthorized)?;

    let session = state.sessions.validate_session(session_id).await?;

    let user = state.db.get_user(&session.user_id).await?;

    state.sessions.delete_sessions_for_user(&session.user_id).await?;

    if let Some(user) = user {
        state.db.delete_email_index(&user.email).await?;
        if let Some(subject) = &user.subject {
            state.db.delete_subject_index(subject).await?;
        }
        state.db.delete_user(&user.id).await?;
    } else {
        tracing::warn!(
            user_id = %session.user_id,
            "Session owner not found during account deletion"
        );
    }

    tracing::info!(user_id = %session.user_id, "Account deleted");
    Ok(Json(session.sanitize()))
}

// ─── Helpers ─────────────────────────────────────────────────

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
