// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Routes for authenticated users: profile, account deletion, quiz scoring.
//!
//! The auth middleware is applied in routes/mod.rs; every handler here
//! receives a trusted [`AuthUser`] regardless of which scheme resolved it.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::PublicUser;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/profile", get(get_profile).put(update_profile))
        .route("/auth/account", delete(delete_account))
        .route("/quiz/submit", post(submit_quiz))
}

// ─── Profile ─────────────────────────────────────────────────

/// Profile response wrapper.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub user: PublicUser,
}

/// Get the caller's profile. First sight of a subject provisions the record
/// in the auth middleware, so this always has a user to return.
async fn get_profile(Extension(auth): Extension<AuthUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user: auth.user.sanitize(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Partial profile update: only the supplied fields are applied.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let mut user = state
        .db
        .get_user(&auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", auth.user.id)))?;

    if let Some(first_name) = body.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = body.last_name {
        user.last_name = Some(last_name.trim().to_string());
    }
    user.updated_at = format_utc_rfc3339(chrono::Utc::now());

    state.db.upsert_user(&user).await?;

    Ok(Json(ProfileResponse {
        user: user.sanitize(),
    }))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub message: String,
}

/// Delete the caller's account and all associated records.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    let user = &auth.user;

    tracing::info!(user_id = %user.id, "User-initiated account deletion");

    state.sessions.delete_sessions_for_user(&user.id).await?;
    state.db.delete_email_index(&user.email).await?;
    if let Some(subject) = &user.subject {
        state.db.delete_subject_index(subject).await?;
    }
    state.db.delete_user(&user.id).await?;

    Ok(Json(DeleteAccountResponse {
        message: "Account deleted".to_string(),
    }))
}

// ─── Quiz Scoring ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    points: i64,
}

/// Record a correct answer: add the awarded points to the caller's
/// leaderboard score. The score never decreases; negative submissions are
/// rejected before any mutation.
async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SubmitQuizRequest>,
) -> Result<Json<ProfileResponse>> {
    let points = validate_points(body.points)?;

    let mut user = state
        .db
        .get_user(&auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", auth.user.id)))?;

    user.leaderboard_score = user.leaderboard_score.saturating_add(points);
    user.updated_at = format_utc_rfc3339(chrono::Utc::now());

    state.db.upsert_user(&user).await?;

    tracing::debug!(
        user_id = %user.id,
        score = user.leaderboard_score,
        "Leaderboard score updated"
    );

    Ok(Json(ProfileResponse {
        user: user.sanitize(),
    }))
}

fn validate_points(points: i64) -> Result<u32> {
    if points < 0 {
        return Err(AppError::BadRequest(
            "Points must be non-negative".to_string(),
        ));
    }

    u32::try_from(points)
        .map_err(|_| AppError::BadRequest("Points value too large".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_points_rejected() {
        assert!(matches!(
            validate_points(-1),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(validate_points(0).unwrap(), 0);
        assert_eq!(validate_points(10).unwrap(), 10);
    }

    #[test]
    fn oversized_points_rejected() {
        assert!(validate_points(i64::from(u32::MAX) + 1).is_err());
    }
}
