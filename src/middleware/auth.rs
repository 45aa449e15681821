// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Bearer-token authentication middleware.
//!
//! Handlers are agnostic to the authentication scheme: whichever resolver is
//! configured, they receive the same [`AuthUser`] extension carrying a
//! trusted local user record.

use crate::config::AuthMode;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a single token verification, including any JWKS refresh.
/// Keeps a hung upstream from stalling the request indefinitely.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated principal attached to the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: crate::models::User,
}

/// Middleware that requires a valid bearer credential.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request.headers().get(header::AUTHORIZATION);

    let user = match state.config.auth_mode {
        AuthMode::Oidc => {
            let claims = tokio::time::timeout(
                VERIFY_TIMEOUT,
                state.token_verifier.verify_bearer_token(auth_header),
            )
            .await
            .map_err(|_| {
                AppError::IdentityProvider("Token verification timed out".to_string())
            })??;

            state.reconciler.resolve(&claims).await?
        }
        AuthMode::LegacySession => {
            let session_id = bearer_value(auth_header)?;
            let session = state.sessions.validate_session(session_id).await?;

            state
                .db
                .get_user(&session.user_id)
                .await?
                .ok_or_else(AppError::session_unauthorized)?
        }
    };

    request.extensions_mut().insert(AuthUser { user });

    Ok(next.run(request).await)
}

/// Extract the raw bearer value (legacy mode: the opaque session id).
fn bearer_value(auth_header: Option<&axum::http::HeaderValue>) -> Result<&str, AppError> {
    auth_header
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(AppError::session_unauthorized)
}
