// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Opaque session issuance and validation (legacy design).
//!
//! Sessions are random identifiers with no embedded structure; the trust
//! boundary is the credential store itself. A missing session and an expired
//! session are indistinguishable to callers: both surface as the same 401.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::Session;
use crate::time_utils::format_utc_rfc3339;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};

/// Session lifetime.
const SESSION_TTL_DAYS: i64 = 7;

/// Opaque token length in bytes (before base64 encoding).
const TOKEN_BYTES: usize = 32;

/// Issues and validates opaque sessions against the credential store.
#[derive(Clone)]
pub struct SessionService {
    db: FirestoreDb,
}

impl SessionService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Create a session for a user: fresh random identifier and token,
    /// expiry seven days out. Returns the full record.
    pub async fn create_session(&self, user_id: &str) -> Result<Session, AppError> {
        let now = Utc::now();

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token: generate_opaque_token()?,
            created_at: format_utc_rfc3339(now),
            expires_at: format_utc_rfc3339(now + Duration::days(SESSION_TTL_DAYS)),
        };

        self.db.insert_session(&session).await?;

        tracing::debug!(session_id = %session.id, user_id, "Session created");
        Ok(session)
    }

    /// Fetch and validate a session.
    ///
    /// A session that does not exist and one that has expired both yield the
    /// same 401; an expired record is eagerly deleted on detection
    /// (best-effort; a concurrent deletion is not an error).
    pub async fn validate_session(&self, session_id: &str) -> Result<Session, AppError> {
        if session_id.is_empty() {
            return Err(AppError::session_unauthorized());
        }

        let session = self
            .db
            .get_session(session_id)
            .await?
            .ok_or_else(AppError::session_unauthorized)?;

        if session.is_expired_at(Utc::now()) {
            if let Err(e) = self.db.delete_session(session_id).await {
                tracing::debug!(session_id, error = %e, "Expired session cleanup failed");
            }
            return Err(AppError::session_unauthorized());
        }

        Ok(session)
    }

    /// Delete a session (logout).
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        self.db.delete_session(session_id).await
    }

    /// Delete every session owned by a user (account-deletion cascade).
    pub async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), AppError> {
        self.db.delete_sessions_for_user(user_id).await
    }
}

/// Generate a random opaque bearer token (URL-safe base64, no padding).
fn generate_opaque_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tokens_are_random_and_urlsafe() {
        let a = generate_opaque_token().unwrap();
        let b = generate_opaque_token().unwrap();

        assert_ne!(a, b);
        // 32 bytes → 43 base64 characters without padding
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
