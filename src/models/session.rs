//! Session model (legacy opaque-token design).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Session record stored in Firestore (keyed by `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier (UUID v4, also the document ID)
    pub id: String,
    /// Owning user identifier
    pub user_id: String,
    /// Opaque bearer token value
    pub token: String,
    pub created_at: String,
    /// Expiry timestamp (RFC3339); always in the future at creation
    pub expires_at: String,
}

/// Session projection safe for client exposure: timestamps stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedSession {
    pub id: String,
    pub user_id: String,
    pub token: String,
}

impl Session {
    /// Strip `created_at`/`expires_at` for client exposure.
    pub fn sanitize(&self) -> SanitizedSession {
        SanitizedSession {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            token: self.token.clone(),
        }
    }

    /// Whether the session is expired at `now`. An unparseable expiry is
    /// treated as expired (fail closed).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => expires_at.with_timezone(&Utc) <= now,
            Err(_) => true,
        }
    }
}
