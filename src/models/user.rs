//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User record stored in Firestore (keyed by `id`).
///
/// The credential fields at the bottom belong to the legacy session design
/// and must never reach a client; external responses go through
/// [`User::sanitize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal identifier (UUID v4, also the document ID)
    pub id: String,
    /// Identity-provider subject (`sub` claim). Unique when present;
    /// `None` only for records created before the OAuth migration.
    #[serde(default)]
    pub subject: Option<String>,
    /// Email address (unique)
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Cumulative quiz score; only ever increased by quiz submissions.
    #[serde(default)]
    pub leaderboard_score: u32,

    // --- Legacy credential fields (store-only) ---
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub verification_token: Option<String>,
    #[serde(default)]
    pub password_reset_token: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Externally visible user projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub leaderboard_score: u32,
}

impl User {
    /// Strip credential fields and timestamps for client exposure.
    pub fn sanitize(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            leaderboard_score: self.leaderboard_score,
        }
    }
}
