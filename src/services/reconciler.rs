// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Just-in-time provisioning: maps a verified identity-provider subject to a
//! local user record, creating one on first sight.
//!
//! Two near-simultaneous first-sight requests race on creation. A per-subject
//! in-process lock serializes requests within one instance; across instances
//! the create-only subject index is authoritative: losing the create means
//! another writer won, and we adopt their record instead of failing.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::services::oidc::VerifiedClaims;
use crate::time_utils::format_utc_rfc3339;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared per-subject provisioning locks.
pub type ProvisionLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Resolves verified claims to local user records.
#[derive(Clone)]
pub struct IdentityReconciler {
    db: FirestoreDb,
    claim_namespace: String,
    provision_locks: ProvisionLocks,
}

impl IdentityReconciler {
    pub fn new(db: FirestoreDb, claim_namespace: impl Into<String>) -> Self {
        Self {
            db,
            claim_namespace: claim_namespace.into(),
            provision_locks: Arc::new(DashMap::new()),
        }
    }

    /// Return the local user for a verified subject, creating one on first
    /// sight with default role and zero score.
    pub async fn resolve(&self, claims: &VerifiedClaims) -> Result<User, AppError> {
        let subject = claims.subject.trim();
        if subject.is_empty() {
            // Verification succeeded but the claim set is unusable; this is
            // an authentication failure, not a server error.
            return Err(AppError::Unauthorized(
                "No user identifier in token".to_string(),
            ));
        }

        // Fast path: subject already provisioned.
        if let Some(user) = self.find_by_subject(subject).await? {
            return Ok(user);
        }

        // Serialize first-sight creation for this subject within the process.
        let lock = self
            .provision_locks
            .entry(subject.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check after acquiring the lock; another request may have
        // provisioned while we were waiting.
        if let Some(user) = self.find_by_subject(subject).await? {
            return Ok(user);
        }

        let profile = ProfileClaims::from_claims(claims, &self.claim_namespace);
        let now = format_utc_rfc3339(chrono::Utc::now());

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            subject: Some(subject.to_string()),
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            role: Role::User,
            leaderboard_score: 0,
            password_hash: None,
            email_verified: false,
            verification_token: None,
            password_reset_token: None,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.insert_user(&user).await?;

        // The subject index is the uniqueness guard. Losing it means another
        // instance created the record concurrently: discard ours and adopt
        // the winner's.
        if !self.db.create_subject_index(subject, &user.id).await? {
            tracing::info!(subject, "Lost first-sight provisioning race, adopting winner");
            if let Err(e) = self.db.delete_user(&user.id).await {
                tracing::warn!(user_id = %user.id, error = %e, "Orphaned loser record cleanup failed");
            }
            return self
                .find_by_subject(subject)
                .await?
                .ok_or_else(|| AppError::Database("Subject index points at no user".to_string()));
        }

        // Email uniqueness is best-effort in the OAuth design: the subject is
        // the authoritative identity, and provider emails can collide with
        // legacy records.
        if !self.db.create_email_index(&user.email, &user.id).await? {
            tracing::warn!(subject, email = %user.email, "Provisioned email already indexed");
        }

        tracing::info!(subject, user_id = %user.id, "Provisioned new user");
        Ok(user)
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.db.find_user_id_by_subject(subject).await? else {
            return Ok(None);
        };

        self.db.get_user(&user_id).await
    }
}

/// Profile fields derived from optional claims.
struct ProfileClaims {
    email: String,
    first_name: String,
    last_name: Option<String>,
}

impl ProfileClaims {
    fn from_claims(claims: &VerifiedClaims, namespace: &str) -> Self {
        let email = claims
            .email
            .clone()
            .or_else(|| claims.namespaced_str(namespace, "email"))
            .unwrap_or_else(|| placeholder_email(&claims.subject));

        let (first_name, last_name) = match (&claims.given_name, &claims.family_name) {
            (Some(given), family) => (given.clone(), family.clone()),
            (None, _) => match &claims.name {
                Some(name) => split_name(name),
                None => (String::new(), None),
            },
        };

        Self {
            email,
            first_name,
            last_name,
        }
    }
}

/// Synthesized address for subjects whose token carries no email claim.
fn placeholder_email(subject: &str) -> String {
    format!("{}@users.noreply.ecoquest.app", subject)
}

/// Split a combined name claim on the first space: first token is the first
/// name, the remainder (if any) is the last name.
fn split_name(name: &str) -> (String, Option<String>) {
    let name = name.trim();
    match name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), Some(rest.trim().to_string())),
        None => (name.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn claims(subject: &str) -> VerifiedClaims {
        VerifiedClaims {
            subject: subject.to_string(),
            email: None,
            given_name: None,
            family_name: None,
            name: None,
            extra: HashMap::new(),
        }
    }

    #[test]
    fn split_name_cases() {
        assert_eq!(split_name("Ada"), ("Ada".to_string(), None));
        assert_eq!(
            split_name("Ada Lovelace"),
            ("Ada".to_string(), Some("Lovelace".to_string()))
        );
        assert_eq!(
            split_name("Ada King Lovelace"),
            ("Ada".to_string(), Some("King Lovelace".to_string()))
        );
    }

    #[test]
    fn profile_prefers_split_claims_over_combined_name() {
        let mut c = claims("auth0|abc");
        c.given_name = Some("Grace".to_string());
        c.name = Some("Wrong Name".to_string());

        let profile = ProfileClaims::from_claims(&c, "https://ecoquest.app/");
        assert_eq!(profile.first_name, "Grace");
        assert_eq!(profile.last_name, None);
    }

    #[test]
    fn profile_falls_back_to_combined_name() {
        let mut c = claims("auth0|abc");
        c.name = Some("Grace Hopper".to_string());

        let profile = ProfileClaims::from_claims(&c, "https://ecoquest.app/");
        assert_eq!(profile.first_name, "Grace");
        assert_eq!(profile.last_name, Some("Hopper".to_string()));
    }

    #[test]
    fn email_precedence_standard_then_namespaced_then_placeholder() {
        let namespace = "https://ecoquest.app/";

        let mut c = claims("auth0|abc");
        c.email = Some("std@x.com".to_string());
        c.extra.insert(
            format!("{}email", namespace),
            serde_json::json!("ns@x.com"),
        );
        assert_eq!(ProfileClaims::from_claims(&c, namespace).email, "std@x.com");

        c.email = None;
        assert_eq!(ProfileClaims::from_claims(&c, namespace).email, "ns@x.com");

        c.extra.clear();
        assert_eq!(
            ProfileClaims::from_claims(&c, namespace).email,
            "auth0|abc@users.noreply.ecoquest.app"
        );
    }
}
