// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Uniqueness indexes (email, identity-provider subject)
//! - Sessions (legacy opaque-token design)
//! - Quizzes and the leaderboard query
//!
//! Firestore has no unique field constraints, so uniqueness is enforced with
//! create-only index documents whose document ID is the unique value: a
//! second `insert()` for the same ID fails with a conflict, which callers
//! treat as "the value is taken" rather than as a fatal error.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Quiz, Session, User};

/// Value of an index document: the user it points at.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct IndexEntry {
    user_id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Whether an error is a create-only conflict (document already exists).
fn is_conflict(err: &firestore::errors::FirestoreError) -> bool {
    matches!(err, firestore::errors::FirestoreError::DataConflictError(_))
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by internal identifier.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user document. Fails if the ID is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user document.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Top users for the leaderboard, highest score first.
    pub async fn top_users(&self, limit: u32) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([(
                "leaderboard_score",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Uniqueness Indexes ──────────────────────────────────────

    /// Reserve an email for a user. Returns `false` if the email is taken.
    pub async fn create_email_index(&self, email: &str, user_id: &str) -> Result<bool, AppError> {
        self.create_index_entry(collections::USER_EMAILS, email, user_id)
            .await
    }

    /// Look up the user owning an email.
    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>, AppError> {
        self.find_index_entry(collections::USER_EMAILS, email).await
    }

    /// Release an email reservation.
    pub async fn delete_email_index(&self, email: &str) -> Result<(), AppError> {
        self.delete_index_entry(collections::USER_EMAILS, email)
            .await
    }

    /// Reserve an identity-provider subject for a user. Returns `false` if
    /// another record already claimed it (a concurrent first-sight create).
    pub async fn create_subject_index(
        &self,
        subject: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        self.create_index_entry(collections::USER_SUBJECTS, subject, user_id)
            .await
    }

    /// Look up the user owning an identity-provider subject.
    pub async fn find_user_id_by_subject(&self, subject: &str) -> Result<Option<String>, AppError> {
        self.find_index_entry(collections::USER_SUBJECTS, subject)
            .await
    }

    /// Release a subject reservation.
    pub async fn delete_subject_index(&self, subject: &str) -> Result<(), AppError> {
        self.delete_index_entry(collections::USER_SUBJECTS, subject)
            .await
    }

    async fn create_index_entry(
        &self,
        collection: &str,
        key: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let entry = IndexEntry {
            user_id: user_id.to_string(),
        };

        let result: Result<(), _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(key)
            .object(&entry)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(ref e) if is_conflict(e) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn find_index_entry(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<String>, AppError> {
        let entry: Option<IndexEntry> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entry.map(|e| e.user_id))
    }

    async fn delete_index_entry(&self, collection: &str, key: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(key)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Get a session by identifier.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(session_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a new session.
    pub async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a session. Deleting an already-deleted session is not an error.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(session_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all sessions owned by a user (account-deletion cascade).
    pub async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), AppError> {
        let owned = user_id.to_string();
        let sessions: Vec<Session> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(owned.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for session in sessions {
            self.delete_session(&session.id).await?;
        }

        Ok(())
    }

    // ─── Quiz Operations ─────────────────────────────────────────

    /// Fetch up to `limit` quiz items.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUIZZES)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
