// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Durable key-value storage abstraction and state hydration.
//!
//! Three keys together encode the persisted auth state; they are always read
//! as a set and the state derived deterministically from their presence. On
//! the browser target the backing store is `localStorage`, so writes are
//! also what other tabs observe through the storage-change event.

use crate::client::state::{AuthState, Profile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Persisted keys. Read together on every hydration.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "auth.access_token";
    pub const PROFILE: &str = "auth.profile";
    pub const GUEST_MODE: &str = "auth.guest_mode";
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// Durable key-value storage provided by the host platform.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and ephemeral native sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Derive the auth state from the three persisted keys.
///
/// The guest flag takes precedence over any cached session; a cached token
/// without a parseable profile (or vice versa) hydrates to `Anonymous`.
pub async fn hydrate(store: &dyn KeyValueStore) -> Result<AuthState, StorageError> {
    let guest = store.get(keys::GUEST_MODE).await?;
    if guest.as_deref() == Some("true") {
        return Ok(AuthState::Guest);
    }

    let token = store.get(keys::ACCESS_TOKEN).await?;
    let profile_json = store.get(keys::PROFILE).await?;

    match (token, profile_json) {
        (Some(token), Some(json)) if !token.trim().is_empty() => {
            match serde_json::from_str::<Profile>(&json) {
                Ok(profile) => Ok(AuthState::Authenticated {
                    profile,
                    access_token: token,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "Corrupt cached profile, hydrating anonymous");
                    Ok(AuthState::Anonymous)
                }
            }
        }
        _ => Ok(AuthState::Anonymous),
    }
}
