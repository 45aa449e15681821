// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Identity-broker abstraction.
//!
//! The broker wraps the identity provider's client library: the browser
//! redirect flow on the web target, the native authentication broker on
//! mobile. The state machine never talks to the provider directly.

use crate::client::state::Profile;
use async_trait::async_trait;

/// Credentials held by the provider library.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
}

/// Result of a completed interactive authorization.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub profile: Profile,
    pub credentials: Credentials,
}

/// Errors surfaced by the identity-provider client library.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// The user abandoned the flow (closed the provider tab/dialog).
    #[error("user cancelled the authorization flow")]
    UserCancelled,

    /// The provider library reports another transaction already in progress.
    #[error("an identity-provider transaction is already in progress")]
    TransactionInProgress,

    #[error("identity provider network failure: {0}")]
    Network(String),

    #[error("identity provider error: {0}")]
    Provider(String),
}

impl BrokerError {
    /// Whether this error should be swallowed: the user backed out or the
    /// provider refused a concurrent transaction. Neither leaves the client
    /// in a broken state.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            BrokerError::UserCancelled | BrokerError::TransactionInProgress
        )
    }
}

/// Delegated identity-provider client.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Run the interactive authorization flow and return the established
    /// provider session.
    async fn authorize(&self) -> Result<ProviderSession, BrokerError>;

    /// Terminate the provider-side session.
    async fn clear_session(&self) -> Result<(), BrokerError>;

    /// Current credentials. The provider library may silently refresh an
    /// expired access token using a refresh token it holds.
    async fn get_credentials(&self) -> Result<Credentials, BrokerError>;
}
