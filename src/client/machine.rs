// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Login/logout orchestration over the identity broker.
//!
//! Login and logout are mutually exclusive: at most one transition runs at a
//! time, represented by a single shared in-flight future. A second call while
//! one is pending joins that operation instead of starting another
//! identity-provider transaction.
//!
//! State changes are broadcast to same-process observers through a watch
//! channel and persisted to storage; on the browser target other tabs
//! converge by calling [`AuthClient::rehydrate`] from the storage-change
//! event.

use crate::client::broker::{BrokerError, IdentityBroker};
use crate::client::state::AuthState;
use crate::client::storage::{self, keys, KeyValueStore, StorageError};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Errors surfaced by the client auth state machine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientAuthError {
    /// `get_access_token()` was called in `Anonymous` or `Guest` state.
    #[error("not logged in")]
    NotLoggedIn,

    /// The provider library handed back an empty or whitespace token.
    #[error("identity provider returned malformed credentials")]
    MalformedCredentials,

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

type InFlight = Shared<BoxFuture<'static, Result<(), ClientAuthError>>>;

#[derive(Debug, Clone, Copy)]
enum Transition {
    Login,
    Logout,
}

struct Inner {
    broker: Arc<dyn IdentityBroker>,
    storage: Arc<dyn KeyValueStore>,
    state_tx: watch::Sender<AuthState>,
    /// The single in-flight login/logout operation, if any.
    in_flight: Mutex<Option<InFlight>>,
}

/// Client-side authentication state machine.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

impl AuthClient {
    /// Create a client, hydrating the initial state from persisted storage.
    pub async fn new(
        broker: Arc<dyn IdentityBroker>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientAuthError> {
        let initial = storage::hydrate(storage.as_ref()).await?;
        let (state_tx, _) = watch::channel(initial);

        Ok(Self {
            inner: Arc::new(Inner {
                broker,
                storage,
                state_tx,
                in_flight: Mutex::new(None),
            }),
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe state changes within this process.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    /// Run the interactive login flow.
    ///
    /// On success the token and profile are persisted and the state becomes
    /// `Authenticated`. A user-cancelled or provider-busy outcome restores
    /// the previous state and is not an error; any other failure restores
    /// the previous state and is propagated.
    pub async fn login(&self) -> Result<(), ClientAuthError> {
        self.run_exclusive(Transition::Login).await
    }

    /// Log out: clear the local cached token, profile and guest flag first,
    /// then best-effort terminate the provider-side session. Remote failures
    /// cannot resurrect the session, so the operation still succeeds.
    pub async fn logout(&self) -> Result<(), ClientAuthError> {
        self.run_exclusive(Transition::Logout).await
    }

    /// Enter guest mode without contacting the identity provider.
    ///
    /// Guests get UI access but no credential: `get_access_token()` fails in
    /// this state. Idempotent from `Guest`; ignored while authenticated or
    /// while a transition is in flight.
    pub async fn continue_as_guest(&self) -> Result<(), ClientAuthError> {
        let slot = self.inner.in_flight.lock().await;
        if slot.is_some() {
            tracing::debug!("Guest mode requested while a transition is in flight, ignoring");
            return Ok(());
        }

        match self.state() {
            AuthState::Guest => return Ok(()),
            AuthState::Authenticated { .. } => {
                tracing::warn!("Guest mode requested while authenticated, ignoring");
                return Ok(());
            }
            _ => {}
        }

        self.inner.storage.set(keys::GUEST_MODE, "true").await?;
        self.inner.set_state(AuthState::Guest);
        Ok(())
    }

    /// Current bearer token for API calls.
    ///
    /// Asks the provider library for credentials (which may silently refresh
    /// an expired token) and caches the result. Fails with [`NotLoggedIn`]
    /// in `Anonymous` or `Guest` state (it never resolves with an empty
    /// value) and treats an empty token from the provider as a hard error
    /// rather than a fallback to anonymous.
    ///
    /// [`NotLoggedIn`]: ClientAuthError::NotLoggedIn
    pub async fn get_access_token(&self) -> Result<String, ClientAuthError> {
        if !self.state().is_authenticated() {
            return Err(ClientAuthError::NotLoggedIn);
        }

        let credentials = self.inner.broker.get_credentials().await?;

        let access_token = credentials.access_token;
        if access_token.trim().is_empty() {
            return Err(ClientAuthError::MalformedCredentials);
        }

        self.inner
            .storage
            .set(keys::ACCESS_TOKEN, &access_token)
            .await?;
        self.inner.state_tx.send_if_modified(|state| match state {
            AuthState::Authenticated {
                access_token: cached,
                ..
            } if *cached != access_token => {
                *cached = access_token.clone();
                true
            }
            _ => false,
        });

        Ok(access_token)
    }

    /// Re-derive the state from the three persisted keys.
    ///
    /// On the browser target the host calls this from the storage-change
    /// event so all open tabs converge on the same state.
    pub async fn rehydrate(&self) -> Result<AuthState, ClientAuthError> {
        let slot = self.inner.in_flight.lock().await;
        if slot.is_some() {
            // A transition owns the state right now; it publishes the final
            // state when it completes.
            return Ok(self.state());
        }

        let state = storage::hydrate(self.inner.storage.as_ref()).await?;
        self.inner.set_state(state.clone());
        Ok(state)
    }

    /// Start `transition`, or join the already-pending one.
    async fn run_exclusive(&self, transition: Transition) -> Result<(), ClientAuthError> {
        let (fut, joined) = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(pending) => (pending.clone(), true),
                None => {
                    let inner = self.inner.clone();
                    let fut: InFlight = async move {
                        match transition {
                            Transition::Login => Inner::run_login(inner).await,
                            Transition::Logout => Inner::run_logout(inner).await,
                        }
                    }
                    .boxed()
                    .shared();
                    *slot = Some(fut.clone());
                    (fut, false)
                }
            }
        };

        if joined {
            tracing::debug!(?transition, "Transition already in flight, joining");
        }

        let result = fut.clone().await;

        let mut slot = self.inner.in_flight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&fut)) {
            *slot = None;
        }

        result
    }
}

impl Inner {
    fn set_state(&self, next: AuthState) {
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!(from = %current, to = %next, "Auth state transition");
            *current = next.clone();
            true
        });
    }

    async fn run_login(inner: Arc<Inner>) -> Result<(), ClientAuthError> {
        let previous = inner.state_tx.borrow().clone();

        if previous.is_authenticated() {
            tracing::debug!("Login requested while already authenticated");
            return Ok(());
        }

        inner.set_state(AuthState::Authenticating);

        let outcome: Result<AuthState, ClientAuthError> = async {
            let session = inner.broker.authorize().await?;

            let access_token = session.credentials.access_token;
            if access_token.trim().is_empty() {
                return Err(ClientAuthError::MalformedCredentials);
            }

            let profile_json = serde_json::to_string(&session.profile)
                .map_err(|e| StorageError(format!("profile serialization failed: {e}")))?;

            inner.storage.set(keys::ACCESS_TOKEN, &access_token).await?;
            inner.storage.set(keys::PROFILE, &profile_json).await?;
            inner.storage.remove(keys::GUEST_MODE).await?;

            Ok(AuthState::Authenticated {
                profile: session.profile,
                access_token,
            })
        }
        .await;

        match outcome {
            Ok(next) => {
                inner.set_state(next);
                Ok(())
            }
            Err(ClientAuthError::Broker(e)) if e.is_benign() => {
                tracing::info!(error = %e, "Authorization abandoned, restoring previous state");
                inner.set_state(previous);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                inner.set_state(previous);
                Err(e)
            }
        }
    }

    async fn run_logout(inner: Arc<Inner>) -> Result<(), ClientAuthError> {
        let previous = inner.state_tx.borrow().clone();

        if previous == AuthState::Anonymous {
            tracing::debug!("Logout requested with no local session");
            return Ok(());
        }

        inner.set_state(AuthState::LoggingOut);

        // Local credentials go first; whatever happens remotely, this client
        // no longer holds a session.
        let cleared: Result<(), StorageError> = async {
            inner.storage.remove(keys::ACCESS_TOKEN).await?;
            inner.storage.remove(keys::PROFILE).await?;
            inner.storage.remove(keys::GUEST_MODE).await?;
            Ok(())
        }
        .await;

        match inner.broker.clear_session().await {
            Ok(()) => {}
            Err(e) if e.is_benign() => {
                tracing::info!(error = %e, "Provider session termination skipped");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider session termination failed");
            }
        }

        inner.set_state(AuthState::Anonymous);
        cleared.map_err(ClientAuthError::from)
    }
}
