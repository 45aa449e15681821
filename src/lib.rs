// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! EcoQuest: environmental-education app backend and client identity core.
//!
//! This crate provides the REST API (authentication, quiz scoring,
//! leaderboard) and the embeddable client-side authentication state machine
//! used by the native and browser shells.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{IdentityReconciler, SessionService, TokenVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_verifier: Arc<TokenVerifier>,
    pub reconciler: IdentityReconciler,
    pub sessions: SessionService,
}
