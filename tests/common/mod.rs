// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

use ecoquest::config::{AuthMode, Config};
use ecoquest::db::FirestoreDb;
use ecoquest::routes::create_router;
use ecoquest::services::{IdentityReconciler, SessionService, TokenVerifier};
use ecoquest::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Config for legacy-session tests.
#[allow(dead_code)]
pub fn legacy_config() -> Config {
    let mut config = Config::test_default();
    config.auth_mode = AuthMode::LegacySession;
    config
}

/// Assemble shared state from a config and database.
#[allow(dead_code)]
pub fn build_state(config: Config, db: FirestoreDb) -> Arc<AppState> {
    let token_verifier =
        Arc::new(TokenVerifier::new(&config).expect("Failed to build token verifier"));
    let reconciler = IdentityReconciler::new(db.clone(), config.auth_claim_namespace.clone());
    let sessions = SessionService::new(db.clone());

    Arc::new(AppState {
        config,
        db,
        token_verifier,
        reconciler,
        sessions,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(Config::test_default(), test_db_offline());
    (create_router(state.clone()), state)
}

/// Create a test app in legacy-session mode with offline mock dependencies.
#[allow(dead_code)]
pub fn create_legacy_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(legacy_config(), test_db_offline());
    (create_router(state.clone()), state)
}
