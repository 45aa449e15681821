// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Services module - business logic layer.

pub mod oidc;
pub mod reconciler;
pub mod session;

pub use oidc::{OidcError, TokenVerifier, VerifiedClaims};
pub use reconciler::IdentityReconciler;
pub use session::SessionService;
