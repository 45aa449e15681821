// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Client-side authentication states.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Profile claims cached for display.
///
/// These are decoded client-side for rendering only and must never be
/// treated as a verified assertion; all trust decisions happen server-side
/// after signature verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub subject: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Current principal as seen by the client.
///
/// At most one of "authenticated with profile" and "guest" holds at a time;
/// the transitional states exist only while a login or logout is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated {
        profile: Profile,
        access_token: String,
    },
    Guest,
    LoggingOut,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Whether a login or logout is currently in flight.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, AuthState::Authenticating | AuthState::LoggingOut)
    }
}

impl Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Anonymous => write!(f, "Anonymous"),
            AuthState::Authenticating => write!(f, "Authenticating"),
            AuthState::Authenticated { profile, .. } => {
                write!(f, "Authenticated(subject: {})", profile.subject)
            }
            AuthState::Guest => write!(f, "Guest"),
            AuthState::LoggingOut => write!(f, "LoggingOut"),
        }
    }
}
