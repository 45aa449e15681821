// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Public leaderboard.

use crate::error::Result;
use crate::models::PublicUser;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const LEADERBOARD_SIZE: u32 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<PublicUser>,
    pub count: usize,
}

/// Top users by cumulative quiz score.
async fn get_leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<LeaderboardResponse>> {
    let users = state.db.top_users(LEADERBOARD_SIZE).await?;

    let leaderboard: Vec<PublicUser> = users.iter().map(|u| u.sanitize()).collect();

    Ok(Json(LeaderboardResponse {
        count: leaderboard.len(),
        leaderboard,
    }))
}
