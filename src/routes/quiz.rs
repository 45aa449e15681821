// SPDX-License-Identifier: MIT
// Copyright 2026 EcoQuest Contributors

//! Public quiz listing.

use crate::error::{AppError, Result};
use crate::models::Quiz;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/quiz", get(list_quizzes))
}

#[derive(Deserialize)]
struct QuizQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct QuizListResponse {
    pub quizzes: Vec<Quiz>,
    pub count: usize,
    pub limit: u32,
}

/// List quiz questions, up to `limit` (default 10, capped at 100).
async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuizQuery>,
) -> Result<Json<QuizListResponse>> {
    let limit = effective_limit(query.limit)?;

    let quizzes = state.db.list_quizzes(limit).await?;

    Ok(Json(QuizListResponse {
        count: quizzes.len(),
        quizzes,
        limit,
    }))
}

fn effective_limit(requested: Option<i64>) -> Result<u32> {
    match requested {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if n < 1 => Err(AppError::BadRequest(
            "Limit must be a positive number".to_string(),
        )),
        Some(n) => Ok((n as u64).min(u64::from(MAX_LIMIT)) as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(effective_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some(25)).unwrap(), 25);
        assert_eq!(effective_limit(Some(10_000)).unwrap(), MAX_LIMIT);
    }

    #[test]
    fn non_positive_limit_rejected() {
        assert!(effective_limit(Some(0)).is_err());
        assert!(effective_limit(Some(-3)).is_err());
    }
}
