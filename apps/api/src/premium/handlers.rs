use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::auth::session::AuthUser;
use crate::errors::AppError;
use crate::models::download::Download;
use crate::models::user::LeaderboardEntry;
use crate::premium::export::{export_key, render_csv, CSV_CONTENT_TYPE};
use crate::premium::{require_premium, LEADERBOARD_SIZE};
use crate::state::AppState;
use crate::store::{DownloadStore, ExpenseStore, UserStore};

#[derive(Serialize)]
pub struct DownloadResponse {
    pub file_url: String,
}

/// GET /premium/leaderboard
pub async fn handle_leaderboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    require_premium(state.store.as_ref(), auth.id).await?;
    Ok(Json(state.store.leaderboard(LEADERBOARD_SIZE).await?))
}

/// GET /user/download
pub async fn handle_download(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DownloadResponse>, AppError> {
    let user = require_premium(state.store.as_ref(), auth.id).await?;

    let expenses = state.store.all_expenses(user.id).await?;
    let csv = render_csv(&expenses);
    let key = export_key(user.id, Utc::now());

    let file_url = state
        .exports
        .publish(&key, csv.into_bytes(), CSV_CONTENT_TYPE)
        .await?;
    state.store.record_download(user.id, &file_url).await?;
    info!(user_id = %user.id, rows = expenses.len(), "Exported expense history");

    Ok(Json(DownloadResponse { file_url }))
}

/// GET /user/downloads
pub async fn handle_download_history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Download>>, AppError> {
    Ok(Json(state.store.list_downloads(auth.id).await?))
}
