use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, Summary};
use crate::{
    auth::extractors::AdminUser,
    credits::{dto::TopupView, repo_types::CreditTopup, services as credits},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/summary", get(summary))
        .route("/admin/topups/pending", get(list_pending))
        .route("/admin/topups/:id/approve", post(approve))
        .route("/admin/topups/:id/reject", post(reject))
}

#[instrument(skip(state, _admin))]
pub async fn summary(State(state): State<AppState>, _admin: AdminUser) -> AppResult<Json<Summary>> {
    Ok(Json(repo::load_summary(&state.db).await?))
}

/// Pending top-ups, newest first.
#[instrument(skip(state, _admin))]
pub async fn list_pending(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<TopupView>>> {
    Ok(Json(credits::list_pending(&state).await?))
}

#[instrument(skip(state, admin))]
pub async fn approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CreditTopup>> {
    let topup = credits::approve_topup(&state, id).await?;
    info!(admin_id = %admin.0.id, topup_id = %id, "approved by admin");
    Ok(Json(topup))
}

#[instrument(skip(state, admin))]
pub async fn reject(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CreditTopup>> {
    let topup = credits::reject_topup(&state, id).await?;
    info!(admin_id = %admin.0.id, topup_id = %id, "rejected by admin");
    Ok(Json(topup))
}
