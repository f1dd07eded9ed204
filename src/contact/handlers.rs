use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ContactInfo, UpdateContactRequest},
    services,
};
use crate::{
    auth::extractors::AdminUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/contact", get(get_contact))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/contact-info", patch(update_contact))
}

#[instrument(skip(state))]
pub async fn get_contact(State(state): State<AppState>) -> AppResult<Json<ContactInfo>> {
    ContactInfo::get(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("contact info not set".into()))
}

#[instrument(skip(state, admin, body))]
pub async fn update_contact(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(body): Json<UpdateContactRequest>,
) -> AppResult<Json<ContactInfo>> {
    let current = ContactInfo::get(&state.db).await?;
    let saved = services::apply_patch(current, body)?.save(&state.db).await?;
    info!(admin_id = %admin.0.id, "contact info updated");
    Ok(Json(saved))
}
