use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{BalanceResponse, TopupView},
    repo_types::BankAccount,
    services::{self, SlipUpload, TopupForm},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/credits/balance", get(get_balance))
        .route("/credits/bank-accounts", get(list_bank_accounts))
}

pub fn write_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/credits/topups", get(list_topups).post(submit_topup))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// POST /credits/topups (multipart: amount, bank_account?, transaction_time?, slip_image)
#[instrument(skip(state, mp))]
pub async fn submit_topup(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<(StatusCode, Json<TopupView>)> {
    let mut form = TopupForm::default();
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "slip_image" => {
                let file_name = field.file_name().unwrap_or("slip").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(multipart_error)?;
                form.slip = Some(SlipUpload {
                    file_name,
                    content_type,
                    body,
                });
            }
            "amount" => form.amount = Some(field.text().await.map_err(multipart_error)?),
            "bank_account" => {
                form.bank_account = Some(field.text().await.map_err(multipart_error)?)
            }
            "transaction_time" => {
                form.transaction_time = Some(field.text().await.map_err(multipart_error)?)
            }
            _ => {}
        }
    }
    let view = services::submit_topup(&state, user_id, form).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn list_topups(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<TopupView>>> {
    Ok(Json(services::list_user_topups(&state, user_id).await?))
}

/// Balance read straight from the store, never from the token.
#[instrument(skip(state))]
pub async fn get_balance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<BalanceResponse>> {
    let credits = state
        .credits
        .balance(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;
    Ok(Json(BalanceResponse { credits }))
}

#[instrument(skip(state, _user))]
pub async fn list_bank_accounts(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<BankAccount>>> {
    Ok(Json(state.credits.list_bank_accounts().await?))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "bad multipart body");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::validation("slip_image", "slip is too large")
    } else {
        AppError::validation("slip_image", "invalid upload")
    }
}
