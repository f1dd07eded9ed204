use anyhow::Context;
use bytes::Bytes;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::TopupView,
    repo_types::{CreditTopup, NewTopup},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::keys,
};

const NOT_PENDING: &str = "top-up not found or already processed";

/// Evidence image attached to a top-up request.
pub struct SlipUpload {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Raw multipart fields of a top-up request, before validation.
#[derive(Default)]
pub struct TopupForm {
    pub amount: Option<String>,
    pub bank_account: Option<String>,
    pub transaction_time: Option<String>,
    pub slip: Option<SlipUpload>,
}

pub fn parse_amount(raw: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::validation(
            "amount",
            "amount must be a positive whole number",
        )),
    }
}

pub fn parse_transaction_time(raw: &str) -> AppResult<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|_| {
        AppError::validation(
            "transaction_time",
            "transaction time must be an RFC 3339 timestamp",
        )
    })
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Validate a top-up form, store the slip and record a pending top-up.
/// Nothing is written until every field has been checked.
#[instrument(skip(st, form))]
pub async fn submit_topup(st: &AppState, user_id: Uuid, form: TopupForm) -> AppResult<TopupView> {
    let amount = match non_blank(form.amount) {
        Some(raw) => parse_amount(&raw)?,
        None => return Err(AppError::validation("amount", "amount is required")),
    };
    let transaction_time = non_blank(form.transaction_time)
        .map(|raw| parse_transaction_time(&raw))
        .transpose()?;
    let bank_account = non_blank(form.bank_account);

    let slip = form
        .slip
        .filter(|s| !s.body.is_empty())
        .ok_or_else(|| AppError::validation("slip_image", "please attach the transfer slip"))?;
    if !slip.content_type.starts_with("image/") {
        warn!(%user_id, content_type = %slip.content_type, "slip is not an image");
        return Err(AppError::validation("slip_image", "slip must be an image"));
    }
    if slip.body.len() > st.config.max_upload_bytes {
        return Err(AppError::validation(
            "slip_image",
            format!(
                "slip must not exceed {} MB",
                st.config.max_upload_bytes / (1024 * 1024)
            ),
        ));
    }

    let key = keys::slip(user_id, &slip.file_name);
    st.storage
        .put_object(&key, slip.body, &slip.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let inserted = st
        .credits
        .insert_topup(NewTopup {
            user_id,
            amount,
            slip_image_key: key.clone(),
            bank_account,
            transaction_time,
        })
        .await;

    let topup = match inserted {
        Ok(t) => t,
        Err(e) => {
            if let Err(del) = st.storage.delete_object(&key).await {
                error!(error = %del, key = %key, "orphaned slip could not be removed");
            }
            return Err(e.into());
        }
    };

    info!(%user_id, topup_id = %topup.id, amount, "topup submitted");
    with_slip_url(st, topup).await
}

async fn with_slip_url(st: &AppState, topup: CreditTopup) -> AppResult<TopupView> {
    let slip_url = st
        .storage
        .presign_get(&topup.slip_image_key, st.config.storage.presign_ttl_secs)
        .await
        .with_context(|| format!("presign slip {}", topup.slip_image_key))?;
    Ok(TopupView { topup, slip_url })
}

async fn with_slip_urls(st: &AppState, rows: Vec<CreditTopup>) -> AppResult<Vec<TopupView>> {
    let mut out = Vec::with_capacity(rows.len());
    for t in rows {
        out.push(with_slip_url(st, t).await?);
    }
    Ok(out)
}

pub async fn list_user_topups(st: &AppState, user_id: Uuid) -> AppResult<Vec<TopupView>> {
    let rows = st.credits.list_by_user(user_id).await?;
    with_slip_urls(st, rows).await
}

pub async fn list_pending(st: &AppState) -> AppResult<Vec<TopupView>> {
    let rows = st.credits.list_pending().await?;
    with_slip_urls(st, rows).await
}

#[instrument(skip(st))]
pub async fn approve_topup(st: &AppState, id: Uuid) -> AppResult<CreditTopup> {
    match st.credits.approve(id).await? {
        Some(t) => {
            info!(topup_id = %id, user_id = %t.user_id, amount = t.amount, "topup approved");
            Ok(t)
        }
        None => {
            warn!(topup_id = %id, "approve refused");
            Err(AppError::NotPending(NOT_PENDING.into()))
        }
    }
}

#[instrument(skip(st))]
pub async fn reject_topup(st: &AppState, id: Uuid) -> AppResult<CreditTopup> {
    match st.credits.reject(id).await? {
        Some(t) => {
            info!(topup_id = %id, user_id = %t.user_id, "topup rejected");
            Ok(t)
        }
        None => {
            warn!(topup_id = %id, "reject refused");
            Err(AppError::NotPending(NOT_PENDING.into()))
        }
    }
}
