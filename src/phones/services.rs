use std::collections::HashSet;

use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{ExportRequest, SaveOutcome, UploadPreview, PREVIEW_LEN},
    format::FileFormat,
    normalize::{is_canonical, normalize},
    readers,
    repo_types::{NewPhoneExport, PhoneExport},
    writers::{self, Artifact, ExportError},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::keys,
};

pub const MAX_SPLIT_SIZE: i64 = 1_000_000;
const MAX_FILE_NAME_CHARS: usize = 100;

/// Numbers that survive normalization and de-duplication, in first-seen order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SavePlan {
    pub new_numbers: Vec<String>,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Normalize `candidates`, drop repeats within the request, then drop numbers
/// already in `existing`.
pub fn plan_save(candidates: &[String], existing: &HashSet<String>) -> SavePlan {
    let mut plan = SavePlan::default();
    let mut seen = HashSet::with_capacity(candidates.len());
    for raw in candidates {
        let Some(n) = normalize(raw) else {
            plan.rejected += 1;
            continue;
        };
        if !seen.insert(n.clone()) || existing.contains(&n) {
            plan.duplicates += 1;
            continue;
        }
        plan.new_numbers.push(n);
    }
    plan
}

fn new_batch_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("batch_{millis}")
}

/// Store the new numbers among `candidates` for `user_id`.
pub async fn save_phones(
    st: &AppState,
    user_id: Uuid,
    candidates: &[String],
) -> AppResult<SaveOutcome> {
    if candidates.is_empty() {
        return Err(AppError::validation("phones", "phones must not be empty"));
    }
    if !st.phones.user_exists(user_id).await? {
        return Err(AppError::NotFound("user not found".into()));
    }

    // nothing valid at all is a bad request, independent of what is stored
    if candidates.iter().all(|c| normalize(c).is_none()) {
        return Err(AppError::nothing_to_save("no valid phone numbers to save"));
    }

    let existing = st.phones.existing_numbers(user_id).await?;
    let plan = plan_save(candidates, &existing);

    if plan.new_numbers.is_empty() {
        info!(%user_id, duplicates = plan.duplicates, "no new phone numbers");
        return Ok(SaveOutcome {
            inserted_count: 0,
            batch_id: None,
            rejected_count: plan.rejected,
            duplicate_count: plan.duplicates,
        });
    }

    let batch_id = new_batch_id();
    let inserted = st
        .phones
        .insert_batch(user_id, &batch_id, &plan.new_numbers)
        .await?;

    // a concurrent save may have stored some of these in the meantime
    let raced = plan.new_numbers.len() as u64 - inserted.min(plan.new_numbers.len() as u64);
    if raced > 0 {
        warn!(%user_id, raced, "numbers stored concurrently, skipped");
    }
    info!(%user_id, %batch_id, inserted, rejected = plan.rejected, "phones saved");

    Ok(SaveOutcome {
        inserted_count: inserted,
        batch_id: Some(batch_id),
        rejected_count: plan.rejected,
        duplicate_count: plan.duplicates + raced as usize,
    })
}

/// Parse an uploaded phone list and archive the original file.
pub async fn parse_upload(
    st: &AppState,
    user_id: Uuid,
    file_name: &str,
    content_type: Option<&str>,
    body: Bytes,
) -> AppResult<UploadPreview> {
    if body.len() > st.config.max_upload_bytes {
        warn!(%user_id, size = body.len(), "upload too large");
        return Err(AppError::validation(
            "file",
            format!(
                "file must not exceed {} MB",
                st.config.max_upload_bytes / (1024 * 1024)
            ),
        ));
    }
    let format = FileFormat::detect(Some(file_name), content_type).ok_or_else(|| {
        AppError::validation("file", "only Excel, CSV or TXT files are supported")
    })?;

    let data = body.clone();
    let outcome = tokio::task::spawn_blocking(move || readers::read(&data, format))
        .await
        .context("join reader task")?
        .map_err(|e| {
            warn!(%user_id, error = %e, "unreadable upload");
            AppError::validation("file", "file could not be read")
        })?;

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let key = keys::upload(user_id, millis, file_name);
    st.storage
        .put_object(&key, body, format.mime_type())
        .await
        .with_context(|| format!("put_object {}", key))?;

    info!(%user_id, accepted = outcome.accepted.len(), rejected = outcome.rejected, "upload parsed");
    Ok(UploadPreview {
        total_count: outcome.accepted.len(),
        rejected_count: outcome.rejected,
        preview: outcome.accepted.into_iter().take(PREVIEW_LEN).collect(),
        file_key: key,
    })
}

/// Validated export parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportParams {
    pub base_name: String,
    pub format: FileFormat,
    pub split_size: Option<usize>,
}

impl TryFrom<ExportRequest> for ExportParams {
    type Error = AppError;

    fn try_from(req: ExportRequest) -> Result<Self, Self::Error> {
        let base_name = clean_file_name(&req.file_name)?;
        let format = FileFormat::parse(&req.format)
            .ok_or_else(|| AppError::validation("format", "format must be xlsx, csv or txt"))?;
        let split_size = if req.split_files {
            let size = req
                .split_size
                .ok_or_else(|| AppError::validation("split_size", "split size is required"))?;
            if !(1..=MAX_SPLIT_SIZE).contains(&size) {
                return Err(AppError::validation(
                    "split_size",
                    format!("split size must be between 1 and {}", MAX_SPLIT_SIZE),
                ));
            }
            Some(size as usize)
        } else {
            None
        };
        Ok(Self {
            base_name,
            format,
            split_size,
        })
    }
}

fn clean_file_name(raw: &str) -> AppResult<String> {
    let name: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '"' | '/' | '\\') {
                '_'
            } else {
                c
            }
        })
        .collect();
    if name.is_empty() {
        return Err(AppError::validation("file_name", "file name is required"));
    }
    if name.chars().count() > MAX_FILE_NAME_CHARS {
        return Err(AppError::validation(
            "file_name",
            format!("file name must be at most {} characters", MAX_FILE_NAME_CHARS),
        ));
    }
    Ok(name)
}

fn export_error(e: ExportError) -> AppError {
    match e {
        ExportError::Empty => AppError::nothing_to_export("no phone numbers found"),
        ExportError::InvalidChunkSize => {
            AppError::validation("split_size", "split size must be at least 1")
        }
        ExportError::TooManyRows => AppError::validation(
            "split_size",
            "too many numbers for one worksheet, split the export",
        ),
        other => AppError::Internal(anyhow::Error::new(other).context("build export")),
    }
}

/// Build the export artifact for the user's stored numbers, keep a copy in
/// object storage and record it.
pub async fn export_phones(
    st: &AppState,
    user_id: Uuid,
    params: ExportParams,
) -> AppResult<(PhoneExport, Artifact)> {
    let numbers = st.phones.list_numbers(user_id).await?;
    if numbers.is_empty() {
        return Err(AppError::nothing_to_export("no phone numbers found"));
    }
    debug_assert!(numbers.iter().all(|n| is_canonical(n)));
    let total = numbers.len();

    let p = params.clone();
    let artifact = tokio::task::spawn_blocking(move || {
        writers::build_artifact(&numbers, p.format, &p.base_name, p.split_size)
    })
    .await
    .context("join writer task")?
    .map_err(export_error)?;

    let id = Uuid::new_v4();
    let ext = if artifact.part_count > 1 {
        "zip"
    } else {
        params.format.extension()
    };
    let key = keys::export(user_id, id, ext);
    st.storage
        .put_object(&key, Bytes::from(artifact.body.clone()), artifact.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let record = st
        .phones
        .record_export(NewPhoneExport {
            id,
            user_id,
            file_name: artifact.file_name.clone(),
            format: params.format.extension().to_string(),
            total_numbers: total as i64,
            part_count: artifact.part_count as i32,
            s3_key: key,
        })
        .await?;

    info!(%user_id, export_id = %id, total, parts = artifact.part_count, "phones exported");
    Ok((record, artifact))
}

/// Presigned URL of a previous export owned by `user_id`.
pub async fn export_download_url(st: &AppState, user_id: Uuid, id: Uuid) -> AppResult<String> {
    let export = st
        .phones
        .find_export(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("export not found".into()))?;
    let url = st
        .storage
        .presign_get(&export.s3_key, st.config.storage.presign_ttl_secs)
        .await
        .with_context(|| format!("presign url for s3_key {}", export.s3_key))?;
    Ok(url)
}
