use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CountResponse, ExportRequest, SaveOutcome, SavePhonesRequest, UploadPreview},
    repo_types::PhoneExport,
    services::{self, ExportParams},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

// a full spreadsheet of numbers sent back as JSON
const SAVE_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/phones/count", get(count_phones))
        .route("/phones/exports", get(list_exports))
        .route("/phones/exports/:id/download", get(download_export))
}

/// `body_limit` caps the multipart upload; see `AppConfig::multipart_body_limit`.
pub fn write_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/phones/upload", post(upload_phones))
        .layer(DefaultBodyLimit::max(body_limit))
        .route(
            "/phones/save",
            post(save_phones).layer(DefaultBodyLimit::max(SAVE_BODY_LIMIT)),
        )
        .route("/phones/export", post(export_phones))
}

/// POST /phones/upload (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload_phones(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<UploadPreview>> {
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        let preview =
            services::parse_upload(&state, user_id, &file_name, content_type.as_deref(), data)
                .await?;
        return Ok(Json(preview));
    }
    Err(AppError::validation("file", "please upload a file"))
}

/// POST /phones/save { phones: [...] }
#[instrument(skip(state, body))]
pub async fn save_phones(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SavePhonesRequest>,
) -> AppResult<Json<SaveOutcome>> {
    let outcome = services::save_phones(&state, user_id, &body.phones).await?;
    Ok(Json(outcome))
}

#[instrument(skip(state))]
pub async fn count_phones(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<CountResponse>> {
    let count = state.phones.count(user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /phones/export: responds with the file (or zip of parts) itself.
#[instrument(skip(state, body))]
pub async fn export_phones(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ExportRequest>,
) -> AppResult<impl IntoResponse> {
    let params = ExportParams::try_from(body)?;
    let (record, artifact) = services::export_phones(&state, user_id, params).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(artifact.content_type),
    );
    let disposition = content_disposition(&artifact.file_name);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| AppError::Internal(e.into()))?,
    );
    headers.insert(
        "x-export-id",
        HeaderValue::from_str(&record.id.to_string()).map_err(|e| AppError::Internal(e.into()))?,
    );
    Ok((StatusCode::OK, headers, artifact.body))
}

#[instrument(skip(state))]
pub async fn list_exports(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<PhoneExport>>> {
    Ok(Json(state.phones.list_exports(user_id).await?))
}

/// 307 → presigned url of a stored export
#[instrument(skip(state))]
pub async fn download_export(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    let url = services::export_download_url(&state, user_id, id).await?;
    Ok(Redirect::temporary(&url))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "bad multipart body");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::validation("file", "file is too large")
    } else {
        AppError::validation("file", "invalid upload")
    }
}

/// `attachment; filename="..."`, with an RFC 5987 `filename*` when the name
/// is not plain ASCII.
pub(crate) fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' { c } else { '_' })
        .collect();
    if ascii == file_name {
        return format!("attachment; filename=\"{}\"", ascii);
    }
    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", ascii, encoded)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, extract::FromRef, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::jwt::JwtKeys, config::DEFAULT_MAX_UPLOAD_BYTES, credits::memory::MemoryCreditStore,
        phones::memory::MemoryPhoneStore, storage::fake::FakeStorage,
    };

    fn app_for(user_id: Uuid) -> (Router, String) {
        let phones = Arc::new(MemoryPhoneStore::with_user(user_id));
        let st = AppState::fake_with(
            phones,
            Arc::new(MemoryCreditStore::default()),
            Arc::new(FakeStorage::default()),
        );
        let token = JwtKeys::from_ref(&st).sign_access(user_id).unwrap();
        let app = Router::new()
            .merge(read_routes())
            .merge(write_routes(DEFAULT_MAX_UPLOAD_BYTES + 1024 * 1024))
            .with_state(st);
        (app, token)
    }

    fn json_post(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn content_disposition_ascii_and_unicode() {
        assert_eq!(
            content_disposition("leads.csv"),
            "attachment; filename=\"leads.csv\""
        );
        assert_eq!(
            content_disposition("เบอร์.txt"),
            "attachment; filename=\"_____.txt\"; filename*=UTF-8''%E0%B9%80%E0%B8%9A%E0%B8%AD%E0%B8%A3%E0%B9%8C.txt"
        );
    }

    #[tokio::test]
    async fn save_then_export_csv_download() {
        let user = Uuid::new_v4();
        let (app, token) = app_for(user);

        let res = app
            .clone()
            .oneshot(json_post(
                "/phones/save",
                &token,
                serde_json::json!({ "phones": ["0812345678", "812345679", "x"] }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(json_post(
                "/phones/export",
                &token,
                serde_json::json!({ "file_name": "leads", "format": "csv" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"leads.csv\""
        );
        assert!(res.headers().contains_key("x-export-id"));
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"0812345678\n0812345679");
    }

    #[tokio::test]
    async fn export_without_numbers_is_not_found() {
        let user = Uuid::new_v4();
        let (app, token) = app_for(user);
        let res = app
            .oneshot(json_post(
                "/phones/export",
                &token,
                serde_json::json!({ "file_name": "leads", "format": "txt" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn requests_without_token_are_rejected() {
        let user = Uuid::new_v4();
        let (app, _) = app_for(user);
        let res = app
            .oneshot(Request::builder().uri("/phones/count").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_body_limit_follows_router_argument() {
        let user = Uuid::new_v4();
        let st = AppState::fake_with(
            Arc::new(MemoryPhoneStore::with_user(user)),
            Arc::new(MemoryCreditStore::default()),
            Arc::new(FakeStorage::default()),
        );
        let token = JwtKeys::from_ref(&st).sign_access(user).unwrap();
        let app = write_routes(1024).with_state(st);

        let boundary = "XBOUNDARYX";
        let lines = "0812345678\n".repeat(200);
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"list.txt\"\r\nContent-Type: text/plain\r\n\r\n{lines}\r\n--{b}--\r\n",
            b = boundary
        );
        let req = Request::builder()
            .method("POST")
            .uri("/phones/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["field"], "file");
        assert_eq!(json["error"], "file is too large");
    }

    #[tokio::test]
    async fn upload_multipart_txt() {
        let user = Uuid::new_v4();
        let (app, token) = app_for(user);
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"list.txt\"\r\nContent-Type: text/plain\r\n\r\n0812345678\n0898765432\n12\r\n--{b}--\r\n",
            b = boundary
        );
        let req = Request::builder()
            .method("POST")
            .uri("/phones/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["total_count"], 2);
        assert_eq!(json["rejected_count"], 1);
        assert_eq!(json["preview"][1], "0898765432");
    }
}
