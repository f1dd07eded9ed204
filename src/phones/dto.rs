use serde::{Deserialize, Serialize};

/// Numbers shown back to the user after an upload.
pub const PREVIEW_LEN: usize = 10;

#[derive(Debug, Serialize)]
pub struct UploadPreview {
    pub total_count: usize,
    pub rejected_count: usize,
    pub preview: Vec<String>,
    pub file_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SavePhonesRequest {
    #[serde(default)]
    pub phones: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SaveOutcome {
    pub inserted_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub rejected_count: usize,
    pub duplicate_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub split_files: bool,
    pub split_size: Option<i64>,
}

