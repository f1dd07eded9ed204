use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A finished export, kept so the artifact can be downloaded again.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PhoneExport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub format: String,
    pub total_numbers: i64,
    pub part_count: i32,
    #[serde(skip_serializing)]
    pub s3_key: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPhoneExport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub format: String,
    pub total_numbers: i64,
    pub part_count: i32,
    pub s3_key: String,
}
