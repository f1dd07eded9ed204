use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Contact details shown on the public contact page.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ContactInfo {
    #[serde(skip_serializing)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub line: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial update; absent fields keep their value, empty strings clear
/// the optional ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub line: Option<String>,
}
