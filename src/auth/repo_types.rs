use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub username: String,             // login name
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub phone_number: String,         // contact number given at registration
    pub credits: i64,                 // balance, only grown by approved top-ups
    pub is_admin: bool,
    pub created_at: OffsetDateTime,   // creation timestamp
}
