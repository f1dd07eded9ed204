use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a top-up. Only `Pending` may change, and only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "topup_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TopupStatus {
    Pending,
    Approved,
    Rejected,
}

/// Credit top-up request joined with the owner's username.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CreditTopup {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub amount: i64,
    #[serde(skip_serializing)]
    pub slip_image_key: String,
    pub status: TopupStatus,
    pub bank_account: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub transaction_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewTopup {
    pub user_id: Uuid,
    pub amount: i64,
    pub slip_image_key: String,
    pub bank_account: Option<String>,
    pub transaction_time: Option<OffsetDateTime>,
}

/// Account customers transfer money to before submitting a slip.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BankAccount {
    pub id: Uuid,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
}
