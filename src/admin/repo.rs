use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// Dashboard counters for administrators.
#[derive(Debug, Serialize, FromRow)]
pub struct Summary {
    pub user_count: i64,
    pub phone_exports: i64,
    pub pending_topups: i64,
    pub total_credits: i64,
}

pub async fn load_summary(db: &PgPool) -> anyhow::Result<Summary> {
    let row = sqlx::query_as::<_, Summary>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users)                                    AS user_count,
            (SELECT COUNT(*) FROM phone_exports)                            AS phone_exports,
            (SELECT COUNT(*) FROM credit_topups WHERE status = 'pending')   AS pending_topups,
            (SELECT COALESCE(SUM(credits), 0)::BIGINT FROM users)           AS total_credits
        "#,
    )
    .fetch_one(db)
    .await
    .context("load admin summary")?;
    Ok(row)
}
