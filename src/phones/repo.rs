use std::collections::HashSet;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewPhoneExport, PhoneExport};

/// Persistence for stored phone numbers and their exports.
#[async_trait]
pub trait PhoneStore: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> anyhow::Result<bool>;

    async fn existing_numbers(&self, user_id: Uuid) -> anyhow::Result<HashSet<String>>;

    /// Insert `numbers` under `batch_id`. Numbers already stored for the user
    /// are skipped silently; returns how many rows were actually written.
    async fn insert_batch(
        &self,
        user_id: Uuid,
        batch_id: &str,
        numbers: &[String],
    ) -> anyhow::Result<u64>;

    /// All numbers of a user in insertion order.
    async fn list_numbers(&self, user_id: Uuid) -> anyhow::Result<Vec<String>>;

    async fn count(&self, user_id: Uuid) -> anyhow::Result<i64>;

    async fn record_export(&self, export: NewPhoneExport) -> anyhow::Result<PhoneExport>;

    async fn list_exports(&self, user_id: Uuid) -> anyhow::Result<Vec<PhoneExport>>;

    async fn find_export(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<PhoneExport>>;
}

#[derive(Clone)]
pub struct PgPhoneStore {
    db: PgPool,
}

impl PgPhoneStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PhoneStore for PgPhoneStore {
    async fn user_exists(&self, user_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)"#)
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .context("check user exists")?;
        Ok(exists)
    }

    async fn existing_numbers(&self, user_id: Uuid) -> anyhow::Result<HashSet<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar(r#"SELECT number FROM phone_numbers WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_all(&self.db)
                .await
                .context("load existing numbers")?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_batch(
        &self,
        user_id: Uuid,
        batch_id: &str,
        numbers: &[String],
    ) -> anyhow::Result<u64> {
        // WITH ORDINALITY keeps the id sequence in request order
        let res = sqlx::query(
            r#"
            INSERT INTO phone_numbers (user_id, number, batch_id)
            SELECT $1, n.number, $2
              FROM unnest($3::text[]) WITH ORDINALITY AS n(number, ord)
             ORDER BY n.ord
            ON CONFLICT (user_id, number) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(batch_id)
        .bind(numbers)
        .execute(&self.db)
        .await
        .context("insert phone batch")?;
        Ok(res.rows_affected())
    }

    async fn list_numbers(&self, user_id: Uuid) -> anyhow::Result<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT number
              FROM phone_numbers
             WHERE user_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list phone numbers")?;
        Ok(rows)
    }

    async fn count(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM phone_numbers WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .context("count phone numbers")?;
        Ok(n)
    }

    async fn record_export(&self, e: NewPhoneExport) -> anyhow::Result<PhoneExport> {
        let row = sqlx::query_as::<_, PhoneExport>(
            r#"
            INSERT INTO phone_exports (id, user_id, file_name, format, total_numbers, part_count, s3_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, file_name, format, total_numbers, part_count, s3_key, created_at
            "#,
        )
        .bind(e.id)
        .bind(e.user_id)
        .bind(&e.file_name)
        .bind(&e.format)
        .bind(e.total_numbers)
        .bind(e.part_count)
        .bind(&e.s3_key)
        .fetch_one(&self.db)
        .await
        .context("insert phone export")?;
        Ok(row)
    }

    async fn list_exports(&self, user_id: Uuid) -> anyhow::Result<Vec<PhoneExport>> {
        let rows = sqlx::query_as::<_, PhoneExport>(
            r#"
            SELECT id, user_id, file_name, format, total_numbers, part_count, s3_key, created_at
              FROM phone_exports
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list phone exports")?;
        Ok(rows)
    }

    async fn find_export(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<PhoneExport>> {
        let row = sqlx::query_as::<_, PhoneExport>(
            r#"
            SELECT id, user_id, file_name, format, total_numbers, part_count, s3_key, created_at
              FROM phone_exports
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find phone export")?;
        Ok(row)
    }
}
