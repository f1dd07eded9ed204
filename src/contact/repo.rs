use anyhow::Context;
use sqlx::PgPool;

use super::dto::ContactInfo;

impl ContactInfo {
    /// The single contact row, if one was ever saved.
    pub async fn get(db: &PgPool) -> anyhow::Result<Option<ContactInfo>> {
        let row = sqlx::query_as::<_, ContactInfo>(
            r#"
            SELECT id, title, description, phone, email, line, updated_at
              FROM contact_info
             ORDER BY updated_at DESC
             LIMIT 1
            "#,
        )
        .fetch_optional(db)
        .await
        .context("load contact info")?;
        Ok(row)
    }

    /// Write `self` back, inserting the row on first save.
    pub async fn save(&self, db: &PgPool) -> anyhow::Result<ContactInfo> {
        let row = sqlx::query_as::<_, ContactInfo>(
            r#"
            INSERT INTO contact_info (id, title, description, phone, email, line, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE
               SET title = EXCLUDED.title,
                   description = EXCLUDED.description,
                   phone = EXCLUDED.phone,
                   email = EXCLUDED.email,
                   line = EXCLUDED.line,
                   updated_at = now()
            RETURNING id, title, description, phone, email, line, updated_at
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.phone)
        .bind(&self.email)
        .bind(&self.line)
        .fetch_one(db)
        .await
        .context("save contact info")?;
        Ok(row)
    }
}
