use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{BankAccount, CreditTopup, NewTopup};

/// Ledger persistence. `approve` and `reject` return `None` when the top-up
/// does not exist or is no longer pending; in that case nothing was changed.
#[async_trait]
pub trait CreditStore: Send + Sync {
    async fn insert_topup(&self, topup: NewTopup) -> anyhow::Result<CreditTopup>;

    /// Top-ups of one user, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<CreditTopup>>;

    /// All pending top-ups, newest first.
    async fn list_pending(&self) -> anyhow::Result<Vec<CreditTopup>>;

    /// Flip pending → approved and credit the owner, atomically.
    async fn approve(&self, id: Uuid) -> anyhow::Result<Option<CreditTopup>>;

    /// Flip pending → rejected. No balance effect.
    async fn reject(&self, id: Uuid) -> anyhow::Result<Option<CreditTopup>>;

    async fn balance(&self, user_id: Uuid) -> anyhow::Result<Option<i64>>;

    async fn list_bank_accounts(&self) -> anyhow::Result<Vec<BankAccount>>;
}

#[derive(Clone)]
pub struct PgCreditStore {
    db: PgPool,
}

impl PgCreditStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const TOPUP_COLUMNS: &str = "t.id, t.user_id, u.username, t.amount, t.slip_image_key, t.status, \
     t.bank_account, t.transaction_time, t.created_at, t.processed_at";

#[async_trait]
impl CreditStore for PgCreditStore {
    async fn insert_topup(&self, n: NewTopup) -> anyhow::Result<CreditTopup> {
        let sql = format!(
            r#"
            WITH t AS (
                INSERT INTO credit_topups (user_id, amount, slip_image_key, bank_account, transaction_time)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {TOPUP_COLUMNS}
              FROM t
              JOIN users u ON u.id = t.user_id
            "#
        );
        let row = sqlx::query_as::<_, CreditTopup>(&sql)
            .bind(n.user_id)
            .bind(n.amount)
            .bind(&n.slip_image_key)
            .bind(&n.bank_account)
            .bind(n.transaction_time)
            .fetch_one(&self.db)
            .await
            .context("insert topup")?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<CreditTopup>> {
        let sql = format!(
            r#"
            SELECT {TOPUP_COLUMNS}
              FROM credit_topups t
              JOIN users u ON u.id = t.user_id
             WHERE t.user_id = $1
             ORDER BY t.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, CreditTopup>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await
            .context("list topups by user")?;
        Ok(rows)
    }

    async fn list_pending(&self) -> anyhow::Result<Vec<CreditTopup>> {
        let sql = format!(
            r#"
            SELECT {TOPUP_COLUMNS}
              FROM credit_topups t
              JOIN users u ON u.id = t.user_id
             WHERE t.status = 'pending'
             ORDER BY t.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, CreditTopup>(&sql)
            .fetch_all(&self.db)
            .await
            .context("list pending topups")?;
        Ok(rows)
    }

    async fn approve(&self, id: Uuid) -> anyhow::Result<Option<CreditTopup>> {
        let mut tx = self.db.begin().await.context("begin approve tx")?;

        // the status guard makes a second concurrent approve match zero rows
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE credit_topups
                   SET status = 'approved', processed_at = now()
                 WHERE id = $1 AND status = 'pending'
                RETURNING *
            )
            SELECT {TOPUP_COLUMNS}
              FROM t
              JOIN users u ON u.id = t.user_id
            "#
        );
        let Some(topup) = sqlx::query_as::<_, CreditTopup>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("flip topup to approved")?
        else {
            tx.rollback().await.context("rollback approve tx")?;
            return Ok(None);
        };

        sqlx::query(r#"UPDATE users SET credits = credits + $1 WHERE id = $2"#)
            .bind(topup.amount)
            .bind(topup.user_id)
            .execute(&mut *tx)
            .await
            .context("credit user balance")?;

        tx.commit().await.context("commit approve tx")?;
        Ok(Some(topup))
    }

    async fn reject(&self, id: Uuid) -> anyhow::Result<Option<CreditTopup>> {
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE credit_topups
                   SET status = 'rejected', processed_at = now()
                 WHERE id = $1 AND status = 'pending'
                RETURNING *
            )
            SELECT {TOPUP_COLUMNS}
              FROM t
              JOIN users u ON u.id = t.user_id
            "#
        );
        let row = sqlx::query_as::<_, CreditTopup>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("flip topup to rejected")?;
        Ok(row)
    }

    async fn balance(&self, user_id: Uuid) -> anyhow::Result<Option<i64>> {
        let credits: Option<i64> =
            sqlx::query_scalar(r#"SELECT credits FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await
                .context("read balance")?;
        Ok(credits)
    }

    async fn list_bank_accounts(&self) -> anyhow::Result<Vec<BankAccount>> {
        let rows = sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT id, bank_name, account_name, account_number
              FROM bank_accounts
             WHERE is_active
             ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list bank accounts")?;
        Ok(rows)
    }
}
