use crate::auth::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by login name.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, phone_number, credits, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Load a user by id; the balance is always read fresh.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, phone_number, credits, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. Starts with no credits.
    pub async fn create(
        db: &PgPool,
        username: &str,
        password_hash: &str,
        phone_number: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, phone_number)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, phone_number, credits, is_admin, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(phone_number)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}
