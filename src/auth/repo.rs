use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    businesses::repo_types::{default_business_name, Business, BUSINESS_NAME_ATTEMPTS},
    store::{map_unique, AlreadyExists, PgStore},
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Inserts the user and its business together; either both exist
    /// afterwards or neither does. The business is named after the username,
    /// with a numeric suffix when that name is already taken.
    async fn create_account(&self, new_user: NewUser) -> anyhow::Result<(User, Business)>;

    /// Sets `is_verified`; returns `None` when the user does not exist.
    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_verified, join_date
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user")?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_verified, join_date
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_verified, join_date
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create_account(&self, new_user: NewUser) -> anyhow::Result<(User, Business)> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, is_verified, join_date
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique(e, "account"))?;

        let mut business = None;
        for attempt in 1..=BUSINESS_NAME_ATTEMPTS {
            let name = default_business_name(&user.username, attempt);
            business = sqlx::query_as::<_, Business>(
                r#"
                INSERT INTO businesses (owner_id, business_name)
                VALUES ($1, $2)
                ON CONFLICT (business_name) DO NOTHING
                RETURNING id, owner_id, business_name, city, region, business_description, logo
                "#,
            )
            .bind(user.id)
            .bind(&name)
            .fetch_optional(&mut *tx)
            .await
            .context("insert business")?;
            if business.is_some() {
                break;
            }
        }
        let Some(business) = business else {
            return Err(AlreadyExists("business").into());
        };

        tx.commit().await.context("commit tx")?;
        Ok((user, business))
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET is_verified = TRUE
             WHERE id = $1
            RETURNING id, username, email, password_hash, is_verified, join_date
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("mark user verified")?;
        Ok(user)
    }
}
