use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{auth::repo::UserRepo, businesses::repo::BusinessRepo, products::repo::ProductRepo};

/// Everything the handlers need from persistence.
pub trait Store: UserRepo + BusinessRepo + ProductRepo {}

impl<T> Store for T where T: UserRepo + BusinessRepo + ProductRepo {}

/// A unique constraint rejected the write.
#[derive(Debug, thiserror::Error)]
#[error("{0} already exists")]
pub struct AlreadyExists(pub &'static str);

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Turns a unique violation into [`AlreadyExists`], anything else into a
/// contextualized error.
pub(crate) fn map_unique(e: sqlx::Error, what: &'static str) -> anyhow::Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AlreadyExists(what).into(),
        _ => anyhow::Error::new(e).context(format!("write {what}")),
    }
}
