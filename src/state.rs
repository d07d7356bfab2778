use std::sync::Arc;

use tracing::warn;

use crate::{
    auth::jwt::JwtKeys,
    config::AppConfig,
    email::{Mailer, SmtpMailer},
    storage::{Storage, StorageClient},
    store::{PgStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let keys = JwtKeys::new(&config.jwt)?;

        let store = PgStore::connect(&config.database_url).await?;
        if let Err(e) = store.migrate().await {
            warn!(error = %e, "migration failed; continuing");
        }

        let storage = Storage::new(&config.storage).await?;
        if let Err(e) = storage.ensure_bucket().await {
            warn!(error = %e, bucket = %config.storage.bucket, "bucket check failed; continuing");
        }
        let storage = Arc::new(storage) as Arc<dyn StorageClient>;
        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?) as Arc<dyn Mailer>;

        Ok(Self {
            store: Arc::new(store),
            config,
            keys,
            storage,
            mailer,
        })
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        mailer: Arc<dyn Mailer>,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(&config.jwt)?;
        Ok(Self {
            store,
            config,
            keys,
            storage,
            mailer,
        })
    }
}
