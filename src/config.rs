use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// `None` means session tokens carry no `exp` claim.
    pub session_ttl_minutes: Option<i64>,
    pub verification_ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Base used to build links sent by email, e.g. `https://shop.example.com`.
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "easyshop".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "easyshop-users".into()),
            session_ttl_minutes: parse_var("JWT_SESSION_TTL_MINUTES"),
            verification_ttl_minutes: parse_var("JWT_VERIFICATION_TTL_MINUTES"),
        };

        let smtp_username = std::env::var("SMTP_USERNAME").context("SMTP_USERNAME")?;
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            port: parse_var("SMTP_PORT").unwrap_or(587),
            password: std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD")?,
            from_address: std::env::var("MAIL_FROM").unwrap_or_else(|_| smtp_username.clone()),
            username: smtp_username,
            timeout_secs: parse_var("EMAIL_TIMEOUT_SECS").unwrap_or(10),
        };

        let storage = StorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT").context("MINIO_ENDPOINT")?,
            bucket: std::env::var("MINIO_BUCKET").context("MINIO_BUCKET")?,
            access_key: std::env::var("MINIO_ACCESS_KEY").context("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY").context("MINIO_SECRET_KEY")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        Ok(Self {
            database_url,
            public_base_url,
            jwt,
            smtp,
            storage,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}
