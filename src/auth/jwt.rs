use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::{Claims, TokenKind},
    config::JwtConfig,
};

/// Signing and verification keys, built once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    session_ttl: Option<Duration>,
    verification_ttl: Option<Duration>,
}

fn ttl(minutes: Option<i64>) -> Option<Duration> {
    minutes
        .filter(|m| *m > 0)
        .map(|m| Duration::from_secs(m as u64 * 60))
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(!config.secret.is_empty(), "jwt secret is empty");
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            session_ttl: ttl(config.session_ttl_minutes),
            verification_ttl: ttl(config.verification_ttl_minutes),
        })
    }

    fn sign_with_kind(
        &self,
        user_id: Uuid,
        username: &str,
        kind: TokenKind,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.session_ttl,
            TokenKind::Verification => self.verification_ttl,
        };
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: ttl.map(|ttl| (now.unix_timestamp() as u64 + ttl.as_secs()) as usize),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        self.issue(&claims)
    }

    /// Signs an arbitrary claim set with HS256.
    pub fn issue(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?;
        debug!(user_id = %claims.sub, kind = ?claims.kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, username, TokenKind::Access)
    }

    pub fn sign_verification(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, username, TokenKind::Verification)
    }

    /// Checks signature, issuer and audience. `exp` is enforced only when the
    /// token carries one.
    pub fn validate(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn validate_kind(&self, token: &str, kind: TokenKind) -> anyhow::Result<Claims> {
        let claims = self.validate(token)?;
        if claims.kind != kind {
            anyhow::bail!("expected {kind:?} token, got {:?}", claims.kind);
        }
        Ok(claims)
    }
}
