use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OAuth2 password-grant form body; extra form fields are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Public profile of the signed-in user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub verified: bool,
    pub joined_date: String,
    pub logo: Option<String>,
}
