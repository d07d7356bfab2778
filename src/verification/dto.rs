use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub verification_email_sent: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerificationQuery {
    pub token: String,
}
