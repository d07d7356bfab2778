use std::time::Duration;

use anyhow::Context;
use askama::Template;
use tracing::{debug, error, info, warn};

use crate::{
    auth::{
        claims::TokenKind,
        password::hash_password,
        repo::UserRepo,
        repo_types::{NewUser, User},
        services::is_valid_email,
    },
    businesses::repo_types::Business,
    email::OutgoingEmail,
    error::AppError,
    state::AppState,
    validation::bounded,
    verification::dto::RegisterRequest,
};

pub const VERIFICATION_SUBJECT: &str = "EasyShop Account Verification Email";
const MAX_USERNAME_LEN: usize = 20;
const MAX_EMAIL_LEN: usize = 200;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmail<'a> {
    username: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "verification.html")]
pub struct VerifiedPage<'a> {
    pub username: &'a str,
}

/// Outcome of a registration: the account always exists afterwards, the email
/// may not have gone out.
#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub business: Business,
    pub email_sent: bool,
}

pub async fn register_account(
    st: &AppState,
    input: RegisterRequest,
) -> Result<Registration, AppError> {
    let username =
        bounded("username", &input.username, MAX_USERNAME_LEN).map_err(AppError::BadRequest)?;
    let email = bounded("email", &input.email, MAX_EMAIL_LEN)
        .map_err(AppError::BadRequest)?
        .to_lowercase();

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password too short".into()));
    }

    if st.store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".into()));
    }
    if st.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&input.password)?;
    provision_account(
        st,
        NewUser {
            username,
            email,
            password_hash,
        },
    )
    .await
}

/// Creates the user with its business, then dispatches the verification
/// email. Runs exactly once per created user.
pub async fn provision_account(st: &AppState, new_user: NewUser) -> Result<Registration, AppError> {
    let (user, business) = st.store.create_account(new_user).await?;
    info!(user_id = %user.id, business_id = %business.id, "account provisioned");

    let email_sent = match send_verification_email(st, &user).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "verification email not sent");
            false
        }
    };

    Ok(Registration {
        user,
        business,
        email_sent,
    })
}

pub async fn send_verification_email(st: &AppState, user: &User) -> anyhow::Result<()> {
    let token = st.keys.sign_verification(user.id, &user.username)?;
    let link = format!("{}/verification?token={}", st.config.public_base_url, token);
    let html_body = VerificationEmail {
        username: &user.username,
        link: &link,
    }
    .render()
    .context("render verification email")?;

    let email = OutgoingEmail {
        recipients: vec![user.email.clone()],
        subject: VERIFICATION_SUBJECT.into(),
        html_body,
    };
    let limit = Duration::from_secs(st.config.smtp.timeout_secs);
    tokio::time::timeout(limit, st.mailer.send(email))
        .await
        .context("verification email timed out")??;

    debug!(user_id = %user.id, "verification email dispatched");
    Ok(())
}

/// Consumes a verification token. Verifying an already verified user is not
/// an error.
pub async fn complete_verification(st: &AppState, token: &str) -> Result<User, AppError> {
    let claims = st
        .keys
        .validate_kind(token, TokenKind::Verification)
        .map_err(|e| {
            warn!(error = %e, "verification token rejected");
            AppError::InvalidToken
        })?;

    let Some(user) = st.store.find_user(claims.sub).await? else {
        warn!(user_id = %claims.sub, "verification token for unknown user");
        return Err(AppError::InvalidToken);
    };
    if user.is_verified {
        debug!(user_id = %user.id, "user already verified");
        return Ok(user);
    }

    let user = st
        .store
        .mark_verified(user.id)
        .await?
        .ok_or(AppError::InvalidToken)?;
    info!(user_id = %user.id, "user verified");
    Ok(user)
}

/// Sends a new verification email unless the user is verified already.
/// Returns whether an email went out.
pub async fn resend_verification(st: &AppState, user: &User) -> Result<bool, AppError> {
    if user.is_verified {
        return Ok(false);
    }
    send_verification_email(st, user).await?;
    Ok(true)
}
