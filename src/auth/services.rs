use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::{
    auth::{password::verify_password, repo::UserRepo, repo_types::User},
    error::AppError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Resolves a username/password pair to its user. Unknown user and wrong
/// password are indistinguishable to the caller.
pub async fn authenticate<R: UserRepo + ?Sized>(
    users: &R,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let Some(user) = users.find_user_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}
