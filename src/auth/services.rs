use lazy_static::lazy_static;
use regex::Regex;

use super::{
    dto::{AuthResponse, RegisterRequest},
    jwt::JwtKeys,
    repo_types::User,
};
use crate::error::{AppError, AppResult};

lazy_static! {
    static ref MOBILE_RE: Regex = Regex::new(r"^0[689]\d{8}$").unwrap();
}

/// Local mobile number format accepted at registration.
pub(crate) fn is_valid_mobile(phone: &str) -> bool {
    MOBILE_RE.is_match(phone)
}

/// Checks the registration form. Username and phone are trimmed in place.
pub fn validate_registration(req: &mut RegisterRequest) -> AppResult<()> {
    req.username = req.username.trim().to_string();
    req.phone_number = req.phone_number.trim().to_string();

    let name_len = req.username.chars().count();
    if !(4..=50).contains(&name_len) {
        return Err(AppError::validation(
            "username",
            "username must be 4 to 50 characters",
        ));
    }
    let pass_len = req.password.chars().count();
    if !(6..=100).contains(&pass_len) {
        return Err(AppError::validation(
            "password",
            "password must be 6 to 100 characters",
        ));
    }
    if req.password != req.confirm_password {
        return Err(AppError::validation(
            "confirm_password",
            "passwords do not match",
        ));
    }
    if !is_valid_mobile(&req.phone_number) {
        return Err(AppError::validation(
            "phone_number",
            "phone number must be 10 digits starting with 06, 08 or 09",
        ));
    }
    Ok(())
}

/// Issues a fresh access/refresh pair for `user`.
pub fn issue_tokens(keys: &JwtKeys, user: User) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: user.into(),
    })
}

/// True when `err` wraps a unique-constraint violation from Postgres.
pub(crate) fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
