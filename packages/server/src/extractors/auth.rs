use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Site editor authenticated by `Authorization: Bearer <token>`.
///
/// Add this as a handler parameter to require the configured admin token.
/// Extraction also runs the gated protection check, so any admin activity
/// keeps the protected directory in shape.
pub struct AdminUser;

/// Compare without short-circuiting on the first differing byte.
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let expected = &state.config.auth.admin_token;
        if expected.is_empty() || !token_matches(token, expected) {
            return Err(AppError::TokenInvalid);
        }

        state.scheduler.tick().await;

        Ok(AdminUser)
    }
}
