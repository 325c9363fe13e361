//! Acting-user resolution for the HTTP boundary.
//!
//! Session management lives outside this node; callers identify
//! themselves with the `x-pantry-user` header carrying a username. The
//! resolved [`User`] is passed explicitly into every service call, so
//! no handler reads ambient actor state.

use axum::{extract::FromRequestParts, http::request::Parts};
use pantry_types::User;

use crate::api::{ApiError, AppState};

/// Header naming the acting user.
pub const IDENTITY_HEADER: &str = "x-pantry-user";

/// Extractor for the acting user on routes that mutate state.
///
/// Rejects with `401 authentication required` when the header is
/// missing or names an unknown user.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let user = state
            .registry
            .users
            .get_by_username(username)
            .ok_or(ApiError::Unauthorized)?;

        Ok(CurrentUser(user))
    }
}
