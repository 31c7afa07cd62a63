use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::policy::Actor;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the cookie that carries the session token for browser clients.
pub const SESSION_COOKIE: &str = "session";

/// Authenticated user extracted from `Authorization: Bearer <token>` or,
/// failing that, the session cookie.
///
/// Add this as a handler parameter to require authentication.
/// Authorization happens via `policy::authorize()` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            is_admin: self.is_admin,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = match parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            Some(auth_header) => auth_header
                .strip_prefix("Bearer ")
                .ok_or(AppError::TokenInvalid)?
                .to_string(),
            None => CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or(AppError::TokenMissing)?,
        };

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
            is_admin: claims.admin,
        })
    }
}
