//! Authentication for the AI trading server
//!
//! Bearer tokens are validated on every protected route:
//! - HS256 JWT with signature and expiry checks
//! - the `sub` claim identifies the authenticated user
//! - an unconfigured signing secret fails closed

mod jwt;

pub use jwt::{generate_access_token, verify_token, Claims};

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::authorization::Bearer;
use headers::Authorization;

use crate::config::Settings;
use crate::error::AppError;

/// Extractor for the authenticated caller on protected routes.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub claims: Claims,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<Settings>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = Arc::<Settings>::from_ref(state);

        if !settings.auth_configured() {
            tracing::error!("JWT secret not configured - rejecting request");
            return Err(AppError::Unauthorized(
                "Authentication is not configured".to_string(),
            ));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Missing bearer credentials".to_string()))?;

        let claims = verify_token(&settings.jwt_secret, bearer.token())
            .map_err(|err| AppError::Unauthorized(format!("Invalid bearer token: {}", err)))?;

        Ok(AuthenticatedUser {
            user_id: claims.sub.clone(),
            claims,
        })
    }
}
