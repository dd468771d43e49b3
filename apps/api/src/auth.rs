//! Bearer-token authentication and tenant resolution.
//!
//! Tokens are HS256 JWTs issued by the auth provider; `sub` carries the user
//! id. The tenant comes from the user's profile row, never from the token.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The caller's identity plus the tenant every scoped query is filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    pub user_id: Uuid,
    pub customer_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies bearer tokens. Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["sub", "exp", "aud"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Returns the user id carried by a valid token.
    pub fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired".to_string())
                }
                _ => {
                    debug!("Rejected bearer token: {e}");
                    AppError::Unauthorized("Invalid token".to_string())
                }
            },
        )?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Token subject is not a user id".to_string()))
    }
}

/// Extracts the raw token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("Malformed authorization header".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "Expected a bearer token".to_string(),
        ));
    }
    Ok(token.trim())
}

/// Authenticated caller. The tenant may be missing for users not yet
/// attached to a customer; `tenant()` turns that into a 403.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub customer_id: Option<Uuid>,
}

impl AuthContext {
    pub fn tenant(&self) -> Result<TenantScope, AppError> {
        self.customer_id
            .map(|customer_id| TenantScope {
                user_id: self.user_id,
                customer_id,
            })
            .ok_or_else(|| AppError::Forbidden("No customer associated with this user".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers)?;
        let user_id = state.verifier.verify(token)?;
        let customer_id = state.store.customer_for_user(user_id).await?;
        Ok(AuthContext {
            user_id,
            customer_id,
        })
    }
}
