use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Claims expected from the identity provider. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// The authenticated caller, available to handlers as an extension
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    let claims = token_data.claims;
    if let Some(iat) = claims.iat {
        let age = Utc::now().timestamp().saturating_sub(iat);
        let max_age = i64::try_from(state.auth.max_age_seconds).unwrap_or(i64::MAX);
        if age > max_age {
            return Err(AppError::AuthenticationError("Token too old".to_string()));
        }
    }

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("Token subject is not a user id".to_string()))?;

    req.extensions_mut().insert(AuthUser { id });

    Ok(next.run(req).await)
}
