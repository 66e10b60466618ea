//! Authentication middleware for bearer token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{error::ApiError, state::AppState};

/// Authenticated principal, inserted into the request for protected handlers
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Authentication middleware
///
/// Rejects the request with 401 when the `Authorization: Bearer` header is
/// missing or malformed, or the token does not validate.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state.auth_service.verify_token(bearer.token())?;

    req.extensions_mut().insert(AuthUser {
        id: claims.user_id,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
