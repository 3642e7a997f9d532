//! Bearer-token guard for protected routes.
//!
//! On success the verified [`Claims`] are inserted as a request extension so
//! handlers can take `Extension<Claims>`.

use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::debug;

use super::{AuthError, Claims, JwtConfig};
use crate::error::AppError;

pub async fn jwt_auth(
    Extension(jwt): Extension<JwtConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AuthError::MissingToken)?;

    let claims: Claims = jwt.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        e
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
