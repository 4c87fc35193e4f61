use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use common::errors::AppError;

use crate::handlers::AppState;

/// Resolve the bearer token to an enabled account and insert the
/// [`crate::store::User`] into the request extensions.
pub async fn require_active_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::auth("Not authenticated"))?;

    let claims = state.auth.decode_token(token)?;

    let user = state
        .users
        .find_by_username(&claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("Could not validate credentials"))?;

    if user.disabled {
        return Err(AppError::authorization("Inactive user"));
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
