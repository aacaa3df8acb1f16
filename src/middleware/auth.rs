//! Middleware de autenticación JWT
//!
//! Este módulo maneja la extracción y verificación del token Bearer e
//! inyecta el `AuthenticatedUser` en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{
    models::user::AuthenticatedUser,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.config.jwt_secret)?;
    let user = AuthenticatedUser::try_from(claims)?;

    debug!("🔐 Usuario {} autenticado ({})", user.user_id, user.role.as_str());
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
