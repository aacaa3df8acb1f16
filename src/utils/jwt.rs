//! Utilidades JWT
//!
//! Este módulo contiene funciones helper para emitir y verificar tokens.
//! Los tokens los emite el servicio de identidad; `generate_token` se usa
//! en herramientas internas y tests.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{AuthenticatedUser, UserRole};
use crate::utils::errors::AppError;

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("ID de usuario inválido".to_string()))?;
        Ok(AuthenticatedUser {
            user_id,
            role: claims.role,
        })
    }
}

/// Generar JWT token para un usuario
///
/// La API no emite tokens: los firma el proveedor de identidad con el mismo
/// secreto. Esto solo sirve para desarrollo local y para los tests.
pub fn generate_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    expires_in: chrono::Duration,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: (now + expires_in).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Error generando token: {}", e)))
}

/// Verificar y decodificar JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))?;

    Ok(token_data.claims)
}

/// Extraer token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Header Authorization debe comenzar con 'Bearer '".to_string()))?
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Token no puede estar vacío".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_roundtrip_keeps_role() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, UserRole::Mechanic, SECRET, chrono::Duration::hours(1)).unwrap();
        let user = AuthenticatedUser::try_from(verify_token(&token, SECRET).unwrap()).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, UserRole::Mechanic);
    }

    #[test]
    fn test_wrong_secret_and_expired_tokens_are_rejected() {
        let token = generate_token(Uuid::new_v4(), UserRole::Admin, SECRET, chrono::Duration::hours(1)).unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(AppError::Unauthorized(_))));

        let expired = generate_token(Uuid::new_v4(), UserRole::Admin, SECRET, chrono::Duration::hours(-2)).unwrap();
        assert!(verify_token(&expired, SECRET).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_token_from_header("Basic xyz").is_err());
        assert!(extract_token_from_header("Bearer ").is_err());
    }
}
