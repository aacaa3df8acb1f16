//! Usuario autenticado y roles
//!
//! Los usuarios viven fuera de este servicio; aquí solo llegan por el JWT.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Mechanic,
    Receptionist,
}

impl UserRole {
    /// Roles con acceso a borrados físicos
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Mechanic => "mechanic",
            UserRole::Receptionist => "receptionist",
        }
    }
}

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role '{}' cannot perform this action",
                self.role.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_path_roles() {
        let user = |role| AuthenticatedUser { user_id: Uuid::new_v4(), role };
        assert!(user(UserRole::Admin).require_admin().is_ok());
        assert!(user(UserRole::Manager).require_admin().is_ok());
        assert!(matches!(
            user(UserRole::Mechanic).require_admin(),
            Err(AppError::Forbidden(_))
        ));
        assert!(user(UserRole::Receptionist).require_admin().is_err());
    }
}
