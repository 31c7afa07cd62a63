use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::{AppError, FieldErrors};

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Email address of the account to log into.
    #[schema(example = "admin@example.com")]
    pub email: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    let email = payload.email.trim();
    if email.is_empty() {
        errors.insert("email", "The email field is required".into());
    } else if !email_address::EmailAddress::is_valid(email) {
        errors.insert("email", "The email must be a valid email address".into());
    }
    if payload.password.is_empty() {
        errors.insert("password", "The password field is required".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidFields(errors))
    }
}

/// Successful login response. The same token is also set as the
/// `session` cookie.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: MeResponse,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    /// User ID.
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Administrator")]
    pub name: String,
    #[schema(example = "admin@example.com")]
    pub email: String,
    /// Admins may view, edit and delete every company.
    pub is_admin: bool,
}

impl From<user::Model> for MeResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}
