//! Authentication: password hashing, bearer tokens, and the route guard.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtConfig, LOGIN_TOKEN_TTL, REGISTRATION_TOKEN_TTL};
pub use middleware::jwt_auth;
pub use password::{hash_password, verify_password};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Password task failed: {0}")]
    Task(String),
}

impl AuthError {
    /// True for failures caused by the caller's credentials.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::MissingToken | AuthError::InvalidToken(_))
    }
}
