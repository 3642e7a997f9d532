//! POST /api/auth/login, /register, /logout
//!
//! Tokens are stateless HS256 JWTs; logout only acknowledges the request and
//! the client drops its token.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{duplicate_as_conflict, json_body};
use crate::api::state::AppState;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{Claims, LOGIN_TOKEN_TTL, REGISTRATION_TOKEN_TTL};
use crate::database::user_repository::DEFAULT_ROLE_ID;
use crate::database::NewUser;
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 4;
pub const EMAIL_DOMAIN: &str = "carbonnigrani.in";

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> Option<(String, String)> {
        let username = self.username.filter(|u| !u.trim().is_empty())?;
        let password = self.password.filter(|p| !p.is_empty())?;
        Some((username, password))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userData")]
    pub user_data: UserData,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub token: String,
    #[serde(rename = "userData")]
    pub user_data: UserData,
}

pub fn registration_email(username: &str) -> String {
    format!("{username}@{EMAIL_DOMAIN}")
}

pub async fn login(
    Extension(state): Extension<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let (username, password) = json_body(body)?
        .into_parts()
        .ok_or_else(|| AppError::BadRequest("Username and password are required".into()))?;

    let user = state
        .users
        .find_credentials(&username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !user.status {
        info!("Login refused for suspended user {}", user.username);
        return Err(AppError::AccountInactive);
    }

    if !verify_password_blocking(password, user.password_hash.clone()).await {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let claims = Claims::new(user.user_id, &user.username, &user.role_name, LOGIN_TOKEN_TTL);
    let token = state.jwt.issue(&claims)?;

    state.users.record_login(user.user_id).await?;
    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        user_data: UserData {
            id: user.user_id,
            username: user.username,
            email: user.email,
            role: user.role_name,
        },
    }))
}

pub async fn register(
    Extension(state): Extension<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (username, password) = json_body(body)?
        .into_parts()
        .ok_or_else(|| AppError::BadRequest("Username and password are required".into()))?;

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let new_user = NewUser {
        email: registration_email(&username),
        username,
        password_hash: hash_password_blocking(password).await?,
        role_id: DEFAULT_ROLE_ID,
    };

    let user_id = state
        .users
        .insert_user(&new_user)
        .await
        .map_err(duplicate_as_conflict)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User registration failed".into()))?;

    let claims = Claims::new(
        user.user_id,
        &user.username,
        &user.role_name,
        REGISTRATION_TOKEN_TTL,
    );
    let token = state.jwt.issue(&claims)?;
    info!("Registered user {} ({})", user.username, user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful",
            token,
            user_data: UserData {
                id: user.user_id,
                username: user.username,
                email: user.email,
                role: user.role_name,
            },
        }),
    ))
}

pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logout successfully" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_rejected() {
        let missing = CredentialsRequest {
            username: Some("asha".into()),
            password: None,
        };
        assert!(missing.into_parts().is_none());

        let blank = CredentialsRequest {
            username: Some("  ".into()),
            password: Some("secret".into()),
        };
        assert!(blank.into_parts().is_none());
    }

    #[test]
    fn email_is_derived_from_username() {
        assert_eq!(registration_email("asha"), "asha@carbonnigrani.in");
    }

    #[test]
    fn user_data_serializes_flat() {
        let body = LoginResponse {
            token: "t".into(),
            user_data: UserData {
                id: 3,
                username: "asha".into(),
                email: "asha@carbonnigrani.in".into(),
                role: "admin".into(),
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["userData"]["id"], 3);
        assert_eq!(value["userData"]["role"], "admin");
    }
}
