//! User Repository
//!
//! Queries over `users` joined to `roles`. Password hashes never leave this
//! module except through [`UserCredentials`], which is only used by login.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// Role given to self-registered users.
pub const DEFAULT_ROLE_ID: i32 = 1;

const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.role_id, r.role_name, u.status, \
     u.last_login, to_char(u.updated_at, 'YYYY-MM-DD HH24:MI:SS') AS updated_at";

/// A user as returned by the management endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role_id: i32,
    pub role_name: String,
    /// `false` means the account is suspended.
    pub status: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub status: bool,
    pub role_name: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
}

#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role_id: i32,
    pub status: bool,
    /// Replaces the stored hash when present.
    pub password_hash: Option<String>,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

/// `SELECT <user columns>` over `source` (aliased `u`) joined to roles.
fn select_users(source: &str, tail: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM {source} u JOIN roles r ON u.role_id = r.role_id {tail}")
}

/// Run a data-modifying `statement` ending in `RETURNING *` and select the
/// changed row with its role name.
fn select_changed_user(statement: &str) -> String {
    format!("WITH changed AS ({statement}) {}", select_users("changed", ""))
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let query = select_users("users", "ORDER BY u.user_id");
        sqlx::query_as::<_, UserRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")
    }

    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<UserRecord>> {
        let query = select_users("users", "WHERE u.user_id = $1");
        sqlx::query_as::<_, UserRecord>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")
    }

    pub async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.user_id, u.username, u.email, u.password_hash, u.status, r.role_name
            FROM users u
            JOIN roles r ON u.role_id = r.role_id
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user credentials")
    }

    /// Insert a user and return the new id.
    pub async fn insert_user(&self, user: &NewUser) -> Result<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (username, email, password_hash, role_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING user_id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert user")
    }

    pub async fn update_user(&self, update: &UpdateUser) -> Result<Option<UserRecord>> {
        let query = select_changed_user(
            r#"
            UPDATE users
            SET username = $1,
                email = $2,
                role_id = $3,
                status = $4,
                password_hash = COALESCE($5, password_hash),
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $6
            RETURNING *
            "#,
        );
        sqlx::query_as::<_, UserRecord>(&query)
            .bind(&update.username)
            .bind(&update.email)
            .bind(update.role_id)
            .bind(update.status)
            .bind(update.password_hash.as_deref())
            .bind(update.user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update user")
    }

    pub async fn set_status(&self, user_id: i32, status: bool) -> Result<Option<UserRecord>> {
        let query = select_changed_user(
            r#"
            UPDATE users
            SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2
            RETURNING *
            "#,
        );
        sqlx::query_as::<_, UserRecord>(&query)
            .bind(status)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update user status")
    }

    /// Returns `false` when no such user exists.
    pub async fn delete_user(&self, user_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn record_login(&self, user_id: i32) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to record login")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_joins_roles() {
        let query = select_users("users", "WHERE u.user_id = $1");
        assert!(query.starts_with("SELECT u.user_id, u.username"));
        assert!(query.contains("FROM users u JOIN roles r ON u.role_id = r.role_id"));
        assert!(query.ends_with("WHERE u.user_id = $1"));
    }

    #[test]
    fn changed_row_is_selected_through_a_cte() {
        let query =
            select_changed_user("UPDATE users SET status = $1 WHERE user_id = $2 RETURNING *");

        assert!(query.starts_with(
            "WITH changed AS (UPDATE users SET status = $1 WHERE user_id = $2 RETURNING *) SELECT"
        ));
        assert!(query.contains("FROM changed u JOIN roles r"));
    }
}
