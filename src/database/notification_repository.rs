//! Notification Repository
//!
//! Activity feed rows. Each row records who did something (`user_id`), what
//! it touched (`target_type`/`target_id`), and read/archive state.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub const CATEGORY_USER_MANAGEMENT: &str = "user_management";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl FromStr for NotificationPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(NotificationPriority::Low),
            "medium" => Ok(NotificationPriority::Medium),
            "high" => Ok(NotificationPriority::High),
            other => Err(format!(
                "unknown priority `{other}`, expected one of `low`, `medium`, `high`"
            )),
        }
    }
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub notification_id: i32,
    pub user_id: Option<i32>,
    pub action_type: String,
    pub description: String,
    pub target_id: Option<i32>,
    pub target_type: Option<String>,
    pub priority: String,
    pub category: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    /// Username of `user_id`, if that user still exists.
    pub actor_name: Option<String>,
}

/// Query-string filters for `GET /api/notifications/fetch`. Absent or blank
/// fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub archived: Option<bool>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub priority: Option<NotificationPriority>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category: Option<String>,
    #[serde(rename = "isRead", default, deserialize_with = "blank_as_none")]
    pub is_read: Option<bool>,
}

/// Query values arrive as text; `?priority=` means "no filter".
fn blank_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i32,
    pub action_type: &'static str,
    pub description: String,
    pub target_id: i32,
    pub target_type: &'static str,
    pub priority: NotificationPriority,
    pub category: &'static str,
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first.
    pub async fn list(&self, filter: &NotificationFilter) -> Result<Vec<Notification>> {
        filtered_query(filter)
            .build_query_as::<Notification>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch notifications")
    }

    pub async fn create(&self, notification: &NewNotification) -> Result<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO notifications
                (user_id, action_type, description, target_id, target_type, priority, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING notification_id
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.action_type)
        .bind(&notification.description)
        .bind(notification.target_id)
        .bind(notification.target_type)
        .bind(notification.priority.as_str())
        .bind(notification.category)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create notification")
    }

    /// Returns `false` when no such notification exists.
    pub async fn mark_read(&self, notification_id: i32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE notification_id = $1",
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .context("Failed to mark notification as read")?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of notifications that changed.
    pub async fn mark_all_read(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE is_read = FALSE",
        )
        .execute(&self.pool)
        .await
        .context("Failed to mark notifications as read")?;

        Ok(result.rows_affected())
    }

    pub async fn archive(&self, notification_id: i32) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET archived = TRUE WHERE notification_id = $1")
                .bind(notification_id)
                .execute(&self.pool)
                .await
                .context("Failed to archive notification")?;

        Ok(result.rows_affected() > 0)
    }
}

fn filtered_query(filter: &NotificationFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(
        r#"
        SELECT n.notification_id, n.user_id, n.action_type, n.description, n.target_id,
               n.target_type, n.priority, n.category, n.is_read, n.read_at, n.archived,
               n.created_at, u.username AS actor_name
        FROM notifications n
        LEFT JOIN users u ON n.user_id = u.user_id
        WHERE 1=1"#,
    );

    if let Some(archived) = filter.archived {
        builder.push(" AND n.archived = ").push_bind(archived);
    }
    if let Some(priority) = filter.priority {
        builder.push(" AND n.priority = ").push_bind(priority.as_str());
    }
    if let Some(category) = filter.category.as_deref() {
        builder.push(" AND n.category = ").push_bind(category);
    }
    if let Some(is_read) = filter.is_read {
        builder.push(" AND n.is_read = ").push_bind(is_read);
    }

    builder.push(" ORDER BY n.created_at DESC");
    builder
}
