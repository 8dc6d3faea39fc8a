/// Notification model
///
/// Notifications are rows a user reads from their dashboard. They are
/// produced by the outbox dispatcher and the worker's periodic scans, never
/// synchronously by request handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Upcoming appointment reminder
    AppointmentReminder,

    /// Inventory item fell to or below its reorder level
    LowStock,

    /// Anything else
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AppointmentReminder => "appointment_reminder",
            NotificationKind::LowStock => "low_stock",
            NotificationKind::System => "system",
        }
    }
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient user
    pub user_id: Uuid,

    /// Notification kind
    pub kind: NotificationKind,

    /// Human-readable message
    pub message: String,

    /// Whether the recipient has read it
    pub read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification for one user
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        kind: NotificationKind,
        message: &str,
    ) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, message)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, kind, message, read, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Lists notifications for a user, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, message, read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT read)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Marks one notification as read
    ///
    /// Scoped by recipient so a user can only touch their own rows.
    pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks for an unread notification of a kind mentioning a subject
    ///
    /// The low-stock scan uses this to avoid piling up duplicate alerts for
    /// an item nobody has acknowledged yet.
    pub async fn has_unread_mentioning(
        pool: &PgPool,
        user_id: Uuid,
        kind: NotificationKind,
        subject: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM notifications
                WHERE user_id = $1 AND kind = $2 AND NOT read AND message LIKE '%' || $3 || '%'
            )
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(subject)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(NotificationKind::AppointmentReminder.as_str(), "appointment_reminder");
        assert_eq!(NotificationKind::LowStock.as_str(), "low_stock");
        assert_eq!(NotificationKind::System.as_str(), "system");
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let json = serde_json::to_string(&NotificationKind::AppointmentReminder).unwrap();
        assert_eq!(json, "\"appointment_reminder\"");
    }
}
