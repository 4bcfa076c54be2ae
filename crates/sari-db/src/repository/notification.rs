//! # Notification Repository
//!
//! Role-targeted notifications.
//!
//! ## Targeting
//! `target_roles` is stored as a JSON array of role strings, e.g.
//! `["owner","checker"]`. Role filtering happens in SQL with SQLite's
//! `json_each`, so a checker's feed query never even loads owner-only
//! rows.
//!
//! Read state is monotonic: `mark_read` only ever flips false → true.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use sari_core::{Notification, NotificationKind, Role};

/// Row shape of the `notifications` table with target_roles still JSON.
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: String,
    kind: NotificationKind,
    title: String,
    message: String,
    is_read: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    user_id: Option<String>,
    target_roles: String,
}

impl NotificationRow {
    fn into_notification(self) -> DbResult<Notification> {
        let target_roles: Vec<Role> = serde_json::from_str(&self.target_roles)
            .map_err(|e| DbError::corrupt("notifications", e.to_string()))?;

        Ok(Notification {
            id: self.id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            is_read: self.is_read,
            created_at: self.created_at,
            user_id: self.user_id,
            target_roles,
        })
    }
}

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Inserts a notification.
    pub async fn insert(&self, notification: &Notification) -> DbResult<()> {
        debug!(
            id = %notification.id,
            kind = ?notification.kind,
            "Inserting notification"
        );

        let target_roles = serde_json::to_string(&notification.target_roles)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, kind, title, message, is_read, created_at, user_id, target_roles
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&notification.id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .bind(&notification.user_id)
        .bind(target_roles)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists notifications targeted at a role, newest first.
    pub async fn list_for_role(&self, role: Role, limit: u32) -> DbResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, title, message, is_read, created_at, user_id, target_roles
            FROM notifications
            WHERE EXISTS (
                SELECT 1 FROM json_each(notifications.target_roles)
                WHERE json_each.value = ?1
            )
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(role.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NotificationRow::into_notification).collect()
    }

    /// Marks a notification as read. A no-op for already-read rows; the
    /// flag never goes back to unread.
    ///
    /// Returns true if a row transitioned.
    pub async fn mark_read(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND is_read = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts unread notifications targeted at a role.
    pub async fn unread_count_for_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE is_read = 0
              AND EXISTS (
                  SELECT 1 FROM json_each(notifications.target_roles)
                  WHERE json_each.value = ?1
              )
            "#,
        )
        .bind(role.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
