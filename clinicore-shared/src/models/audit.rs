/// Audit log model
///
/// Append-only record of who did what to which entity. Rows are written by
/// the outbox dispatcher, so a failed audit write never fails the operation
/// it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// One audit log row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    /// Unique row ID
    pub id: Uuid,

    /// Acting user, if known
    pub actor: Option<Uuid>,

    /// Action name, e.g. "appointment.booked"
    pub action: String,

    /// Entity type, e.g. "appointment"
    pub entity: String,

    /// Entity ID
    pub entity_id: Uuid,

    /// Structured detail (JSON)
    pub detail: JsonValue,

    /// When the row was written
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Appends an audit row
    pub async fn append(
        pool: &PgPool,
        actor: Option<Uuid>,
        action: &str,
        entity: &str,
        entity_id: Uuid,
        detail: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_log (actor, action, entity, entity_id, detail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, actor, action, entity, entity_id, detail, created_at
            "#,
        )
        .bind(actor)
        .bind(action)
        .bind(entity)
        .bind(entity_id)
        .bind(detail)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Lists audit rows for one entity, newest first
    pub async fn list_for_entity(
        pool: &PgPool,
        entity: &str,
        entity_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, actor, action, entity, entity_id, detail, created_at
            FROM audit_log
            WHERE entity = $1 AND entity_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(entity)
        .bind(entity_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
