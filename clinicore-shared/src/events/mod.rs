/// Side-effect events and the outbox
///
/// Services never perform side effects inline. A successful operation
/// returns the [`Effect`]s it wants performed; the route layer enqueues them
/// into the `outbox` table (best-effort - an enqueue failure is logged and
/// never fails the primary operation), and the worker's dispatcher executes
/// them with retries. This decouples the correctness of a booking or a stock
/// adjustment from the fate of its audit rows and notifications.
///
/// # Example
///
/// ```no_run
/// use clinicore_shared::events::{Effect, Outbox};
/// use sqlx::PgPool;
/// use serde_json::json;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let effect = Effect::audit(
///     Some(Uuid::new_v4()),
///     "appointment.booked",
///     "appointment",
///     Uuid::new_v4(),
///     json!({"date": "2025-01-10"}),
/// );
///
/// Outbox::enqueue(&pool, &effect).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::notification::NotificationKind;

/// An audit trail entry to append
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Acting user, if known
    pub actor: Option<Uuid>,

    /// Action name, e.g. "appointment.booked"
    pub action: String,

    /// Entity type, e.g. "appointment"
    pub entity: String,

    /// Entity ID
    pub entity_id: Uuid,

    /// Structured detail
    pub detail: JsonValue,
}

/// A notification to deliver to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Recipient
    pub user_id: Uuid,

    /// Notification kind
    pub kind: NotificationKind,

    /// Message text
    pub message: String,
}

/// A low-stock alert; the dispatcher fans it out to every admin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockEvent {
    /// Affected item
    pub item_id: Uuid,

    /// Item name (for the message)
    pub name: String,

    /// Units currently on hand
    pub stock_quantity: i32,

    /// The threshold that was crossed
    pub reorder_level: i32,
}

/// A side effect requested by a service
///
/// Serialized into the outbox as (kind, payload) and reconstructed by the
/// dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Append an audit row
    Audit(AuditEvent),

    /// Deliver a notification to one user
    Notify(NotificationEvent),

    /// Alert admins that an item is low on stock
    LowStock(LowStockEvent),
}

impl Effect {
    /// Convenience constructor for an audit effect
    pub fn audit(
        actor: Option<Uuid>,
        action: &str,
        entity: &str,
        entity_id: Uuid,
        detail: JsonValue,
    ) -> Self {
        Effect::Audit(AuditEvent {
            actor,
            action: action.to_string(),
            entity: entity.to_string(),
            entity_id,
            detail,
        })
    }

    /// Convenience constructor for a notification effect
    pub fn notify(user_id: Uuid, kind: NotificationKind, message: impl Into<String>) -> Self {
        Effect::Notify(NotificationEvent {
            user_id,
            kind,
            message: message.into(),
        })
    }

    /// Outbox kind discriminator
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Audit(_) => "audit",
            Effect::Notify(_) => "notify",
            Effect::LowStock(_) => "low_stock",
        }
    }
}

/// One durable outbox row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OutboxEntry {
    /// Unique row ID
    pub id: Uuid,

    /// Effect kind discriminator
    pub kind: String,

    /// Serialized [`Effect`]
    pub payload: JsonValue,

    /// Dispatch attempts so far
    pub attempts: i32,

    /// Error from the last failed attempt
    pub last_error: Option<String>,

    /// When dispatch succeeded (None while pending)
    pub dispatched_at: Option<DateTime<Utc>>,

    /// When the row was enqueued
    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    /// Deserializes the payload back into an [`Effect`]
    pub fn effect(&self) -> Result<Effect, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Outbox operations
pub struct Outbox;

/// Entries are abandoned after this many failed dispatch attempts
pub const MAX_DISPATCH_ATTEMPTS: i32 = 5;

impl Outbox {
    /// Enqueues one effect
    pub async fn enqueue(pool: &PgPool, effect: &Effect) -> Result<OutboxEntry, sqlx::Error> {
        let payload = serde_json::to_value(effect)
            .map_err(|e| sqlx::Error::Protocol(format!("Effect serialization failed: {}", e)))?;

        let entry = sqlx::query_as::<_, OutboxEntry>(
            r#"
            INSERT INTO outbox (kind, payload)
            VALUES ($1, $2)
            RETURNING id, kind, payload, attempts, last_error, dispatched_at, created_at
            "#,
        )
        .bind(effect.kind())
        .bind(payload)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Enqueues a batch of effects, best-effort
    ///
    /// A failed enqueue is logged and skipped so the primary operation that
    /// produced the effects still succeeds.
    pub async fn enqueue_all(pool: &PgPool, effects: &[Effect]) {
        for effect in effects {
            if let Err(e) = Self::enqueue(pool, effect).await {
                warn!(kind = effect.kind(), error = %e, "Failed to enqueue outbox effect");
            }
        }
    }

    /// Fetches pending entries for dispatch, oldest first
    ///
    /// Entries that have exhausted their attempts are left behind for manual
    /// inspection.
    pub async fn claim_pending(pool: &PgPool, limit: i64) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        let entries = sqlx::query_as::<_, OutboxEntry>(
            r#"
            SELECT id, kind, payload, attempts, last_error, dispatched_at, created_at
            FROM outbox
            WHERE dispatched_at IS NULL AND attempts < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(MAX_DISPATCH_ATTEMPTS)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Marks an entry as dispatched
    pub async fn mark_dispatched(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE outbox SET dispatched_at = NOW(), attempts = attempts + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a failed dispatch attempt
    pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE outbox SET attempts = attempts + 1, last_error = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effect_kind() {
        let audit = Effect::audit(None, "x", "y", Uuid::new_v4(), json!({}));
        assert_eq!(audit.kind(), "audit");

        let notify = Effect::notify(Uuid::new_v4(), NotificationKind::System, "hello");
        assert_eq!(notify.kind(), "notify");

        let low = Effect::LowStock(LowStockEvent {
            item_id: Uuid::new_v4(),
            name: "Gauze".to_string(),
            stock_quantity: 2,
            reorder_level: 10,
        });
        assert_eq!(low.kind(), "low_stock");
    }

    #[test]
    fn test_effect_serde_roundtrip() {
        let user_id = Uuid::new_v4();
        let effect = Effect::notify(user_id, NotificationKind::AppointmentReminder, "Tomorrow 10:00");

        let value = serde_json::to_value(&effect).unwrap();
        assert_eq!(value["type"], "notify");

        let back: Effect = serde_json::from_value(value).unwrap();
        match back {
            Effect::Notify(n) => {
                assert_eq!(n.user_id, user_id);
                assert_eq!(n.kind, NotificationKind::AppointmentReminder);
            }
            other => panic!("expected notify, got {:?}", other),
        }
    }
}
