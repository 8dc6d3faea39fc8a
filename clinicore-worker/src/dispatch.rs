/// Outbox dispatcher
///
/// Drains the `outbox` table and executes each recorded
/// [`Effect`](clinicore_shared::events::Effect): audit effects become
/// audit_log rows, notify effects become notification rows, low-stock
/// effects fan out to every active admin. A failed entry gets its attempt
/// counted and is retried on the next pass until
/// [`MAX_DISPATCH_ATTEMPTS`](clinicore_shared::events::MAX_DISPATCH_ATTEMPTS)
/// is reached; exhausted entries stay in the table for inspection.

use sqlx::PgPool;
use tracing::{debug, info, warn};

use clinicore_shared::events::{Effect, Outbox, OutboxEntry};
use clinicore_shared::models::audit::AuditLog;
use clinicore_shared::models::notification::{Notification, NotificationKind};
use clinicore_shared::models::user::{Role, User};

/// Outbox dispatcher
pub struct OutboxDispatcher {
    pool: PgPool,

    /// Entries claimed per pass
    batch_size: i64,
}

impl OutboxDispatcher {
    /// Creates a dispatcher with the default batch size
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: 50,
        }
    }

    /// Creates a dispatcher with a custom batch size
    pub fn with_batch_size(pool: PgPool, batch_size: i64) -> Self {
        Self { pool, batch_size }
    }

    /// Executes one dispatch pass
    ///
    /// Returns the number of entries dispatched successfully.
    pub async fn run_once(&self) -> Result<usize, sqlx::Error> {
        let entries = Outbox::claim_pending(&self.pool, self.batch_size).await?;
        if entries.is_empty() {
            return Ok(0);
        }

        debug!(count = entries.len(), "Dispatching outbox entries");

        let mut dispatched = 0;
        for entry in entries {
            match self.execute(&entry).await {
                Ok(()) => {
                    Outbox::mark_dispatched(&self.pool, entry.id).await?;
                    dispatched += 1;
                }
                Err(e) => {
                    warn!(entry_id = %entry.id, kind = %entry.kind, error = %e, "Dispatch failed");
                    Outbox::mark_failed(&self.pool, entry.id, &e.to_string()).await?;
                }
            }
        }

        if dispatched > 0 {
            info!(dispatched, "Outbox pass complete");
        }

        Ok(dispatched)
    }

    /// Executes one entry's effect
    async fn execute(&self, entry: &OutboxEntry) -> anyhow::Result<()> {
        let effect = entry.effect()?;

        match effect {
            Effect::Audit(event) => {
                AuditLog::append(
                    &self.pool,
                    event.actor,
                    &event.action,
                    &event.entity,
                    event.entity_id,
                    event.detail,
                )
                .await?;
            }
            Effect::Notify(event) => {
                Notification::create(&self.pool, event.user_id, event.kind, &event.message)
                    .await?;
            }
            Effect::LowStock(event) => {
                let message = format!(
                    "Low stock: {} at {} units, reorder level {}",
                    event.name, event.stock_quantity, event.reorder_level
                );
                for admin_id in User::ids_by_role(&self.pool, Role::Admin).await? {
                    Notification::create(
                        &self.pool,
                        admin_id,
                        NotificationKind::LowStock,
                        &message,
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }
}
