/// Inventory stock adjustment service
///
/// Stock changes go through [`StockService::adjust`], never a raw update.
/// The non-negative guard lives inside the UPDATE's WHERE clause, so the
/// check and the write are one atomic statement - a rejected adjustment
/// leaves the quantity untouched. Crossing the reorder threshold surfaces
/// as a structured [`Effect::LowStock`] in the outcome, not a log line; the
/// worker's periodic scan remains an independent safety net.
///
/// # Example
///
/// ```no_run
/// use clinicore_shared::stock::StockService;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, item_id: Uuid, user: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let service = StockService::new(pool);
///
/// let outcome = service.adjust(item_id, -2, user).await?;
/// println!("{} units left", outcome.item.stock_quantity);
/// # Ok(())
/// # }
/// ```

use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::events::{Effect, LowStockEvent};
use crate::models::inventory::InventoryItem;

/// Error type for stock operations
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// Referenced item is absent or deleted
    #[error("Inventory item not found")]
    ItemNotFound,

    /// The adjustment would drive stock below zero
    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A successful adjustment plus the effects to perform
#[derive(Debug, Clone)]
pub struct StockOutcome {
    /// The item after the adjustment
    pub item: InventoryItem,

    /// Audit and low-stock effects to enqueue
    pub effects: Vec<Effect>,
}

/// Inventory stock adjustment service
pub struct StockService {
    pool: PgPool,
}

impl StockService {
    /// Creates a new stock service
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adjusts an item's stock by a signed delta
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` when the item is absent or soft-deleted
    /// - `InsufficientStock` when `stock_quantity + delta < 0`; the stored
    ///   quantity is unchanged
    pub async fn adjust(
        &self,
        item_id: Uuid,
        delta: i32,
        acted_by: Uuid,
    ) -> Result<StockOutcome, StockError> {
        // Guard and write in one statement: no row comes back when the item
        // is missing or the delta would go negative.
        let updated = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET stock_quantity = stock_quantity + $2, updated_at = NOW()
            WHERE id = $1 AND NOT deleted AND stock_quantity + $2 >= 0
            RETURNING id, name, sku, stock_quantity, reorder_level, unit_price_cents,
                      deleted, created_at, updated_at
            "#,
        )
        .bind(item_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        let item = match updated {
            Some(item) => item,
            None => {
                // Distinguish a missing item from a rejected delta
                let existing = InventoryItem::find_by_id(&self.pool, item_id)
                    .await?
                    .ok_or(StockError::ItemNotFound)?;
                return Err(StockError::InsufficientStock {
                    available: existing.stock_quantity,
                    requested: delta.abs(),
                });
            }
        };

        info!(
            item_id = %item.id,
            delta,
            stock_quantity = item.stock_quantity,
            "Stock adjusted"
        );

        let mut effects = vec![Effect::audit(
            Some(acted_by),
            "inventory.adjusted",
            "inventory_item",
            item.id,
            json!({ "delta": delta, "stock_quantity": item.stock_quantity }),
        )];

        if item.is_low_stock() {
            effects.push(Effect::LowStock(LowStockEvent {
                item_id: item.id,
                name: item.name.clone(),
                stock_quantity: item.stock_quantity,
                reorder_level: item.reorder_level,
            }));
        }

        Ok(StockOutcome { item, effects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_error_display() {
        let err = StockError::InsufficientStock {
            available: 3,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: 3 available, 10 requested"
        );

        assert_eq!(StockError::ItemNotFound.to_string(), "Inventory item not found");
    }

    // Adjustment semantics (never-negative, low-stock effect at the
    // threshold) are exercised in the integration tests against a database.
}
