/// Inventory item model
///
/// Stock quantities never go negative: the service-layer guard in
/// [`StockService`](crate::stock::StockService) puts the check inside the
/// UPDATE's WHERE clause, and a CHECK constraint backs it at the storage
/// level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Inventory item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryItem {
    /// Unique item ID
    pub id: Uuid,

    /// Item name
    pub name: String,

    /// Stock-keeping unit (unique)
    pub sku: String,

    /// Units on hand; never negative
    pub stock_quantity: i32,

    /// Reorder threshold; at or below this the item counts as low stock
    pub reorder_level: i32,

    /// Unit price in cents
    pub unit_price_cents: i64,

    /// Soft-delete flag
    pub deleted: bool,

    /// When the item was created
    pub created_at: DateTime<Utc>,

    /// When the item was last updated
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Whether the item is at or below its reorder level
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }
}

/// Input for creating an inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInventoryItem {
    pub name: String,
    pub sku: String,
    pub stock_quantity: i32,
    pub reorder_level: i32,
    pub unit_price_cents: i64,
}

/// Input for updating an inventory item
///
/// Stock quantity is deliberately absent: quantity changes go through
/// [`StockService::adjust`](crate::stock::StockService::adjust) so the
/// non-negative guard always applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInventoryItem {
    pub name: Option<String>,
    pub reorder_level: Option<i32>,
    pub unit_price_cents: Option<i64>,
}

impl InventoryItem {
    /// Creates an inventory item
    pub async fn create(pool: &PgPool, data: CreateInventoryItem) -> Result<Self, sqlx::Error> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (name, sku, stock_quantity, reorder_level, unit_price_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, sku, stock_quantity, reorder_level, unit_price_cents,
                      deleted, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.sku)
        .bind(data.stock_quantity)
        .bind(data.reorder_level)
        .bind(data.unit_price_cents)
        .fetch_one(pool)
        .await?;

        Ok(item)
    }

    /// Finds an item by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT id, name, sku, stock_quantity, reorder_level, unit_price_cents,
                   deleted, created_at, updated_at
            FROM inventory_items
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(item)
    }

    /// Lists items, alphabetically
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT id, name, sku, stock_quantity, reorder_level, unit_price_cents,
                   deleted, created_at, updated_at
            FROM inventory_items
            WHERE NOT deleted
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Lists items at or below their reorder level
    ///
    /// Used by the worker's low-stock scan and the dashboard.
    pub async fn list_low_stock(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT id, name, sku, stock_quantity, reorder_level, unit_price_cents,
                   deleted, created_at, updated_at
            FROM inventory_items
            WHERE stock_quantity <= reorder_level AND NOT deleted
            ORDER BY name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Updates item metadata (not stock quantity)
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateInventoryItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE inventory_items SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.reorder_level.is_some() {
            bind_count += 1;
            query.push_str(&format!(", reorder_level = ${}", bind_count));
        }
        if data.unit_price_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", unit_price_cents = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND NOT deleted RETURNING id, name, sku, stock_quantity, \
             reorder_level, unit_price_cents, deleted, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, InventoryItem>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(reorder_level) = data.reorder_level {
            q = q.bind(reorder_level);
        }
        if let Some(unit_price_cents) = data.unit_price_cents {
            q = q.bind(unit_price_cents);
        }

        let item = q.fetch_optional(pool).await?;

        Ok(item)
    }

    /// Soft-deletes an item
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE inventory_items SET deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts items currently low on stock
    pub async fn count_low_stock(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM inventory_items WHERE stock_quantity <= reorder_level AND NOT deleted",
        )
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(stock: i32, reorder: i32) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: "Gauze".to_string(),
            sku: "GZ-10".to_string(),
            stock_quantity: stock,
            reorder_level: reorder,
            unit_price_cents: 299,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_low_stock() {
        assert!(item(5, 10).is_low_stock());
        assert!(item(10, 10).is_low_stock());
        assert!(!item(11, 10).is_low_stock());
        assert!(!item(3, 0).is_low_stock());
    }
}
