/// Low-stock inventory scan
///
/// Daily scan over inventory for items at or below their reorder level.
/// Each hit is fanned out as a notification to every active admin, skipping
/// admins who still have an unread alert for the same item - acknowledged
/// alerts recur on the next scan, unacknowledged ones don't pile up.
///
/// This scan is independent of the low-stock effects emitted by the stock
/// adjustment path; it catches items that drifted low without a recent
/// adjustment (e.g. after a reorder-level change).

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

use clinicore_shared::models::inventory::InventoryItem;
use clinicore_shared::models::notification::{Notification, NotificationKind};
use clinicore_shared::models::user::{Role, User};

use super::{Job, JobReport};

/// The low-stock scan job
#[derive(Default)]
pub struct LowStockScan;

#[async_trait]
impl Job for LowStockScan {
    fn name(&self) -> &'static str {
        "low-stock-scan"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(86400)
    }

    async fn run(&self, pool: &PgPool) -> anyhow::Result<JobReport> {
        let low_items = InventoryItem::list_low_stock(pool).await?;
        let admins = User::ids_by_role(pool, Role::Admin).await?;

        let scanned = low_items.len();
        let mut produced = 0;

        for item in &low_items {
            let message = format!(
                "Low stock: {} ({}) at {} units, reorder level {}",
                item.name, item.sku, item.stock_quantity, item.reorder_level
            );

            for &admin_id in &admins {
                let already = Notification::has_unread_mentioning(
                    pool,
                    admin_id,
                    NotificationKind::LowStock,
                    &item.sku,
                )
                .await?;
                if already {
                    continue;
                }

                match Notification::create(pool, admin_id, NotificationKind::LowStock, &message)
                    .await
                {
                    Ok(_) => produced += 1,
                    Err(e) => {
                        warn!(item_id = %item.id, error = %e, "Failed to create low-stock alert");
                    }
                }
            }
        }

        if produced > 0 {
            info!(scanned, produced, "Low-stock scan complete");
        }

        Ok(JobReport { scanned, produced })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_scan_config() {
        let job = LowStockScan;
        assert_eq!(job.name(), "low-stock-scan");
        assert_eq!(job.interval(), Duration::from_secs(86400));
    }
}
