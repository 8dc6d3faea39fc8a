/// Periodic background jobs
///
/// Each job implements [`Job`]: a name, an interval, and an async `run`
/// over the pool. The scheduler drives every registered job on its own
/// interval; a job failure is logged and retried at the next tick, never
/// escalated.

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

pub mod low_stock;
pub mod reminders;

pub use low_stock::LowStockScan;
pub use reminders::ReminderScan;

/// Outcome of one job run
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    /// Rows examined
    pub scanned: usize,

    /// Effects or notifications produced
    pub produced: usize,
}

/// A periodic background job
#[async_trait]
pub trait Job: Send + Sync {
    /// Job name for logging
    fn name(&self) -> &'static str;

    /// How often the job runs
    fn interval(&self) -> Duration;

    /// Performs one scan
    async fn run(&self, pool: &PgPool) -> anyhow::Result<JobReport>;
}
