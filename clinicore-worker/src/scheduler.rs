/// Background scheduler
///
/// Drives the periodic jobs and the outbox dispatcher. Each job runs on its
/// own Tokio task with its own interval; the outbox dispatcher polls on a
/// short interval so recorded effects land quickly. Shutdown is coordinated
/// through a [`CancellationToken`]: on cancel, every loop finishes its
/// current pass and exits.
///
/// # Example
///
/// ```no_run
/// use clinicore_worker::jobs::{LowStockScan, ReminderScan};
/// use clinicore_worker::scheduler::Scheduler;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let scheduler = Scheduler::new(pool)
///     .register(ReminderScan::default())
///     .register(LowStockScan);
///
/// scheduler.run().await;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::dispatch::OutboxDispatcher;
use crate::jobs::Job;

/// How often the outbox dispatcher polls for pending entries
const DISPATCH_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Background scheduler
pub struct Scheduler {
    pool: PgPool,
    jobs: Vec<Arc<dyn Job>>,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    /// Creates an empty scheduler
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            jobs: Vec::new(),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Registers a job
    pub fn register(mut self, job: impl Job + 'static) -> Self {
        self.jobs.push(Arc::new(job));
        self
    }

    /// A token that cancels the scheduler when triggered
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs all jobs and the dispatcher until shutdown
    pub async fn run(self) {
        let mut handles = Vec::new();

        for job in &self.jobs {
            let job = Arc::clone(job);
            let pool = self.pool.clone();
            let token = self.shutdown_token.clone();

            info!(job = job.name(), interval_secs = job.interval().as_secs(), "Starting job");

            handles.push(tokio::spawn(async move {
                let mut ticker = interval(job.interval());
                loop {
                    tokio::select! {
                        _ = token.cancelled() => {
                            info!(job = job.name(), "Job stopped");
                            break;
                        }
                        _ = ticker.tick() => {
                            match job.run(&pool).await {
                                Ok(report) => {
                                    if report.produced > 0 {
                                        info!(
                                            job = job.name(),
                                            scanned = report.scanned,
                                            produced = report.produced,
                                            "Job run complete"
                                        );
                                    }
                                }
                                Err(e) => {
                                    error!(job = job.name(), error = %e, "Job run failed");
                                }
                            }
                        }
                    }
                }
            }));
        }

        // Outbox dispatcher loop
        {
            let dispatcher = OutboxDispatcher::new(self.pool.clone());
            let token = self.shutdown_token.clone();

            handles.push(tokio::spawn(async move {
                let mut ticker = interval(DISPATCH_POLL_INTERVAL);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => {
                            info!("Outbox dispatcher stopped");
                            break;
                        }
                        _ = ticker.tick() => {
                            if let Err(e) = dispatcher.run_once().await {
                                error!(error = %e, "Outbox dispatch pass failed");
                            }
                        }
                    }
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobReport;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        async fn run(&self, _pool: &PgPool) -> anyhow::Result<JobReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(JobReport::default())
        }
    }

    #[tokio::test]
    async fn test_scheduler_runs_jobs_until_cancelled() {
        // Pool never touched by CountingJob; connect lazily so no database
        // is required
        let pool = PgPool::connect_lazy("postgresql://localhost/unused").unwrap();

        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(pool).register(CountingJob {
            runs: Arc::clone(&runs),
        });
        let token = scheduler.shutdown_token();

        let handle = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        let _ = handle.await;

        assert!(runs.load(Ordering::SeqCst) >= 1);
    }
}
