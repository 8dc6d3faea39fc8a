/// Appointment reminder scan
///
/// Hourly scan for scheduled appointments happening within the next day
/// that have not had a reminder emitted. Each hit becomes a notification
/// for the patient, and the appointment's `reminder_sent` flag is set so
/// the scan stays idempotent - an appointment is reminded at most once,
/// however many scans run.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

use clinicore_shared::models::appointment::Appointment;
use clinicore_shared::models::notification::{Notification, NotificationKind};

use super::{Job, JobReport};

/// The reminder scan job
pub struct ReminderScan {
    /// How far ahead to look
    pub horizon: ChronoDuration,
}

impl Default for ReminderScan {
    fn default() -> Self {
        Self {
            horizon: ChronoDuration::hours(24),
        }
    }
}

#[async_trait]
impl Job for ReminderScan {
    fn name(&self) -> &'static str {
        "appointment-reminders"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(3600)
    }

    async fn run(&self, pool: &PgPool) -> anyhow::Result<JobReport> {
        let today = Utc::now().date_naive();
        let until = (Utc::now() + self.horizon).date_naive();

        let upcoming = Appointment::unreminded_between(pool, today, until).await?;
        let scanned = upcoming.len();
        let mut produced = 0;

        for appointment in upcoming {
            let message = format!(
                "Reminder: you have an appointment on {} at {}",
                appointment.date, appointment.start_time
            );

            match Notification::create(
                pool,
                appointment.patient_id,
                NotificationKind::AppointmentReminder,
                &message,
            )
            .await
            {
                Ok(_) => {
                    // Flag after the notification exists, so a crash between
                    // the two repeats the reminder rather than losing it
                    Appointment::mark_reminder_sent(pool, appointment.id).await?;
                    produced += 1;
                }
                Err(e) => {
                    warn!(
                        appointment_id = %appointment.id,
                        error = %e,
                        "Failed to create reminder notification"
                    );
                }
            }
        }

        if produced > 0 {
            info!(scanned, produced, "Reminder scan complete");
        }

        Ok(JobReport { scanned, produced })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_scan_defaults() {
        let job = ReminderScan::default();
        assert_eq!(job.name(), "appointment-reminders");
        assert_eq!(job.interval(), Duration::from_secs(3600));
        assert_eq!(job.horizon, ChronoDuration::hours(24));
    }
}
