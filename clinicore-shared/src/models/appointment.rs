/// Appointment model and database operations
///
/// An appointment books one doctor for one patient in a slot identified by
/// (doctor, date, start time). The double-booking invariant is enforced
/// twice: a pre-check in the booking service for a friendly error, and a
/// partial unique index as the storage-level source of truth (the pre-check
/// and insert are not wrapped in a transaction, so two concurrent requests
/// can both pass the pre-check; exactly one survives the index).
///
/// # Status Lifecycle
///
/// ```text
/// scheduled → completed
///           → cancelled
///           → no_show
/// ```
///
/// Completed, cancelled and no-show are terminal. A cancelled appointment
/// releases its slot; rebooking it is a fresh booking, not a transition back
/// to scheduled.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE appointment_status AS ENUM ('scheduled', 'completed', 'cancelled', 'no_show');
/// CREATE TYPE payment_status AS ENUM ('unpaid', 'paid', 'waived');
///
/// CREATE TABLE appointments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     patient_id UUID NOT NULL REFERENCES users(id),
///     doctor_id UUID NOT NULL REFERENCES doctors(id),
///     service_id UUID REFERENCES services(id),
///     date DATE NOT NULL,
///     start_time TIME NOT NULL,
///     end_time TIME NOT NULL,
///     status appointment_status NOT NULL DEFAULT 'scheduled',
///     payment payment_status NOT NULL DEFAULT 'unpaid',
///     notes TEXT,
///     reminder_sent BOOLEAN NOT NULL DEFAULT FALSE,
///     deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX appointments_slot_idx
///     ON appointments (doctor_id, date, start_time)
///     WHERE status <> 'cancelled' AND NOT deleted;
/// ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked and upcoming
    Scheduled,

    /// The visit took place
    Completed,

    /// Cancelled before the visit; releases the slot
    Cancelled,

    /// The patient did not show up
    NoShow,
}

impl AppointmentStatus {
    /// Status name for database storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Checks if status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShow
        )
    }

    /// Checks if transition to target status is valid
    ///
    /// Only scheduled appointments may move, and only forward. In particular
    /// cancelled → scheduled is rejected: reopening a cancelled visit is a
    /// new booking, never a transition.
    pub fn can_transition_to(&self, target: AppointmentStatus) -> bool {
        match (self, target) {
            (AppointmentStatus::Scheduled, AppointmentStatus::Completed) => true,
            (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled) => true,
            (AppointmentStatus::Scheduled, AppointmentStatus::NoShow) => true,
            _ => false,
        }
    }
}

/// Payment status of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not yet paid
    Unpaid,

    /// Settled
    Paid,

    /// Fee waived
    Waived,
}

/// Appointment model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    /// Unique appointment ID
    pub id: Uuid,

    /// Patient user account
    pub patient_id: Uuid,

    /// Booked doctor profile
    pub doctor_id: Uuid,

    /// Optional service catalog reference
    pub service_id: Option<Uuid>,

    /// Visit date
    pub date: NaiveDate,

    /// Slot start
    pub start_time: NaiveTime,

    /// Slot end (exclusive)
    pub end_time: NaiveTime,

    /// Lifecycle status
    pub status: AppointmentStatus,

    /// Payment status
    pub payment: PaymentStatus,

    /// Free-form notes
    pub notes: Option<String>,

    /// Whether a reminder notification has been emitted for this visit
    pub reminder_sent: bool,

    /// Soft-delete flag
    pub deleted: bool,

    /// When the appointment was created
    pub created_at: DateTime<Utc>,

    /// When the appointment was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new appointment
///
/// Callers go through
/// [`BookingService`](crate::booking::BookingService) rather than calling
/// [`Appointment::create`] directly, so the availability and conflict checks
/// run first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointment {
    /// Patient user account
    pub patient_id: Uuid,

    /// Doctor profile
    pub doctor_id: Uuid,

    /// Optional service catalog reference
    pub service_id: Option<Uuid>,

    /// Visit date
    pub date: NaiveDate,

    /// Slot start
    pub start_time: NaiveTime,

    /// Slot end (exclusive)
    pub end_time: NaiveTime,

    /// Free-form notes
    pub notes: Option<String>,
}

impl Appointment {
    /// Inserts a new appointment in scheduled state
    ///
    /// # Errors
    ///
    /// A unique violation on `appointments_slot_idx` means the slot was taken
    /// between the conflict pre-check and this insert; the booking service
    /// maps it to the same conflict error as the pre-check.
    pub async fn create(pool: &PgPool, data: CreateAppointment) -> Result<Self, sqlx::Error> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, service_id, date, start_time, end_time, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, patient_id, doctor_id, service_id, date, start_time, end_time,
                      status, payment, notes, reminder_sent, deleted, created_at, updated_at
            "#,
        )
        .bind(data.patient_id)
        .bind(data.doctor_id)
        .bind(data.service_id)
        .bind(data.date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        Ok(appointment)
    }

    /// Finds an appointment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, patient_id, doctor_id, service_id, date, start_time, end_time,
                   status, payment, notes, reminder_sent, deleted, created_at, updated_at
            FROM appointments
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(appointment)
    }

    /// Finds appointments overlapping a requested window
    ///
    /// Two windows on the same doctor and date conflict when
    /// `start < existing.end AND end > existing.start`. Cancelled and
    /// soft-deleted rows never conflict. `exclude` removes an appointment's
    /// own row from consideration so a reschedule onto its current slot does
    /// not conflict with itself.
    pub async fn find_conflicting(
        pool: &PgPool,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let conflicts = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, patient_id, doctor_id, service_id, date, start_time, end_time,
                   status, payment, notes, reminder_sent, deleted, created_at, updated_at
            FROM appointments
            WHERE doctor_id = $1 AND date = $2
              AND status <> 'cancelled' AND NOT deleted
              AND start_time < $4 AND end_time > $3
              AND ($5::uuid IS NULL OR id <> $5)
            "#,
        )
        .bind(doctor_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(exclude)
        .fetch_all(pool)
        .await?;

        Ok(conflicts)
    }

    /// Moves an appointment to a new slot
    ///
    /// Only scheduled appointments can move; the state guard lives in the
    /// WHERE clause so the check and write are one statement.
    pub async fn update_schedule(
        pool: &PgPool,
        id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Option<Self>, sqlx::Error> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET date = $2, start_time = $3, end_time = $4, reminder_sent = FALSE, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled' AND NOT deleted
            RETURNING id, patient_id, doctor_id, service_id, date, start_time, end_time,
                      status, payment, notes, reminder_sent, deleted, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .fetch_optional(pool)
        .await?;

        Ok(appointment)
    }

    /// Transitions a scheduled appointment to a terminal status
    ///
    /// Returns None when the row is absent or no longer scheduled, which the
    /// booking service reports as an invalid transition.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled' AND NOT deleted
            RETURNING id, patient_id, doctor_id, service_id, date, start_time, end_time,
                      status, payment, notes, reminder_sent, deleted, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(target)
        .fetch_optional(pool)
        .await?;

        Ok(appointment)
    }

    /// Updates the payment status
    pub async fn set_payment(
        pool: &PgPool,
        id: Uuid,
        payment: PaymentStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET payment = $2, updated_at = NOW()
            WHERE id = $1 AND NOT deleted
            RETURNING id, patient_id, doctor_id, service_id, date, start_time, end_time,
                      status, payment, notes, reminder_sent, deleted, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(payment)
        .fetch_optional(pool)
        .await?;

        Ok(appointment)
    }

    /// Soft-deletes an appointment
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE appointments SET deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Scheduled appointments within a date range that still need a reminder
    ///
    /// Used by the worker's reminder job. `reminder_sent` keeps the job
    /// idempotent across scans.
    pub async fn unreminded_between(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, patient_id, doctor_id, service_id, date, start_time, end_time,
                   status, payment, notes, reminder_sent, deleted, created_at, updated_at
            FROM appointments
            WHERE status = 'scheduled' AND NOT deleted AND NOT reminder_sent
              AND date >= $1 AND date <= $2
            ORDER BY date ASC, start_time ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(appointments)
    }

    /// Marks an appointment's reminder as emitted
    pub async fn mark_reminder_sent(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE appointments SET reminder_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts appointments on a date with a given status
    ///
    /// Dashboard aggregate.
    pub async fn count_on_date(
        pool: &PgPool,
        date: NaiveDate,
        status: AppointmentStatus,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM appointments WHERE date = $1 AND status = $2 AND NOT deleted",
        )
        .bind(date)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(AppointmentStatus::Scheduled.as_str(), "scheduled");
        assert_eq!(AppointmentStatus::Completed.as_str(), "completed");
        assert_eq!(AppointmentStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(AppointmentStatus::NoShow.as_str(), "no_show");
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
    }

    #[test]
    fn test_status_transitions() {
        // Scheduled moves forward
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Completed));
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Cancelled));
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::NoShow));

        // Terminal states cannot transition, including cancelled → scheduled
        assert!(!AppointmentStatus::Cancelled.can_transition_to(AppointmentStatus::Scheduled));
        assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::Scheduled));
        assert!(!AppointmentStatus::NoShow.can_transition_to(AppointmentStatus::Completed));
        assert!(!AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Scheduled));
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");

        let back: AppointmentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, AppointmentStatus::Cancelled);
    }
}
