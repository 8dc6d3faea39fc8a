/// Appointment booking and lifecycle service
///
/// [`BookingService`] owns slot validation: doctor existence and activity,
/// availability-window coverage, and the conflict check. Conflicts are
/// interval overlaps, not just identical start times - a 45-minute visit
/// conflicts with a 30-minute visit starting 15 minutes in.
///
/// The conflict pre-check and the insert are two statements with no
/// transaction between them, so two concurrent requests for the same slot
/// can both pass the pre-check. The partial unique index on
/// (doctor_id, date, start_time) is the storage-level source of truth; a
/// unique violation from the insert surfaces as the same
/// [`BookingError::SlotConflict`] the pre-check produces. The pre-check
/// exists to return the friendlier error without a constraint round-trip.
///
/// # Example
///
/// ```no_run
/// use clinicore_shared::booking::{BookingService, BookAppointment};
/// use chrono::{NaiveDate, NaiveTime};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let service = BookingService::new(pool);
///
/// let outcome = service.book(BookAppointment {
///     patient_id: Uuid::new_v4(),
///     doctor_id: Uuid::new_v4(),
///     service_id: None,
///     date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
///     start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
///     notes: None,
///     booked_by: Uuid::new_v4(),
/// }).await?;
///
/// println!("Booked appointment {}", outcome.appointment.id);
/// # Ok(())
/// # }
/// ```

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::Effect;
use crate::models::appointment::{Appointment, AppointmentStatus, CreateAppointment};
use crate::models::doctor::{AvailabilityWindow, Doctor};
use crate::models::notification::NotificationKind;
use crate::models::service::ClinicService;
use crate::models::user::{Role, User};

/// Error type for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Referenced doctor is absent, inactive or deleted
    #[error("Doctor not found or not accepting bookings")]
    DoctorNotFound,

    /// Referenced patient is absent or not a patient-role account
    #[error("Patient not found")]
    PatientNotFound,

    /// Referenced catalog service is absent or inactive
    #[error("Service not found")]
    ServiceNotFound,

    /// Referenced appointment is absent
    #[error("Appointment not found")]
    AppointmentNotFound,

    /// The requested window falls outside the doctor's weekly availability
    #[error("Requested time is outside the doctor's availability")]
    OutsideAvailability,

    /// The requested window overlaps an existing booking
    #[error("Slot already booked")]
    SlotConflict,

    /// start_time is not before end_time
    #[error("Invalid time window: start must be before end")]
    InvalidWindow,

    /// The appointment's current status does not admit the requested one
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A booking request
///
/// `booked_by` is the acting caller, passed explicitly from the auth
/// context; it feeds the audit trail, never an authorization decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointment {
    /// Patient to book for
    pub patient_id: Uuid,

    /// Doctor to book with
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

    /// Acting user (audit trail)
    pub booked_by: Uuid,
}

/// A successful mutation plus the effects to perform
///
/// The caller enqueues the effects into the outbox; the operation's
/// correctness never depends on their delivery.
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    /// The appointment after the mutation
    pub appointment: Appointment,

    /// Audit and notification effects to enqueue
    pub effects: Vec<Effect>,
}

/// Appointment booking and lifecycle service
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    /// Creates a new booking service
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Books an appointment
    ///
    /// # Preconditions
    ///
    /// - The doctor exists, is active and not soft-deleted
    /// - The patient exists and holds the patient role
    /// - The service, when given, exists and is active
    /// - The window falls inside one of the doctor's availability windows
    /// - No non-cancelled appointment overlaps the window
    ///
    /// # Errors
    ///
    /// One [`BookingError`] per failed precondition; `SlotConflict` both
    /// from the pre-check and from a lost insert race.
    pub async fn book(&self, request: BookAppointment) -> Result<BookingOutcome, BookingError> {
        if request.start_time >= request.end_time {
            return Err(BookingError::InvalidWindow);
        }

        let doctor = Doctor::find_by_id(&self.pool, request.doctor_id)
            .await?
            .filter(|d| d.active)
            .ok_or(BookingError::DoctorNotFound)?;

        let patient = User::find_by_id(&self.pool, request.patient_id)
            .await?
            .filter(|u| u.role == Role::Patient && u.active)
            .ok_or(BookingError::PatientNotFound)?;

        if let Some(service_id) = request.service_id {
            ClinicService::find_by_id(&self.pool, service_id)
                .await?
                .filter(|s| s.active)
                .ok_or(BookingError::ServiceNotFound)?;
        }

        let weekday = request.date.weekday().num_days_from_monday() as i16;
        let covered = AvailabilityWindow::covers(
            &self.pool,
            doctor.id,
            weekday,
            request.start_time,
            request.end_time,
        )
        .await?;
        if !covered {
            return Err(BookingError::OutsideAvailability);
        }

        let conflicts = Appointment::find_conflicting(
            &self.pool,
            doctor.id,
            request.date,
            request.start_time,
            request.end_time,
            None,
        )
        .await?;
        if !conflicts.is_empty() {
            warn!(
                doctor_id = %doctor.id,
                date = %request.date,
                start = %request.start_time,
                "Booking conflict detected"
            );
            return Err(BookingError::SlotConflict);
        }

        let appointment = Appointment::create(
            &self.pool,
            CreateAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                service_id: request.service_id,
                date: request.date,
                start_time: request.start_time,
                end_time: request.end_time,
                notes: request.notes,
            },
        )
        .await
        .map_err(|e| Self::map_slot_violation(e))?;

        info!(
            appointment_id = %appointment.id,
            doctor_id = %doctor.id,
            patient_id = %patient.id,
            date = %appointment.date,
            "Appointment booked"
        );

        let effects = vec![
            Effect::audit(
                Some(request.booked_by),
                "appointment.booked",
                "appointment",
                appointment.id,
                json!({
                    "doctor_id": doctor.id,
                    "patient_id": patient.id,
                    "date": appointment.date,
                    "start_time": appointment.start_time,
                }),
            ),
            Effect::notify(
                patient.id,
                NotificationKind::System,
                format!(
                    "Your appointment on {} at {} is confirmed",
                    appointment.date, appointment.start_time
                ),
            ),
        ];

        Ok(BookingOutcome {
            appointment,
            effects,
        })
    }

    /// Reschedules an appointment to a new slot
    ///
    /// Re-runs the availability and conflict checks, excluding the
    /// appointment's own row so moving onto its current slot is never a
    /// false conflict. Only scheduled appointments can move.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_date: NaiveDate,
        new_start: NaiveTime,
        new_end: NaiveTime,
        acted_by: Uuid,
    ) -> Result<BookingOutcome, BookingError> {
        if new_start >= new_end {
            return Err(BookingError::InvalidWindow);
        }

        let current = Appointment::find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;

        if current.status != AppointmentStatus::Scheduled {
            return Err(BookingError::InvalidTransition {
                from: current.status.as_str(),
                to: AppointmentStatus::Scheduled.as_str(),
            });
        }

        let weekday = new_date.weekday().num_days_from_monday() as i16;
        let covered = AvailabilityWindow::covers(
            &self.pool,
            current.doctor_id,
            weekday,
            new_start,
            new_end,
        )
        .await?;
        if !covered {
            return Err(BookingError::OutsideAvailability);
        }

        let conflicts = Appointment::find_conflicting(
            &self.pool,
            current.doctor_id,
            new_date,
            new_start,
            new_end,
            Some(appointment_id),
        )
        .await?;
        if !conflicts.is_empty() {
            return Err(BookingError::SlotConflict);
        }

        let appointment =
            Appointment::update_schedule(&self.pool, appointment_id, new_date, new_start, new_end)
                .await
                .map_err(|e| Self::map_slot_violation(e))?
                .ok_or(BookingError::AppointmentNotFound)?;

        info!(
            appointment_id = %appointment.id,
            date = %appointment.date,
            start = %appointment.start_time,
            "Appointment rescheduled"
        );

        let effects = vec![
            Effect::audit(
                Some(acted_by),
                "appointment.rescheduled",
                "appointment",
                appointment.id,
                json!({
                    "date": appointment.date,
                    "start_time": appointment.start_time,
                }),
            ),
            Effect::notify(
                appointment.patient_id,
                NotificationKind::System,
                format!(
                    "Your appointment was moved to {} at {}",
                    appointment.date, appointment.start_time
                ),
            ),
        ];

        Ok(BookingOutcome {
            appointment,
            effects,
        })
    }

    /// Transitions an appointment's status
    ///
    /// The transition table on [`AppointmentStatus`] is authoritative:
    /// scheduled may complete, cancel, or no-show; terminal states admit
    /// nothing. Cancelled → scheduled in particular is rejected - rebooking
    /// a cancelled slot is a fresh [`book`](Self::book).
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        acted_by: Uuid,
    ) -> Result<BookingOutcome, BookingError> {
        let current = Appointment::find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;

        if !current.status.can_transition_to(target) {
            return Err(BookingError::InvalidTransition {
                from: current.status.as_str(),
                to: target.as_str(),
            });
        }

        // The WHERE clause re-checks the scheduled state, so a racing
        // transition loses cleanly instead of double-applying.
        let appointment = Appointment::transition(&self.pool, appointment_id, target)
            .await?
            .ok_or(BookingError::InvalidTransition {
                from: current.status.as_str(),
                to: target.as_str(),
            })?;

        info!(
            appointment_id = %appointment.id,
            status = appointment.status.as_str(),
            "Appointment status updated"
        );

        let effects = vec![Effect::audit(
            Some(acted_by),
            "appointment.status_changed",
            "appointment",
            appointment.id,
            json!({ "from": current.status.as_str(), "to": target.as_str() }),
        )];

        Ok(BookingOutcome {
            appointment,
            effects,
        })
    }

    /// Cancels an appointment
    ///
    /// Convenience for `update_status(.., Cancelled, ..)`; the slot is
    /// released for rebooking.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        acted_by: Uuid,
    ) -> Result<BookingOutcome, BookingError> {
        self.update_status(appointment_id, AppointmentStatus::Cancelled, acted_by)
            .await
    }

    /// Maps a slot-index unique violation to `SlotConflict`
    ///
    /// The losing side of a booking race hits the partial unique index
    /// rather than the pre-check; callers should not be able to tell the
    /// difference.
    fn map_slot_violation(e: sqlx::Error) -> BookingError {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.constraint() == Some("appointments_slot_idx") {
                return BookingError::SlotConflict;
            }
        }
        BookingError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_error_display() {
        assert_eq!(BookingError::SlotConflict.to_string(), "Slot already booked");
        assert_eq!(
            BookingError::InvalidWindow.to_string(),
            "Invalid time window: start must be before end"
        );

        let err = BookingError::InvalidTransition {
            from: "cancelled",
            to: "scheduled",
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from cancelled to scheduled"
        );
    }

    #[test]
    fn test_book_request_serde() {
        let request = BookAppointment {
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            service_id: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            notes: Some("first visit".to_string()),
            booked_by: Uuid::new_v4(),
        };

        let json = serde_json::to_string(&request).unwrap();
        let back: BookAppointment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date, request.date);
        assert_eq!(back.start_time, request.start_time);
    }

    // The conflict, availability and transition paths are exercised
    // end-to-end in the integration tests, which require a database.
}
