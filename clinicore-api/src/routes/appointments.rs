/// Appointment endpoints
///
/// Booking goes through [`BookingService`]; listings go through the
/// role-scoped query layer. Patients always act on themselves: a
/// patient-supplied `patient_id` is overwritten with the caller's own ID
/// rather than rejected.
///
/// # Endpoints
///
/// - `POST /v1/appointments` - book a slot
/// - `GET /v1/appointments` - role-scoped listing
/// - `GET /v1/appointments/:id` - fetch one (scoped)
/// - `PATCH /v1/appointments/:id/reschedule`
/// - `PATCH /v1/appointments/:id/status`
/// - `PATCH /v1/appointments/:id/payment`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ok, Envelope},
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use clinicore_shared::{
    auth::{
        authorization::{require, Capability},
        middleware::AuthContext,
    },
    booking::{BookAppointment, BookingService},
    events::Outbox,
    models::{
        appointment::{Appointment, AppointmentStatus, PaymentStatus},
        doctor::Doctor,
        user::Role,
    },
    visibility::{
        appointment_scope, appointment_visible, list_appointments as scoped_list,
        AppointmentFilters, AppointmentView,
    },
};
use serde::Deserialize;
use uuid::Uuid;

/// Book appointment request
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    /// Patient to book for; ignored for patient callers (forced to self)
    pub patient_id: Option<Uuid>,

    pub doctor_id: Uuid,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

/// Reschedule request
#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: AppointmentStatus,
}

/// Payment update request
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment: PaymentStatus,
}

/// `POST /v1/appointments` - book a slot
///
/// # Errors
///
/// - `404 Not Found`: doctor, patient or service absent/inactive
/// - `409 Conflict`: the window overlaps an existing booking
/// - `400 Bad Request`: window outside availability or inverted
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BookRequest>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    require(&auth, Capability::BookAppointments)?;

    // Patients book for themselves no matter what they send
    let patient_id = match auth.role {
        Role::Patient => auth.user_id,
        _ => req
            .patient_id
            .ok_or_else(|| ApiError::BadRequest("patient_id is required".to_string()))?,
    };

    let service = BookingService::new(state.db.clone());
    let outcome = service
        .book(BookAppointment {
            patient_id,
            doctor_id: req.doctor_id,
            service_id: req.service_id,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            notes: req.notes,
            booked_by: auth.user_id,
        })
        .await?;

    Outbox::enqueue_all(&state.db, &outcome.effects).await;

    Ok(ok("Appointment booked", outcome.appointment))
}

/// `GET /v1/appointments` - role-scoped listing
///
/// Sorted by date then start time. A patient never sees another patient's
/// rows regardless of the filters supplied.
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filters): Query<AppointmentFilters>,
) -> ApiResult<Json<Envelope<Vec<AppointmentView>>>> {
    let scope = appointment_scope(&state.db, &auth).await?;
    let appointments = scoped_list(&state.db, &scope, filters).await?;

    Ok(ok("Appointments", appointments))
}

/// `GET /v1/appointments/:id` - fetch one appointment, scope-checked
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    let appointment = Appointment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    let scope = appointment_scope(&state.db, &auth).await?;
    if !appointment_visible(&scope, appointment.patient_id, appointment.doctor_id) {
        // Hide existence from out-of-scope callers
        return Err(ApiError::NotFound("Appointment not found".to_string()));
    }

    Ok(ok("Appointment", appointment))
}

/// `PATCH /v1/appointments/:id/reschedule`
///
/// Front desk moves any appointment; a patient may move their own. The
/// conflict check excludes the appointment's own row, so rescheduling onto
/// its current slot succeeds.
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    let appointment = Appointment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    require_manage_or_own_patient(&auth, &appointment)?;

    let service = BookingService::new(state.db.clone());
    let outcome = service
        .reschedule(id, req.date, req.start_time, req.end_time, auth.user_id)
        .await?;

    Outbox::enqueue_all(&state.db, &outcome.effects).await;

    Ok(ok("Appointment rescheduled", outcome.appointment))
}

/// `PATCH /v1/appointments/:id/status`
///
/// Front desk may apply any valid transition; the assigned doctor may
/// complete or no-show their own visits; a patient may only cancel their
/// own.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    let appointment = Appointment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    if !auth.role.allows(Capability::ManageAppointments) {
        match auth.role {
            Role::Patient => {
                if appointment.patient_id != auth.user_id
                    || req.status != AppointmentStatus::Cancelled
                {
                    return Err(ApiError::Forbidden(
                        "Patients may only cancel their own appointments".to_string(),
                    ));
                }
            }
            Role::Doctor => {
                let profile = Doctor::find_by_user(&state.db, auth.user_id).await?;
                let owns = profile.map(|p| p.id == appointment.doctor_id).unwrap_or(false);
                if !owns {
                    return Err(ApiError::Forbidden(
                        "Doctors may only update their own appointments".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ApiError::Forbidden(
                    "Not authorized to update appointment status".to_string(),
                ));
            }
        }
    }

    let service = BookingService::new(state.db.clone());
    let outcome = service.update_status(id, req.status, auth.user_id).await?;

    Outbox::enqueue_all(&state.db, &outcome.effects).await;

    Ok(ok("Status updated", outcome.appointment))
}

/// `PATCH /v1/appointments/:id/payment` - front desk only
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    require(&auth, Capability::ManageInvoices)?;

    let appointment = Appointment::set_payment(&state.db, id, req.payment)
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    Ok(ok("Payment updated", appointment))
}

/// `DELETE /v1/appointments/:id` - soft-delete (front desk)
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::ManageAppointments)?;

    let removed = Appointment::soft_delete(&state.db, id).await?;
    if !removed {
        return Err(ApiError::NotFound("Appointment not found".to_string()));
    }

    Ok(ok("Appointment removed", serde_json::json!({ "id": id })))
}

/// Manage capability, or the appointment's own patient
fn require_manage_or_own_patient(
    auth: &AuthContext,
    appointment: &Appointment,
) -> Result<(), ApiError> {
    if auth.role.allows(Capability::ManageAppointments) {
        return Ok(());
    }

    if auth.role == Role::Patient && appointment.patient_id == auth.user_id {
        return Ok(());
    }

    Err(ApiError::Forbidden(
        "Not authorized to modify this appointment".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn appointment_for(patient_id: Uuid) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: Uuid::new_v4(),
            service_id: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
            payment: PaymentStatus::Unpaid,
            notes: None,
            reminder_sent: false,
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_manage_or_own_patient() {
        let patient_id = Uuid::new_v4();
        let appointment = appointment_for(patient_id);

        // The booking patient passes
        let owner = AuthContext::new(patient_id, Role::Patient);
        assert!(require_manage_or_own_patient(&owner, &appointment).is_ok());

        // A different patient does not
        let stranger = AuthContext::new(Uuid::new_v4(), Role::Patient);
        assert!(require_manage_or_own_patient(&stranger, &appointment).is_err());

        // Front desk passes via the capability
        let receptionist = AuthContext::new(Uuid::new_v4(), Role::Receptionist);
        assert!(require_manage_or_own_patient(&receptionist, &appointment).is_ok());

        // A nurse has neither route
        let nurse = AuthContext::new(Uuid::new_v4(), Role::Nurse);
        assert!(require_manage_or_own_patient(&nurse, &appointment).is_err());
    }
}
