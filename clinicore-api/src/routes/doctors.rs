/// Doctor profile and availability endpoints
///
/// Profiles are created for existing doctor-role accounts by an admin.
/// Availability is replaced as a whole weekly set; a doctor may edit their
/// own windows.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ok, Envelope},
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use clinicore_shared::{
    auth::{
        authorization::{require, Capability},
        middleware::AuthContext,
    },
    models::{
        doctor::{
            AvailabilityWindow, CreateDoctor, Doctor, SetAvailabilityWindow, UpdateDoctor,
        },
        user::{Role, User},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create doctor profile request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDoctorRequest {
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Specialization must be 1-255 characters"))]
    pub specialization: String,

    #[validate(range(min = 0, message = "Fee cannot be negative"))]
    pub fee_cents: i64,

    #[validate(range(min = 0, max = 80, message = "Experience must be 0-80 years"))]
    pub experience_years: i32,
}

/// Update doctor profile request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDoctorRequest {
    #[validate(length(min = 1, max = 255, message = "Specialization must be 1-255 characters"))]
    pub specialization: Option<String>,

    #[validate(range(min = 0, message = "Fee cannot be negative"))]
    pub fee_cents: Option<i64>,

    #[validate(range(min = 0, max = 80, message = "Experience must be 0-80 years"))]
    pub experience_years: Option<i32>,

    pub active: Option<bool>,
}

/// Replace availability request
#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub windows: Vec<SetAvailabilityWindow>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListDoctorsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `POST /v1/doctors` - create a profile for a doctor-role account (admin)
pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateDoctorRequest>,
) -> ApiResult<Json<Envelope<Doctor>>> {
    require(&auth, Capability::ManageDoctors)?;
    req.validate()?;

    // The owning account must exist and hold the doctor role
    let user = User::find_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if user.role != Role::Doctor {
        return Err(ApiError::BadRequest(
            "Profile owner must hold the doctor role".to_string(),
        ));
    }

    let doctor = Doctor::create(
        &state.db,
        CreateDoctor {
            user_id: req.user_id,
            specialization: req.specialization,
            fee_cents: req.fee_cents,
            experience_years: req.experience_years,
        },
    )
    .await?;

    Ok(ok("Doctor profile created", doctor))
}

/// `GET /v1/doctors` - list profiles (any authenticated caller)
///
/// Patients browse this when booking, so it is open to every role.
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<ListDoctorsQuery>,
) -> ApiResult<Json<Envelope<Vec<Doctor>>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let doctors = Doctor::list(&state.db, limit, offset).await?;

    Ok(ok("Doctors", doctors))
}

/// `GET /v1/doctors/:id` - fetch one profile
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Doctor>>> {
    let doctor = Doctor::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    Ok(ok("Doctor", doctor))
}

/// `PUT /v1/doctors/:id` - update a profile (admin, or the doctor themself)
pub async fn update_doctor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDoctorRequest>,
) -> ApiResult<Json<Envelope<Doctor>>> {
    req.validate()?;
    require_profile_access(&state, &auth, id).await?;

    let doctor = Doctor::update(
        &state.db,
        id,
        UpdateDoctor {
            specialization: req.specialization,
            fee_cents: req.fee_cents,
            experience_years: req.experience_years,
            active: req.active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    Ok(ok("Doctor updated", doctor))
}

/// `DELETE /v1/doctors/:id` - soft-delete a profile (admin)
pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::ManageDoctors)?;

    let removed = Doctor::soft_delete(&state.db, id).await?;
    if !removed {
        return Err(ApiError::NotFound("Doctor not found".to_string()));
    }

    Ok(ok("Doctor removed", serde_json::json!({ "id": id })))
}

/// `GET /v1/doctors/:id/availability` - weekly windows
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Vec<AvailabilityWindow>>>> {
    // 404 for unknown doctors rather than an empty window list
    Doctor::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    let windows = AvailabilityWindow::list_for_doctor(&state.db, id).await?;

    Ok(ok("Availability", windows))
}

/// `PUT /v1/doctors/:id/availability` - replace the weekly window set
/// (admin, or the doctor themself)
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetAvailabilityRequest>,
) -> ApiResult<Json<Envelope<Vec<AvailabilityWindow>>>> {
    require_profile_access(&state, &auth, id).await?;

    for window in &req.windows {
        if !(0..=6).contains(&window.weekday) {
            return Err(ApiError::BadRequest(
                "Weekday must be 0 (Monday) through 6 (Sunday)".to_string(),
            ));
        }
        if window.start_time >= window.end_time {
            return Err(ApiError::BadRequest(
                "Window start must be before end".to_string(),
            ));
        }
        if window.slot_minutes <= 0 {
            return Err(ApiError::BadRequest(
                "Slot duration must be positive".to_string(),
            ));
        }
    }

    let windows = AvailabilityWindow::replace_for_doctor(&state.db, id, req.windows).await?;

    Ok(ok("Availability updated", windows))
}

/// Admin, or the doctor who owns the profile
async fn require_profile_access(
    state: &AppState,
    auth: &AuthContext,
    doctor_id: Uuid,
) -> Result<(), ApiError> {
    if auth.role.allows(Capability::ManageDoctors) {
        return Ok(());
    }

    let doctor = Doctor::find_by_id(&state.db, doctor_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    if doctor.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Not authorized to manage this profile".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_doctor_request_validation() {
        let valid = CreateDoctorRequest {
            user_id: Uuid::new_v4(),
            specialization: "Cardiology".to_string(),
            fee_cents: 7500,
            experience_years: 12,
        };
        assert!(valid.validate().is_ok());

        let negative_fee = CreateDoctorRequest {
            user_id: Uuid::new_v4(),
            specialization: "Cardiology".to_string(),
            fee_cents: -1,
            experience_years: 12,
        };
        assert!(negative_fee.validate().is_err());
    }
}
