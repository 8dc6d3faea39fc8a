/// Medical record endpoints
///
/// Doctors author records for their own patients; the authoring doctor is
/// always the caller's profile, never a supplied ID. Reads are role-scoped:
/// patients see their own, doctors see what they authored, admins and
/// nurses see all, receptionists see none.

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
        appointment::Appointment,
        doctor::Doctor,
        medical_record::{CreateMedicalRecord, MedicalRecord, UpdateMedicalRecord},
        user::{Role, User},
    },
    visibility::{list_medical_records, medical_record_scope, VisibilityScope},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create record request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecordRequest {
    pub patient_id: Uuid,

    pub appointment_id: Option<Uuid>,

    #[validate(length(min = 1, message = "Diagnosis is required"))]
    pub diagnosis: String,

    pub prescription: Option<String>,

    pub notes: Option<String>,
}

/// Update record request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecordRequest {
    #[validate(length(min = 1, message = "Diagnosis cannot be empty"))]
    pub diagnosis: Option<String>,

    pub prescription: Option<String>,

    pub notes: Option<String>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `POST /v1/medical-records` - author a record (doctor only)
///
/// Referential existence checks happen here: the patient must be a live
/// patient-role account, and the appointment (when given) must belong to
/// the same patient.
pub async fn create_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateRecordRequest>,
) -> ApiResult<Json<Envelope<MedicalRecord>>> {
    require(&auth, Capability::WriteMedicalRecords)?;
    req.validate()?;

    // The author is always the caller's own profile
    let doctor = Doctor::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Caller has no doctor profile".to_string()))?;

    let patient = User::find_by_id(&state.db, req.patient_id)
        .await?
        .filter(|u| u.role == Role::Patient)
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    if let Some(appointment_id) = req.appointment_id {
        let appointment = Appointment::find_by_id(&state.db, appointment_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;
        if appointment.patient_id != patient.id {
            return Err(ApiError::BadRequest(
                "Appointment does not belong to this patient".to_string(),
            ));
        }
    }

    let record = MedicalRecord::create(
        &state.db,
        CreateMedicalRecord {
            patient_id: patient.id,
            doctor_id: doctor.id,
            appointment_id: req.appointment_id,
            diagnosis: req.diagnosis,
            prescription: req.prescription,
            notes: req.notes,
        },
    )
    .await?;

    Ok(ok("Record created", record))
}

/// `GET /v1/medical-records` - role-scoped listing
pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListRecordsQuery>,
) -> ApiResult<Json<Envelope<Vec<MedicalRecord>>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let scope = medical_record_scope(&state.db, &auth).await?;
    let records = list_medical_records(&state.db, &scope, limit, offset).await?;

    Ok(ok("Records", records))
}

/// `GET /v1/medical-records/:id` - fetch one record, scope-checked
pub async fn get_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<MedicalRecord>>> {
    let record = MedicalRecord::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    let scope = medical_record_scope(&state.db, &auth).await?;
    let visible = match scope {
        VisibilityScope::All => true,
        VisibilityScope::Patient(user_id) => record.patient_id == user_id,
        VisibilityScope::Doctor(doctor_id) => record.doctor_id == doctor_id,
        VisibilityScope::Nothing => false,
    };
    if !visible {
        return Err(ApiError::NotFound("Record not found".to_string()));
    }

    Ok(ok("Record", record))
}

/// `PUT /v1/medical-records/:id` - amend a record (authoring doctor only)
pub async fn update_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRecordRequest>,
) -> ApiResult<Json<Envelope<MedicalRecord>>> {
    require(&auth, Capability::WriteMedicalRecords)?;
    req.validate()?;

    let record = MedicalRecord::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    let doctor = Doctor::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Caller has no doctor profile".to_string()))?;
    if record.doctor_id != doctor.id {
        return Err(ApiError::Forbidden(
            "Only the authoring doctor may amend a record".to_string(),
        ));
    }

    let record = MedicalRecord::update(
        &state.db,
        id,
        UpdateMedicalRecord {
            diagnosis: req.diagnosis,
            prescription: req.prescription,
            notes: req.notes,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    Ok(ok("Record updated", record))
}

/// `DELETE /v1/medical-records/:id` - soft-delete (authoring doctor only)
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::WriteMedicalRecords)?;

    let record = MedicalRecord::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    let doctor = Doctor::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Caller has no doctor profile".to_string()))?;
    if record.doctor_id != doctor.id {
        return Err(ApiError::Forbidden(
            "Only the authoring doctor may remove a record".to_string(),
        ));
    }

    MedicalRecord::soft_delete(&state.db, id).await?;

    Ok(ok("Record removed", serde_json::json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_record_request_validation() {
        let valid = CreateRecordRequest {
            patient_id: Uuid::new_v4(),
            appointment_id: None,
            diagnosis: "Seasonal allergies".to_string(),
            prescription: Some("Loratadine 10mg".to_string()),
            notes: None,
        };
        assert!(valid.validate().is_ok());

        let empty_diagnosis = CreateRecordRequest {
            patient_id: Uuid::new_v4(),
            appointment_id: None,
            diagnosis: "".to_string(),
            prescription: None,
            notes: None,
        };
        assert!(empty_diagnosis.validate().is_err());
    }
}
