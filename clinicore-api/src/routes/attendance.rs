/// Staff attendance endpoints
///
/// Staff check themselves in and out; admins mark absences/leave for anyone
/// and read clinic-wide attendance. Patients have no attendance.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ok, Envelope},
};
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use clinicore_shared::{
    auth::{
        authorization::{require, Capability},
        middleware::AuthContext,
    },
    models::attendance::{AttendanceRecord, AttendanceStatus},
};
use serde::Deserialize;
use uuid::Uuid;

/// Mark absent/leave request (admin)
#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListAttendanceQuery {
    /// Specific user; defaults to the caller
    pub user_id: Option<Uuid>,

    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// `POST /v1/attendance/check-in` - staff check themselves in for today
pub async fn check_in(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Envelope<AttendanceRecord>>> {
    if !auth.role.is_staff() {
        return Err(ApiError::Forbidden(
            "Attendance applies to staff only".to_string(),
        ));
    }

    let now = Utc::now();
    let record = AttendanceRecord::check_in(&state.db, auth.user_id, now.date_naive(), now).await?;

    Ok(ok("Checked in", record))
}

/// `POST /v1/attendance/check-out` - staff check themselves out for today
///
/// # Errors
///
/// - `400 Bad Request`: no check-in exists today, or the check-out would
///   precede it
pub async fn check_out(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Envelope<AttendanceRecord>>> {
    if !auth.role.is_staff() {
        return Err(ApiError::Forbidden(
            "Attendance applies to staff only".to_string(),
        ));
    }

    let now = Utc::now();
    let record = AttendanceRecord::check_out(&state.db, auth.user_id, now.date_naive(), now)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest("No check-in to check out from today".to_string())
        })?;

    Ok(ok("Checked out", record))
}

/// `POST /v1/attendance/mark` - mark anyone absent or on leave (admin)
pub async fn mark(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<MarkRequest>,
) -> ApiResult<Json<Envelope<AttendanceRecord>>> {
    require(&auth, Capability::RecordAttendance)?;

    let record = AttendanceRecord::mark(&state.db, req.user_id, req.date, req.status).await?;

    Ok(ok("Attendance marked", record))
}

/// `GET /v1/attendance?from=..&to=..` - own records, or anyone's with the
/// capability
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListAttendanceQuery>,
) -> ApiResult<Json<Envelope<Vec<AttendanceRecord>>>> {
    let target = query.user_id.unwrap_or(auth.user_id);

    if target != auth.user_id {
        require(&auth, Capability::RecordAttendance)?;
    } else if !auth.role.is_staff() {
        return Err(ApiError::Forbidden(
            "Attendance applies to staff only".to_string(),
        ));
    }

    if query.from > query.to {
        return Err(ApiError::BadRequest("from must not be after to".to_string()));
    }

    let records = AttendanceRecord::list_for_user(&state.db, target, query.from, query.to).await?;

    Ok(ok("Attendance", records))
}
