/// Role-scoped query filtering
///
/// Every list endpoint answers through a [`VisibilityScope`] derived from
/// the caller's role before any caller-supplied filter is considered:
///
/// - Patients are forced to their own rows; a patient-supplied patient
///   filter is ignored, not merged.
/// - Doctors are forced to the doctor profile their account owns. A
///   doctor-role account without a profile sees nothing.
/// - Admins and receptionists see everything; their filters pass through.
/// - Nurses see every appointment (read-only) but no invoices.
///
/// Because [`Role`] is a closed enum the match below is exhaustive; there is
/// no "unrecognized role" branch to fail open through.
///
/// # Example
///
/// ```no_run
/// use clinicore_shared::visibility::{appointment_scope, list_appointments, AppointmentFilters};
/// use clinicore_shared::auth::middleware::AuthContext;
/// use clinicore_shared::models::user::Role;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let auth = AuthContext::new(Uuid::new_v4(), Role::Patient);
/// let scope = appointment_scope(&pool, &auth).await?;
///
/// // Whatever patient_id the caller supplied, the scope wins
/// let appointments = list_appointments(&pool, &scope, AppointmentFilters::default()).await?;
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::AuthContext;
use crate::models::appointment::AppointmentStatus;
use crate::models::doctor::Doctor;
use crate::models::invoice::Invoice;
use crate::models::medical_record::MedicalRecord;
use crate::models::user::Role;

/// What a caller may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Full visibility; caller filters pass through
    All,

    /// Rows belonging to one doctor profile
    Doctor(Uuid),

    /// Rows belonging to one patient account
    Patient(Uuid),

    /// No visibility (fail closed)
    Nothing,
}

/// Caller-supplied appointment filters
///
/// Applied only where the scope allows; a scope of `Patient` or `Doctor`
/// overrides the corresponding filter field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilters {
    /// Filter by patient (honored only under `All` scope)
    pub patient_id: Option<Uuid>,

    /// Filter by doctor (honored only under `All` scope)
    pub doctor_id: Option<Uuid>,

    /// Earliest date, inclusive
    pub from: Option<NaiveDate>,

    /// Latest date, inclusive
    pub to: Option<NaiveDate>,

    /// Filter by status
    pub status: Option<AppointmentStatus>,
}

/// An appointment row with patient and doctor names resolved
///
/// Reference expansion only; no logic lives in the join.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub status: AppointmentStatus,
    pub payment: crate::models::appointment::PaymentStatus,
    pub notes: Option<String>,
}

/// Derives the appointment scope for a caller
///
/// Doctor-role callers are resolved to their profile; a missing profile
/// scopes to nothing rather than everything.
pub async fn appointment_scope(
    pool: &PgPool,
    auth: &AuthContext,
) -> Result<VisibilityScope, sqlx::Error> {
    let scope = match auth.role {
        Role::Admin | Role::Receptionist | Role::Nurse => VisibilityScope::All,
        Role::Patient => VisibilityScope::Patient(auth.user_id),
        Role::Doctor => match Doctor::find_by_user(pool, auth.user_id).await? {
            Some(doctor) => VisibilityScope::Doctor(doctor.id),
            None => VisibilityScope::Nothing,
        },
    };

    Ok(scope)
}

/// Derives the medical record scope for a caller
///
/// Receptionists handle scheduling and billing, not clinical data, so they
/// scope to nothing here.
pub async fn medical_record_scope(
    pool: &PgPool,
    auth: &AuthContext,
) -> Result<VisibilityScope, sqlx::Error> {
    let scope = match auth.role {
        Role::Admin | Role::Nurse => VisibilityScope::All,
        Role::Patient => VisibilityScope::Patient(auth.user_id),
        Role::Doctor => match Doctor::find_by_user(pool, auth.user_id).await? {
            Some(doctor) => VisibilityScope::Doctor(doctor.id),
            None => VisibilityScope::Nothing,
        },
        Role::Receptionist => VisibilityScope::Nothing,
    };

    Ok(scope)
}

/// Derives the invoice scope for a caller
///
/// Billing is front-desk territory: admins and receptionists see all,
/// patients see their own, clinical staff see none.
pub fn invoice_scope(auth: &AuthContext) -> VisibilityScope {
    match auth.role {
        Role::Admin | Role::Receptionist => VisibilityScope::All,
        Role::Patient => VisibilityScope::Patient(auth.user_id),
        Role::Doctor | Role::Nurse => VisibilityScope::Nothing,
    }
}

/// Lists appointments under a scope, sorted by date then start time
///
/// Patient and doctor names are resolved via joins. Under `Patient` and
/// `Doctor` scopes the corresponding caller filter is discarded and the
/// scope's ID takes its place.
pub async fn list_appointments(
    pool: &PgPool,
    scope: &VisibilityScope,
    filters: AppointmentFilters,
) -> Result<Vec<AppointmentView>, sqlx::Error> {
    // Scope wins over caller-supplied identity filters
    let (patient_id, doctor_id) = match scope {
        VisibilityScope::All => (filters.patient_id, filters.doctor_id),
        VisibilityScope::Patient(id) => (Some(*id), filters.doctor_id),
        VisibilityScope::Doctor(id) => (filters.patient_id, Some(*id)),
        VisibilityScope::Nothing => return Ok(Vec::new()),
    };

    let appointments = sqlx::query_as::<_, AppointmentView>(
        r#"
        SELECT a.id, a.patient_id, p.name AS patient_name,
               a.doctor_id, du.name AS doctor_name,
               a.service_id, a.date, a.start_time, a.end_time,
               a.status, a.payment, a.notes
        FROM appointments a
        JOIN users p ON p.id = a.patient_id
        JOIN doctors d ON d.id = a.doctor_id
        JOIN users du ON du.id = d.user_id
        WHERE NOT a.deleted
          AND ($1::uuid IS NULL OR a.patient_id = $1)
          AND ($2::uuid IS NULL OR a.doctor_id = $2)
          AND ($3::date IS NULL OR a.date >= $3)
          AND ($4::date IS NULL OR a.date <= $4)
          AND ($5::appointment_status IS NULL OR a.status = $5)
        ORDER BY a.date ASC, a.start_time ASC
        "#,
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(filters.from)
    .bind(filters.to)
    .bind(filters.status)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

/// Checks whether one appointment is visible under a scope
pub fn appointment_visible(
    scope: &VisibilityScope,
    patient_id: Uuid,
    doctor_id: Uuid,
) -> bool {
    match scope {
        VisibilityScope::All => true,
        VisibilityScope::Patient(id) => *id == patient_id,
        VisibilityScope::Doctor(id) => *id == doctor_id,
        VisibilityScope::Nothing => false,
    }
}

/// Lists medical records under a scope, newest first
pub async fn list_medical_records(
    pool: &PgPool,
    scope: &VisibilityScope,
    limit: i64,
    offset: i64,
) -> Result<Vec<MedicalRecord>, sqlx::Error> {
    match scope {
        VisibilityScope::All => MedicalRecord::list(pool, limit, offset).await,
        VisibilityScope::Patient(id) => {
            MedicalRecord::list_for_patient(pool, *id, limit, offset).await
        }
        VisibilityScope::Doctor(id) => {
            MedicalRecord::list_for_doctor(pool, *id, limit, offset).await
        }
        VisibilityScope::Nothing => Ok(Vec::new()),
    }
}

/// Lists invoices under a scope, newest first
pub async fn list_invoices(
    pool: &PgPool,
    scope: &VisibilityScope,
    limit: i64,
    offset: i64,
) -> Result<Vec<Invoice>, sqlx::Error> {
    match scope {
        VisibilityScope::All => Invoice::list(pool, limit, offset).await,
        VisibilityScope::Patient(id) => Invoice::list_for_patient(pool, *id, limit, offset).await,
        // Invoices have no doctor axis; anything else is nothing
        VisibilityScope::Doctor(_) | VisibilityScope::Nothing => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_visible_patient_scope() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let doctor = Uuid::new_v4();
        let scope = VisibilityScope::Patient(me);

        assert!(appointment_visible(&scope, me, doctor));
        assert!(!appointment_visible(&scope, other, doctor));
    }

    #[test]
    fn test_appointment_visible_doctor_scope() {
        let my_profile = Uuid::new_v4();
        let patient = Uuid::new_v4();
        let scope = VisibilityScope::Doctor(my_profile);

        assert!(appointment_visible(&scope, patient, my_profile));
        assert!(!appointment_visible(&scope, patient, Uuid::new_v4()));
    }

    #[test]
    fn test_appointment_visible_all_and_nothing() {
        let patient = Uuid::new_v4();
        let doctor = Uuid::new_v4();

        assert!(appointment_visible(&VisibilityScope::All, patient, doctor));
        assert!(!appointment_visible(&VisibilityScope::Nothing, patient, doctor));
    }

    #[test]
    fn test_invoice_scope_by_role() {
        let user_id = Uuid::new_v4();

        let admin = AuthContext::new(user_id, Role::Admin);
        assert_eq!(invoice_scope(&admin), VisibilityScope::All);

        let receptionist = AuthContext::new(user_id, Role::Receptionist);
        assert_eq!(invoice_scope(&receptionist), VisibilityScope::All);

        let patient = AuthContext::new(user_id, Role::Patient);
        assert_eq!(invoice_scope(&patient), VisibilityScope::Patient(user_id));

        let doctor = AuthContext::new(user_id, Role::Doctor);
        assert_eq!(invoice_scope(&doctor), VisibilityScope::Nothing);

        let nurse = AuthContext::new(user_id, Role::Nurse);
        assert_eq!(invoice_scope(&nurse), VisibilityScope::Nothing);
    }
}
