/// Medical record model
///
/// A record ties a diagnosis (and optional prescription) to a patient, the
/// authoring doctor, and optionally the appointment it was written during.
/// Referential existence is checked at creation time by the route layer;
/// there are no cross-entity invariants beyond that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Medical record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MedicalRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Patient the record belongs to
    pub patient_id: Uuid,

    /// Authoring doctor profile
    pub doctor_id: Uuid,

    /// Appointment the record was written during, if any
    pub appointment_id: Option<Uuid>,

    /// Diagnosis text
    pub diagnosis: String,

    /// Prescription text, if any
    pub prescription: Option<String>,

    /// Additional notes
    pub notes: Option<String>,

    /// Soft-delete flag
    pub deleted: bool,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a medical record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicalRecord {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a medical record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMedicalRecord {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

impl MedicalRecord {
    /// Creates a medical record
    pub async fn create(pool: &PgPool, data: CreateMedicalRecord) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, MedicalRecord>(
            r#"
            INSERT INTO medical_records (patient_id, doctor_id, appointment_id, diagnosis, prescription, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, patient_id, doctor_id, appointment_id, diagnosis, prescription,
                      notes, deleted, created_at, updated_at
            "#,
        )
        .bind(data.patient_id)
        .bind(data.doctor_id)
        .bind(data.appointment_id)
        .bind(data.diagnosis)
        .bind(data.prescription)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Finds a record by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, MedicalRecord>(
            r#"
            SELECT id, patient_id, doctor_id, appointment_id, diagnosis, prescription,
                   notes, deleted, created_at, updated_at
            FROM medical_records
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Lists records for one patient, newest first
    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, MedicalRecord>(
            r#"
            SELECT id, patient_id, doctor_id, appointment_id, diagnosis, prescription,
                   notes, deleted, created_at, updated_at
            FROM medical_records
            WHERE patient_id = $1 AND NOT deleted
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(patient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Lists records authored by one doctor, newest first
    pub async fn list_for_doctor(
        pool: &PgPool,
        doctor_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, MedicalRecord>(
            r#"
            SELECT id, patient_id, doctor_id, appointment_id, diagnosis, prescription,
                   notes, deleted, created_at, updated_at
            FROM medical_records
            WHERE doctor_id = $1 AND NOT deleted
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(doctor_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Lists all records, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, MedicalRecord>(
            r#"
            SELECT id, patient_id, doctor_id, appointment_id, diagnosis, prescription,
                   notes, deleted, created_at, updated_at
            FROM medical_records
            WHERE NOT deleted
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Updates a record's clinical text fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateMedicalRecord,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE medical_records SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.diagnosis.is_some() {
            bind_count += 1;
            query.push_str(&format!(", diagnosis = ${}", bind_count));
        }
        if data.prescription.is_some() {
            bind_count += 1;
            query.push_str(&format!(", prescription = ${}", bind_count));
        }
        if data.notes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", notes = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND NOT deleted RETURNING id, patient_id, doctor_id, appointment_id, \
             diagnosis, prescription, notes, deleted, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, MedicalRecord>(&query).bind(id);

        if let Some(diagnosis) = data.diagnosis {
            q = q.bind(diagnosis);
        }
        if let Some(prescription) = data.prescription {
            q = q.bind(prescription);
        }
        if let Some(notes) = data.notes {
            q = q.bind(notes);
        }

        let record = q.fetch_optional(pool).await?;

        Ok(record)
    }

    /// Soft-deletes a record
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medical_records SET deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
