/// Doctor profile model and availability windows
///
/// A Doctor row extends a doctor-role [`User`](super::user::User) with
/// clinical metadata and a set of weekly availability windows. Exactly one
/// Doctor exists per doctor-role user (unique constraint on `user_id`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE doctors (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     specialization VARCHAR(255) NOT NULL,
///     fee_cents BIGINT NOT NULL DEFAULT 0,
///     experience_years INTEGER NOT NULL DEFAULT 0,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE doctor_availability (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     doctor_id UUID NOT NULL REFERENCES doctors(id) ON DELETE CASCADE,
///     weekday SMALLINT NOT NULL CHECK (weekday BETWEEN 0 AND 6),
///     start_time TIME NOT NULL,
///     end_time TIME NOT NULL,
///     slot_minutes INTEGER NOT NULL DEFAULT 30
/// );
/// ```
///
/// Weekdays are numbered 0 = Monday through 6 = Sunday, matching
/// `chrono::Weekday::num_days_from_monday`.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Doctor profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Doctor {
    /// Unique profile ID
    pub id: Uuid,

    /// Owning user account (doctor role)
    pub user_id: Uuid,

    /// Medical specialization (e.g. "Cardiology")
    pub specialization: String,

    /// Consultation fee in cents
    pub fee_cents: i64,

    /// Years of experience
    pub experience_years: i32,

    /// Whether the doctor currently accepts bookings
    pub active: bool,

    /// Soft-delete flag
    pub deleted: bool,

    /// When the profile was created
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

/// A weekly availability window
///
/// The booking service only accepts appointments that fall entirely inside
/// one of these windows for the requested weekday.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AvailabilityWindow {
    /// Window ID
    pub id: Uuid,

    /// Owning doctor profile
    pub doctor_id: Uuid,

    /// Weekday, 0 = Monday through 6 = Sunday
    pub weekday: i16,

    /// Window start
    pub start_time: NaiveTime,

    /// Window end (exclusive)
    pub end_time: NaiveTime,

    /// Suggested slot duration in minutes
    pub slot_minutes: i32,
}

/// Input for creating a doctor profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctor {
    /// Owning user account
    pub user_id: Uuid,

    /// Medical specialization
    pub specialization: String,

    /// Consultation fee in cents
    pub fee_cents: i64,

    /// Years of experience
    pub experience_years: i32,
}

/// Input for updating a doctor profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctor {
    /// New specialization
    pub specialization: Option<String>,

    /// New consultation fee in cents
    pub fee_cents: Option<i64>,

    /// New experience years
    pub experience_years: Option<i32>,

    /// Open or close the profile for booking
    pub active: Option<bool>,
}

/// Input for one availability window (used when replacing the weekly set)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityWindow {
    /// Weekday, 0 = Monday through 6 = Sunday
    pub weekday: i16,

    /// Window start
    pub start_time: NaiveTime,

    /// Window end (exclusive)
    pub end_time: NaiveTime,

    /// Suggested slot duration in minutes
    pub slot_minutes: i32,
}

impl Doctor {
    /// Creates a doctor profile
    ///
    /// # Errors
    ///
    /// Returns an error if the user already owns a profile (unique
    /// constraint), the user doesn't exist, or the database fails.
    pub async fn create(pool: &PgPool, data: CreateDoctor) -> Result<Self, sqlx::Error> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            INSERT INTO doctors (user_id, specialization, fee_cents, experience_years)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, specialization, fee_cents, experience_years,
                      active, deleted, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.specialization)
        .bind(data.fee_cents)
        .bind(data.experience_years)
        .fetch_one(pool)
        .await?;

        Ok(doctor)
    }

    /// Finds a doctor profile by ID
    ///
    /// Soft-deleted profiles are not returned.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, specialization, fee_cents, experience_years,
                   active, deleted, created_at, updated_at
            FROM doctors
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(doctor)
    }

    /// Finds the profile owned by a user account
    ///
    /// This is how a doctor-role caller is mapped to their profile when
    /// scoping queries.
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, specialization, fee_cents, experience_years,
                   active, deleted, created_at, updated_at
            FROM doctors
            WHERE user_id = $1 AND NOT deleted
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(doctor)
    }

    /// Lists doctor profiles with pagination
    ///
    /// Only non-deleted profiles are returned; inactive profiles are
    /// included so the front desk can see who is closed for booking.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let doctors = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, user_id, specialization, fee_cents, experience_years,
                   active, deleted, created_at, updated_at
            FROM doctors
            WHERE NOT deleted
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(doctors)
    }

    /// Updates a doctor profile
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateDoctor,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE doctors SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.specialization.is_some() {
            bind_count += 1;
            query.push_str(&format!(", specialization = ${}", bind_count));
        }
        if data.fee_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", fee_cents = ${}", bind_count));
        }
        if data.experience_years.is_some() {
            bind_count += 1;
            query.push_str(&format!(", experience_years = ${}", bind_count));
        }
        if data.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", active = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND NOT deleted RETURNING id, user_id, specialization, fee_cents, \
             experience_years, active, deleted, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Doctor>(&query).bind(id);

        if let Some(specialization) = data.specialization {
            q = q.bind(specialization);
        }
        if let Some(fee_cents) = data.fee_cents {
            q = q.bind(fee_cents);
        }
        if let Some(experience_years) = data.experience_years {
            q = q.bind(experience_years);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        let doctor = q.fetch_optional(pool).await?;

        Ok(doctor)
    }

    /// Soft-deletes a doctor profile and closes it for booking
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE doctors
            SET deleted = TRUE, active = FALSE, updated_at = NOW()
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl AvailabilityWindow {
    /// Lists the weekly availability windows for a doctor
    pub async fn list_for_doctor(
        pool: &PgPool,
        doctor_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let windows = sqlx::query_as::<_, AvailabilityWindow>(
            r#"
            SELECT id, doctor_id, weekday, start_time, end_time, slot_minutes
            FROM doctor_availability
            WHERE doctor_id = $1
            ORDER BY weekday ASC, start_time ASC
            "#,
        )
        .bind(doctor_id)
        .fetch_all(pool)
        .await?;

        Ok(windows)
    }

    /// Replaces a doctor's weekly availability with a new set of windows
    ///
    /// Runs in a transaction: the old windows are deleted and the new ones
    /// inserted atomically.
    pub async fn replace_for_doctor(
        pool: &PgPool,
        doctor_id: Uuid,
        windows: Vec<SetAvailabilityWindow>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM doctor_availability WHERE doctor_id = $1")
            .bind(doctor_id)
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(windows.len());
        for window in windows {
            let row = sqlx::query_as::<_, AvailabilityWindow>(
                r#"
                INSERT INTO doctor_availability (doctor_id, weekday, start_time, end_time, slot_minutes)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, doctor_id, weekday, start_time, end_time, slot_minutes
                "#,
            )
            .bind(doctor_id)
            .bind(window.weekday)
            .bind(window.start_time)
            .bind(window.end_time)
            .bind(window.slot_minutes)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;

        Ok(created)
    }

    /// Checks whether a window covers the requested time span on a weekday
    ///
    /// Used by the booking service: the appointment must fall entirely
    /// inside one availability window.
    pub async fn covers(
        pool: &PgPool,
        doctor_id: Uuid,
        weekday: i16,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM doctor_availability
                WHERE doctor_id = $1 AND weekday = $2
                  AND start_time <= $3 AND end_time >= $4
            )
            "#,
        )
        .bind(doctor_id)
        .bind(weekday)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_doctor_default() {
        let update = UpdateDoctor::default();
        assert!(update.specialization.is_none());
        assert!(update.fee_cents.is_none());
        assert!(update.experience_years.is_none());
        assert!(update.active.is_none());
    }

    #[test]
    fn test_availability_window_serde() {
        let window = SetAvailabilityWindow {
            weekday: 0,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            slot_minutes: 30,
        };

        let json = serde_json::to_string(&window).unwrap();
        let back: SetAvailabilityWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.weekday, 0);
        assert_eq!(back.start_time, window.start_time);
        assert_eq!(back.end_time, window.end_time);
    }
}
