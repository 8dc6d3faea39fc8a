/// Staff attendance model
///
/// One row per staff member per date, keyed by a UNIQUE (user_id, date)
/// constraint. Check-in and check-out are timestamps; check-out must come
/// after check-in, validated in the route layer and backed by a CHECK
/// constraint.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Attendance status for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Worked that day
    Present,

    /// Did not work and did not take leave
    Absent,

    /// On approved leave
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Leave => "leave",
        }
    }
}

/// One attendance row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    /// Unique row ID
    pub id: Uuid,

    /// Staff user account
    pub user_id: Uuid,

    /// The day this row covers
    pub date: NaiveDate,

    /// Check-in timestamp, if checked in
    pub check_in: Option<DateTime<Utc>>,

    /// Check-out timestamp, if checked out
    pub check_out: Option<DateTime<Utc>>,

    /// Day status
    pub status: AttendanceStatus,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Records a check-in, creating the day's row if needed
    ///
    /// The UNIQUE (user_id, date) key makes repeated check-ins idempotent:
    /// the first timestamp wins.
    pub async fn check_in(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO staff_attendance (user_id, date, check_in, status)
            VALUES ($1, $2, $3, 'present')
            ON CONFLICT (user_id, date)
            DO UPDATE SET check_in = COALESCE(staff_attendance.check_in, EXCLUDED.check_in),
                          status = 'present',
                          updated_at = NOW()
            RETURNING id, user_id, date, check_in, check_out, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(at)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Records a check-out on an existing day row
    ///
    /// Returns None when there is no row for the day or no check-in yet;
    /// the guard that check-out follows check-in lives in the WHERE clause.
    pub async fn check_out(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            UPDATE staff_attendance
            SET check_out = $3, updated_at = NOW()
            WHERE user_id = $1 AND date = $2 AND check_in IS NOT NULL AND check_in < $3
            RETURNING id, user_id, date, check_in, check_out, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(at)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Marks a day as absent or on leave
    pub async fn mark(
        pool: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO staff_attendance (user_id, date, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, date)
            DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
            RETURNING id, user_id, date, check_in, check_out, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Lists attendance for one user across a date range
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, user_id, date, check_in, check_out, status, created_at, updated_at
            FROM staff_attendance
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Lists all attendance on one day
    pub async fn list_on_date(pool: &PgPool, date: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, user_id, date, check_in, check_out, status, created_at, updated_at
            FROM staff_attendance
            WHERE date = $1
            ORDER BY check_in ASC NULLS LAST
            "#,
        )
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_status_as_str() {
        assert_eq!(AttendanceStatus::Present.as_str(), "present");
        assert_eq!(AttendanceStatus::Absent.as_str(), "absent");
        assert_eq!(AttendanceStatus::Leave.as_str(), "leave");
    }
}
