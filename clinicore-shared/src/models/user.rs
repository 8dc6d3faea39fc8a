/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing
/// clinic accounts. Every account carries exactly one [`Role`]; doctor-role
/// users additionally own a `Doctor` profile row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'doctor', 'nurse', 'receptionist', 'patient');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use clinicore_shared::models::user::{User, CreateUser, Role};
/// use clinicore_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Amira Hassan".to_string(),
///     email: "amira@clinic.example".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Receptionist,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "amira@clinic.example").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Clinic roles
///
/// A closed enum: every authorization decision is a lookup against this type,
/// never a string comparison. An unknown role string fails to deserialize,
/// which denies access rather than granting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative control
    Admin,

    /// Clinical staff with a doctor profile; sees assigned appointments
    Doctor,

    /// Clinical support staff
    Nurse,

    /// Front desk: booking and billing, full appointment visibility
    Receptionist,

    /// A patient of the clinic; sees only their own records
    Patient,
}

impl Role {
    /// Role name for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
        }
    }

    /// Staff roles are everyone except patients
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient)
    }
}

/// User model representing a clinic account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Clinic role
    pub role: Role,

    /// Whether the account may log in
    pub active: bool,

    /// Soft-delete flag; deleted accounts are invisible to queries
    pub deleted: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (stored case-insensitively)
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    /// Clinic role
    pub role: Role,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// Activate or deactivate the account
    pub active: Option<bool>,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, active, deleted,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// Soft-deleted accounts are not returned.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, active, deleted,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, active, deleted,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1 AND NOT deleted
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// refreshed.
    ///
    /// # Errors
    ///
    /// Returns an error if the new email already belongs to another user or
    /// the database connection fails.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", active = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND NOT deleted RETURNING id, name, email, password_hash, role, \
             active, deleted, created_at, updated_at, last_login_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Soft-deletes a user
    ///
    /// The row stays in storage with `deleted = TRUE` and also loses its
    /// `active` flag, so the account can no longer log in.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted = TRUE, active = FALSE, updated_at = NOW()
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp after successful authentication
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, optionally filtered by role
    ///
    /// Ordered by creation date, newest first. Soft-deleted accounts are
    /// excluded.
    pub async fn list(
        pool: &PgPool,
        role: Option<Role>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, active, deleted,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE NOT deleted AND ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Lists the IDs of active users holding a given role
    ///
    /// Used by the notification dispatcher to fan out role-targeted messages
    /// (e.g. low-stock alerts to admins).
    pub async fn ids_by_role(pool: &PgPool, role: Role) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users WHERE role = $1 AND active AND NOT deleted",
        )
        .bind(role)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Counts non-deleted users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE NOT deleted")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Doctor.as_str(), "doctor");
        assert_eq!(Role::Nurse.as_str(), "nurse");
        assert_eq!(Role::Receptionist.as_str(), "receptionist");
        assert_eq!(Role::Patient.as_str(), "patient");
    }

    #[test]
    fn test_role_is_staff() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Doctor.is_staff());
        assert!(Role::Nurse.is_staff());
        assert!(Role::Receptionist.is_staff());
        assert!(!Role::Patient.is_staff());
    }

    #[test]
    fn test_role_serde_roundtrip() {
        let json = serde_json::to_string(&Role::Receptionist).unwrap();
        assert_eq!(json, "\"receptionist\"");

        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::Receptionist);

        // Unknown role strings fail closed at the deserialization boundary
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.active.is_none());
    }

    // Integration tests for database operations are in tests/ and require a
    // running database
}
