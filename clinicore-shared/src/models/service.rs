/// Clinic service catalog
///
/// A catalog entry describes a billable service (consultation, lab panel,
/// vaccination) that an appointment or invoice line can reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Catalog entry for a billable clinic service
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClinicService {
    /// Unique service ID
    pub id: Uuid,

    /// Service name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Price in cents
    pub price_cents: i64,

    /// Default duration in minutes
    pub duration_minutes: i32,

    /// Whether the service is currently offered
    pub active: bool,

    /// Soft-delete flag
    pub deleted: bool,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// When the entry was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
}

/// Input for updating a catalog entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateService {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub active: Option<bool>,
}

impl ClinicService {
    /// Creates a catalog entry
    pub async fn create(pool: &PgPool, data: CreateService) -> Result<Self, sqlx::Error> {
        let service = sqlx::query_as::<_, ClinicService>(
            r#"
            INSERT INTO services (name, description, price_cents, duration_minutes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price_cents, duration_minutes,
                      active, deleted, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.price_cents)
        .bind(data.duration_minutes)
        .fetch_one(pool)
        .await?;

        Ok(service)
    }

    /// Finds a catalog entry by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let service = sqlx::query_as::<_, ClinicService>(
            r#"
            SELECT id, name, description, price_cents, duration_minutes,
                   active, deleted, created_at, updated_at
            FROM services
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(service)
    }

    /// Lists catalog entries, active first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let services = sqlx::query_as::<_, ClinicService>(
            r#"
            SELECT id, name, description, price_cents, duration_minutes,
                   active, deleted, created_at, updated_at
            FROM services
            WHERE NOT deleted
            ORDER BY active DESC, name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(services)
    }

    /// Updates a catalog entry
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateService,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE services SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.price_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", price_cents = ${}", bind_count));
        }
        if data.duration_minutes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", duration_minutes = ${}", bind_count));
        }
        if data.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", active = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND NOT deleted RETURNING id, name, description, price_cents, \
             duration_minutes, active, deleted, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, ClinicService>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(price_cents) = data.price_cents {
            q = q.bind(price_cents);
        }
        if let Some(duration_minutes) = data.duration_minutes {
            q = q.bind(duration_minutes);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        let service = q.fetch_optional(pool).await?;

        Ok(service)
    }

    /// Soft-deletes a catalog entry
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE services SET deleted = TRUE, active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
