/// Database migration runner
///
/// Runs schema migrations using sqlx's embedded migration system. Migration
/// files live in the `migrations/` directory at this crate's root, named
/// `{timestamp}_{name}.sql`, and are compiled into the binary.
///
/// # Example
///
/// ```no_run
/// use clinicore_shared::db::pool::{create_pool, DatabaseConfig};
/// use clinicore_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///
///     Ok(())
/// }
/// ```

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// Migrations already applied are skipped; a failed migration is rolled back
/// and returned as an error.
///
/// # Errors
///
/// Returns an error if:
/// - A migration fails to execute
/// - The migrations table cannot be created or read
/// - Database connection is lost during migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
