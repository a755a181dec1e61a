//! Database connection utilities.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use storyloom_config::DatabaseConfig;
use storyloom_error::{PersistenceError, PersistenceErrorKind};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Connect using the URL held in the configured environment variable.
///
/// # Errors
///
/// Returns an error if the variable is not set or the connection fails.
pub fn establish_connection(config: &DatabaseConfig) -> Result<PgConnection, PersistenceError> {
    let database_url = std::env::var(&config.url_env).map_err(|_| {
        PersistenceError::new(PersistenceErrorKind::Config(format!(
            "{} environment variable not set",
            config.url_env
        )))
    })?;

    Ok(PgConnection::establish(&database_url)?)
}

/// Apply any migrations the database has not seen yet.
pub fn run_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
        PersistenceError::new(PersistenceErrorKind::Database(format!(
            "Migration failed: {}",
            e
        )))
    })?;
    tracing::info!(applied = applied.len(), "Database migrations applied");
    Ok(())
}
