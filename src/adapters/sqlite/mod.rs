//! SQLite adapters for the reminder scheduling stores.

pub mod connection;
pub mod group_repository;
pub mod migrations;
pub mod pattern_repository;
pub mod preference_repository;
pub mod progress_repository;
pub mod reminder_repository;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use group_repository::SqliteGroupRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use pattern_repository::SqlitePatternRepository;
pub use preference_repository::SqlitePreferenceRepository;
pub use progress_repository::SqliteProgressRepository;
pub use reminder_repository::SqliteReminderRepository;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an ISO-8601 calendar date from a SQLite row field.
pub fn parse_date(s: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an IANA timezone name from a SQLite row field.
pub fn parse_timezone(s: &str) -> DomainResult<Tz> {
    s.parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(s.to_string()))
}

/// Build a `?, ?, ...` placeholder list for a dynamic IN clause.
///
/// Callers must skip the query entirely when the key set is empty; SQLite
/// rejects `IN ()`.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(database_url: &str, pool_config: Option<PoolConfig>) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, pool_config).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Pacific/Auckland").is_ok());
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(DomainError::InvalidTimezone(_))
        ));
    }

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool.clone());
        let applied = migrator.run_embedded_migrations(all_embedded_migrations()).await.unwrap();
        assert_eq!(applied, 1);

        // Second run is a no-op
        let applied = migrator.run_embedded_migrations(all_embedded_migrations()).await.unwrap();
        assert_eq!(applied, 0);
        assert_eq!(migrator.get_current_version().await.unwrap(), 1);
    }
}
