//! SQLite storage bootstrap and schema migrations.
//!
//! # Responsibility
//! - Open and configure connections for the account store.
//! - Apply schema migrations before any account data is touched.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer binary is refused, not downgraded.
//! - A failed migration leaves the previous schema version in place.
//!
//! # See also
//! - `crate::repo::account_repo`

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap and transport failures.
#[derive(Debug)]
pub enum DbError {
    /// Connection, pragma, or statement failure outside a migration step.
    Sqlite(rusqlite::Error),
    /// The SQL of migration `version` was rejected; the transaction rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a binary with a newer account schema.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl DbError {
    /// Stable code used in `db_open` log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite",
            Self::Migration { .. } => "db_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "account database error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "account schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "account database is at schema {found}; this build understands up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn migration_error_names_the_version_and_keeps_the_cause() {
        let err = DbError::Migration {
            version: 3,
            source: rusqlite::Error::InvalidQuery,
        };

        assert_eq!(err.code(), "db_migration_failed");
        assert!(err.to_string().contains("migration 3"));
        assert!(err.source().is_some());
    }

    #[test]
    fn schema_too_new_has_no_cause() {
        let err = DbError::UnsupportedSchemaVersion {
            found: 9,
            supported: 1,
        };

        assert_eq!(err.code(), "db_schema_too_new");
        assert!(err.source().is_none());
    }
}
