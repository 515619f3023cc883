//! SQLite bootstrap and schema migrations for the roster store.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No roster data is read or written before migrations succeed.
//! - Every engine failure records the step it happened in.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Step of the connection lifecycle an engine failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbStage {
    /// Opening the file or in-memory handle.
    Open,
    /// Connection pragmas (foreign keys, busy timeout, journal mode).
    Configure,
    /// Reading `PRAGMA user_version`.
    ReadVersion,
    /// Running the migration that brings the schema to `version`.
    Migrate { version: u32 },
    /// A roster statement issued by the store.
    Statement,
}

impl Display for DbStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("opening the database"),
            Self::Configure => f.write_str("configuring the connection"),
            Self::ReadVersion => f.write_str("reading the schema version"),
            Self::Migrate { version } => write!(f, "applying migration {version}"),
            Self::Statement => f.write_str("running a roster statement"),
        }
    }
}

/// Failure from the persistence engine, tagged with where it happened.
#[derive(Debug)]
pub enum DbError {
    Engine {
        stage: DbStage,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Adapter for `map_err` that tags a raw engine error with `stage`.
    pub fn at(stage: DbStage) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Engine { stage, source }
    }

    /// Stage of an engine failure; `None` for schema version mismatches.
    pub fn stage(&self) -> Option<DbStage> {
        match self {
            Self::Engine { stage, .. } => Some(*stage),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine { stage, source } => write!(f, "sqlite failed while {stage}: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "roster file has schema version {db_version}, this build reads up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DbError, DbStage};

    #[test]
    fn engine_errors_name_their_stage() {
        let err = DbError::at(DbStage::Migrate { version: 3 })(rusqlite::Error::InvalidQuery);
        assert_eq!(err.stage(), Some(DbStage::Migrate { version: 3 }));
        assert!(err.to_string().contains("applying migration 3"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
