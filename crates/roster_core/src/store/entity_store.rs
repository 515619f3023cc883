//! Entity store contract and error type.

use crate::db::{DbError, DbStage};
use crate::error::ErrorKind;
use crate::model::entity::{EntityKind, EntityRef, EntityValidationError, LinkedEntity};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for entity persistence and queries.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before any SQL ran.
    InvalidArgument(String),
    /// Target id does not exist.
    NotFound { kind: EntityKind, id: Uuid },
    /// Uniqueness violation (name or id) reported by SQLite.
    Conflict {
        kind: EntityKind,
        operation: &'static str,
        source: rusqlite::Error,
    },
    /// Any other engine failure, with the operation that hit it.
    Db {
        kind: EntityKind,
        operation: &'static str,
        source: DbError,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Db { .. } => ErrorKind::Store,
        }
    }

    /// Classifies a raw SQLite error raised while running `operation`.
    pub fn from_sqlite(kind: EntityKind, operation: &'static str, err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            return Self::Conflict {
                kind,
                operation,
                source: err,
            };
        }
        Self::Db {
            kind,
            operation,
            source: DbError::at(DbStage::Statement)(err),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Conflict {
                kind, operation, ..
            } => write!(f, "{kind} {operation} conflicts with an existing {kind}"),
            Self::Db {
                kind, operation, ..
            } => write!(f, "{kind} {operation} failed in storage"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Conflict { source, .. } => Some(source),
            Self::Db { source, .. } => Some(source),
            Self::InvalidArgument(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<EntityValidationError> for StoreError {
    fn from(value: EntityValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Persistence contract for one entity kind.
///
/// Counterpart lists on returned entities are loaded from the join table.
pub trait EntityStore {
    type Entity: LinkedEntity;

    /// Returns the entity, or `None` when the id is unknown.
    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Self::Entity>>;

    /// Returns whether the id resolves to a stored entity.
    fn exists(&self, id: Uuid) -> StoreResult<bool>;

    /// Returns one page in stable creation order. `page` is 1-based and both
    /// arguments must be positive.
    fn list(&self, page: i64, page_size: i64) -> StoreResult<Vec<Self::Entity>>;

    /// Inserts the entity and its association rows, returning the stored
    /// read-back.
    fn add(&self, entity: &Self::Entity) -> StoreResult<Self::Entity>;

    /// Replaces name and full association set of an existing entity.
    fn update(&self, entity: &Self::Entity) -> StoreResult<()>;

    /// Removes the entity and its association rows. Unknown ids are a no-op.
    fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Returns entities whose name is in `names`. `names` must not be empty.
    fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<Self::Entity>>;

    /// Like `get_by_names`, but returns only `(id, name)` without loading
    /// associations. Same order, same empty-input rule.
    fn get_refs_by_names(&self, names: &[String]) -> StoreResult<Vec<EntityRef>>;

    /// Returns the counterpart entities linked to `id`.
    fn get_counterparts_of(
        &self,
        id: Uuid,
    ) -> StoreResult<Vec<<Self::Entity as LinkedEntity>::Counterpart>>;

    /// Counts association rows for `id`; unknown ids count zero.
    fn count_counterparts(&self, id: Uuid) -> StoreResult<u64>;
}
