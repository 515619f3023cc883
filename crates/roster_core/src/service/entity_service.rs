//! Student/project use-case service.
//!
//! # Responsibility
//! - Orchestrate reconciliation and store calls for both entity kinds.
//! - Own the transaction boundary of every multi-step write.
//!
//! # Invariants
//! - Input validation runs before any store call.
//! - Create reconciles counterpart names (fetch-or-create, then link); an
//!   empty name list is rejected like any other reconciliation input.
//! - Update replaces the counterpart set with freshly created counterparts
//!   and does not look up existing ones; a name already in use fails with
//!   `Conflict`. This differs from create and is kept as-is.
//! - Delete never removes counterpart entities.
//! - `Conflict` is returned to the caller, never retried.

use crate::error::ErrorKind;
use crate::model::entity::{
    validate_id, validate_name, EntityKind, EntityValidationError, LinkedEntity,
};
use crate::model::project::Project;
use crate::model::student::Student;
use crate::reconcile::NameReconciler;
use crate::store::entity_store::{EntityStore, StoreError};
use crate::store::sqlite_store::{page_offset, SqliteEntityStore};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for roster use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before touching storage.
    InvalidArgument(String),
    /// Target entity does not exist.
    NotFound { kind: EntityKind, id: Uuid },
    /// A uniqueness constraint rejected the write.
    Conflict(StoreError),
    /// Any other persistence failure.
    Store(StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Message safe to show to a remote caller. Storage internals stay out.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidArgument(_) | Self::NotFound { .. } | Self::Conflict(_) => {
                self.to_string()
            }
            Self::Store(_) => "internal storage error".to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Conflict(err) | Self::Store(err) => Some(err),
            Self::InvalidArgument(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidArgument(message) => Self::InvalidArgument(message),
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            conflict @ StoreError::Conflict { .. } => Self::Conflict(conflict),
            other => Self::Store(other),
        }
    }
}

impl From<EntityValidationError> for ServiceError {
    fn from(value: EntityValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Student use-cases: counterparts are projects.
pub type StudentService<'conn> = EntityService<'conn, Student>;

/// Project use-cases: counterparts are students.
pub type ProjectService<'conn> = EntityService<'conn, Project>;

/// Use-case service for one entity kind over a migrated connection.
///
/// One service value is one request-scoped unit of work holder; concurrent
/// requests use separate connections.
pub struct EntityService<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: LinkedEntity> EntityService<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Creates an entity linked to the named counterparts, creating any
    /// counterpart that does not exist yet.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty entity name, an empty counterpart
    ///   name, or an empty counterpart list; nothing is written.
    /// - `Conflict` when the name is taken, or a concurrent writer created a
    ///   counterpart first.
    pub fn create(&self, name: &str, counterpart_names: &[String]) -> ServiceResult<E> {
        validate_name(E::KIND, name)?;
        if counterpart_names.is_empty() {
            return Err(ServiceError::InvalidArgument(format!(
                "{} names must not be empty",
                E::KIND.counterpart()
            )));
        }
        validate_counterpart_names::<E>(counterpart_names)?;

        let result = self.write("create", |tx| {
            let store = SqliteEntityStore::<E::Counterpart>::new(tx);
            let counterparts = NameReconciler::new(&store)
                .reconcile(counterpart_names)?
                .refs;

            let entity = E::from_parts(Uuid::new_v4(), name.to_string(), counterparts);
            Ok(SqliteEntityStore::<E>::new(tx).add(&entity)?)
        });

        match &result {
            Ok(created) => info!(
                "event=entity_create module=service status=ok kind={} id={} counterparts={}",
                E::KIND,
                created.id(),
                created.counterparts().len()
            ),
            Err(err) => warn!(
                "event=entity_create module=service status=error kind={} error_kind={} error={}",
                E::KIND,
                err.kind(),
                err
            ),
        }
        result
    }

    /// Gets one entity by id.
    pub fn get_by_id(&self, id: Uuid) -> ServiceResult<E> {
        self.find(id)?.ok_or(ServiceError::NotFound { kind: E::KIND, id })
    }

    /// Gets one entity by id, `None` when absent.
    pub fn find(&self, id: Uuid) -> ServiceResult<Option<E>> {
        validate_id(E::KIND, id)?;
        Ok(self.store().get_by_id(id)?)
    }

    /// Lists one page of entities with their counterparts populated.
    pub fn list(&self, page: i64, page_size: i64) -> ServiceResult<Vec<E>> {
        page_offset(page, page_size)?;
        Ok(self.store().list(page, page_size)?)
    }

    /// Replaces name and full counterpart set of an existing entity.
    ///
    /// Every name becomes a newly inserted counterpart; existing counterparts
    /// with the same name are not reused, so such an update fails with
    /// `Conflict` and leaves the entity unchanged.
    pub fn update(&self, id: Uuid, name: &str, counterpart_names: &[String]) -> ServiceResult<()> {
        validate_id(E::KIND, id)?;
        validate_name(E::KIND, name)?;
        validate_counterpart_names::<E>(counterpart_names)?;

        let result = self.write("update", |tx| {
            let own = SqliteEntityStore::<E>::new(tx);
            if !own.exists(id)? {
                return Err(ServiceError::NotFound { kind: E::KIND, id });
            }

            let other = SqliteEntityStore::<E::Counterpart>::new(tx);
            let mut counterparts = Vec::with_capacity(counterpart_names.len());
            for counterpart_name in counterpart_names {
                let fresh = <E::Counterpart as LinkedEntity>::named(counterpart_name.as_str());
                counterparts.push(other.add(&fresh)?.to_ref());
            }

            own.update(&E::from_parts(id, name.to_string(), counterparts))?;
            Ok(())
        });

        self.log_write("entity_update", id, &result);
        result
    }

    /// Deletes an entity and its association rows. Unknown ids are a no-op.
    pub fn delete(&self, id: Uuid) -> ServiceResult<()> {
        validate_id(E::KIND, id)?;
        let result = self.write("delete", |tx| {
            Ok(SqliteEntityStore::<E>::new(tx).delete(id)?)
        });
        self.log_write("entity_delete", id, &result);
        result
    }

    /// Deletes an entity that must exist; `NotFound` otherwise.
    ///
    /// The existence check and the delete share one transaction.
    pub fn delete_existing(&self, id: Uuid) -> ServiceResult<()> {
        validate_id(E::KIND, id)?;
        let result = self.write("delete", |tx| {
            let store = SqliteEntityStore::<E>::new(tx);
            if !store.exists(id)? {
                return Err(ServiceError::NotFound { kind: E::KIND, id });
            }
            Ok(store.delete(id)?)
        });
        self.log_write("entity_delete", id, &result);
        result
    }

    /// Number of linked counterparts; 0 when the entity does not exist.
    pub fn counterpart_count(&self, id: Uuid) -> ServiceResult<u64> {
        validate_id(E::KIND, id)?;
        Ok(self.store().count_counterparts(id)?)
    }

    /// Counterpart entities linked to `id`; empty when the entity does not
    /// exist.
    pub fn counterparts_of(&self, id: Uuid) -> ServiceResult<Vec<E::Counterpart>> {
        validate_id(E::KIND, id)?;
        Ok(self.store().get_counterparts_of(id)?)
    }

    fn store(&self) -> SqliteEntityStore<'conn, E> {
        SqliteEntityStore::new(self.conn)
    }

    /// Runs `body` in one immediate transaction.
    ///
    /// Commits only when `body` succeeds; any other exit drops the
    /// `Transaction`, which rolls back.
    fn write<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&Transaction<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| StoreError::from_sqlite(E::KIND, operation, err))?;
        let value = body(&tx)?;
        tx.commit()
            .map_err(|err| StoreError::from_sqlite(E::KIND, operation, err))?;
        Ok(value)
    }

    fn log_write(&self, event: &str, id: Uuid, result: &ServiceResult<()>) {
        match result {
            Ok(()) => info!(
                "event={event} module=service status=ok kind={} id={id}",
                E::KIND
            ),
            Err(err) => warn!(
                "event={event} module=service status=error kind={} id={id} error_kind={} error={}",
                E::KIND,
                err.kind(),
                err
            ),
        }
    }
}

fn validate_counterpart_names<E: LinkedEntity>(names: &[String]) -> ServiceResult<()> {
    for name in names {
        validate_name(E::KIND.counterpart(), name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::db::DbError;
    use crate::error::ErrorKind;
    use crate::model::entity::EntityKind;
    use crate::store::entity_store::StoreError;
    use uuid::Uuid;

    #[test]
    fn store_errors_keep_their_kind_through_the_service() {
        let not_found: ServiceError = StoreError::NotFound {
            kind: EntityKind::Student,
            id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let invalid: ServiceError = StoreError::InvalidArgument("x".to_string()).into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn public_message_hides_storage_details() {
        let err: ServiceError = StoreError::Db {
            kind: EntityKind::Project,
            operation: "list",
            source: DbError::UnsupportedSchemaVersion {
                db_version: 9,
                latest_supported: 1,
            },
        }
        .into();
        assert_eq!(err.kind().http_status(), 500);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.public_message(), "internal storage error");
    }
}
