//! Core domain logic for the student/project roster.
//! This crate owns the association invariants; outer surfaces stay thin.

pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod store;

pub use config::{ConfigError, RosterConfig};
pub use dto::{ensure_path_id, Page, PageRequest, ProjectDto, StudentDto};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entity::{EntityKind, EntityRef, EntityValidationError, LinkedEntity};
pub use model::project::{Project, ProjectId};
pub use model::student::{Student, StudentId};
pub use reconcile::{NameReconciler, Reconciled};
pub use service::entity_service::{
    EntityService, ProjectService, ServiceError, ServiceResult, StudentService,
};
pub use store::entity_store::{EntityStore, StoreError, StoreResult};
pub use store::sqlite_store::SqliteEntityStore;
