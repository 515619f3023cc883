//! Domain model for the student/project roster.
//!
//! # Responsibility
//! - Define the two entity kinds and the reference shape they hold for the
//!   other side of the many-to-many association.
//! - Provide the kind-parameterization (`LinkedEntity`) used by the generic
//!   store, reconciler and service layers.
//!
//! # Invariants
//! - Every entity is identified by a stable `Uuid` assigned at construction.
//! - Association state lives in the join table only; in-memory counterpart
//!   lists are read projections of it.

pub mod entity;
pub mod project;
pub mod student;
