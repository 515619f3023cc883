//! Entity store contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define the per-kind data access contract (`EntityStore`).
//! - Keep SQL and join-table details out of reconciliation and services.
//!
//! # Invariants
//! - Writes validate the entity before touching SQL.
//! - Every call is atomic on its own, including when nested inside a
//!   service-level transaction.
//! - Engine failures keep their original cause in `Error::source`.

pub mod entity_store;
pub mod sqlite_store;
