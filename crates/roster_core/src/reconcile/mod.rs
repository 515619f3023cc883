//! Name-based relationship reconciliation.
//!
//! # Responsibility
//! - Turn a list of counterpart names into references to stored counterparts,
//!   creating the ones that do not exist yet.
//! - Look up names without loading association lists.
//!
//! # Invariants
//! - Matching is exact string equality: case-sensitive, no trimming.
//! - One call never creates two entities with the same name.
//! - Reconciliation only adds rows; it never removes associations.

mod name_reconciler;

pub use name_reconciler::{NameReconciler, Reconciled};
