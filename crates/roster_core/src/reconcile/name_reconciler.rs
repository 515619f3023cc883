use crate::model::entity::{EntityRef, LinkedEntity};
use crate::store::entity_store::{EntityStore, StoreError, StoreResult};
use log::debug;
use std::collections::HashSet;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// One reference per distinct requested name, pre-existing or new.
    pub refs: Vec<EntityRef>,
    /// Names that had no stored entity and were created by this pass.
    pub created: Vec<String>,
}

/// Fetch-or-create over one entity store.
///
/// Concurrent passes over overlapping names can both see a name as missing;
/// the store's uniqueness constraint then fails the later insert with
/// `StoreError::Conflict`, which is returned unchanged.
pub struct NameReconciler<'s, S> {
    store: &'s S,
}

impl<'s, S: EntityStore> NameReconciler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Ensures every name in `names` exists exactly once and returns them.
    ///
    /// # Errors
    /// - `InvalidArgument` when `names` is empty or holds an empty name.
    /// - `Conflict` when a concurrent writer inserted a name first.
    pub fn reconcile(&self, names: &[String]) -> StoreResult<Reconciled> {
        if names.is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "{} names must not be empty",
                <S::Entity as LinkedEntity>::KIND
            )));
        }

        let existing = self.store.get_refs_by_names(names)?;
        let mut known: HashSet<&str> = existing.iter().map(|item| item.name.as_str()).collect();
        let mut created = Vec::new();

        for name in names {
            if known.contains(name.as_str()) {
                continue;
            }
            self.store
                .add(&<S::Entity as LinkedEntity>::named(name.as_str()))?;
            known.insert(name.as_str());
            created.push(name.clone());
        }

        let refs = first_per_name(self.store.get_refs_by_names(names)?);
        debug!(
            "event=reconcile module=reconcile status=ok kind={} requested={} matched={} created={}",
            <S::Entity as LinkedEntity>::KIND,
            names.len(),
            refs.len(),
            created.len()
        );

        Ok(Reconciled { refs, created })
    }
}

/// Keeps the first reference seen for each name; later duplicates are dropped.
fn first_per_name(refs: Vec<EntityRef>) -> Vec<EntityRef> {
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|item| seen.insert(item.name.clone()))
        .collect()
}
