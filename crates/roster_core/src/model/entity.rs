//! Shared entity contracts.
//!
//! # Invariants
//! - Names are matched exactly: no trimming, no case folding.
//! - An empty name is never a valid natural key.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// The two entity kinds linked by the roster association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    Project,
}

impl EntityKind {
    /// Returns the kind on the other side of the association.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Student => Self::Project,
            Self::Project => Self::Student,
        }
    }

    /// Stable lowercase label used in log events and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Project => "project",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Reference to a counterpart entity as seen from the owning side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: Uuid,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Validation failure for entity shape before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// Natural key is the empty string.
    EmptyName(EntityKind),
    /// Identifier is the nil uuid.
    NilId(EntityKind),
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(kind) => write!(f, "{kind} name must not be empty"),
            Self::NilId(kind) => write!(f, "invalid {kind} id: nil uuid"),
        }
    }
}

impl Error for EntityValidationError {}

/// Rejects the nil uuid, which never identifies a stored entity.
pub fn validate_id(kind: EntityKind, id: Uuid) -> Result<(), EntityValidationError> {
    if id.is_nil() {
        return Err(EntityValidationError::NilId(kind));
    }
    Ok(())
}

/// Rejects empty names. Whitespace is significant and kept as-is.
pub fn validate_name(kind: EntityKind, name: &str) -> Result<(), EntityValidationError> {
    if name.is_empty() {
        return Err(EntityValidationError::EmptyName(kind));
    }
    Ok(())
}

/// Kind-parameterized view over `Student` and `Project`.
///
/// The store, reconciler and service layers are written once against this
/// trait and instantiated for both sides of the association.
pub trait LinkedEntity: Clone {
    /// Entity kind on the other side of the association.
    type Counterpart: LinkedEntity;

    const KIND: EntityKind;

    /// Rebuilds an entity from persisted parts.
    fn from_parts(id: Uuid, name: String, counterparts: Vec<EntityRef>) -> Self;

    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    fn counterparts(&self) -> &[EntityRef];

    /// Creates a fresh entity with a generated id and no associations.
    fn named(name: impl Into<String>) -> Self {
        Self::from_parts(Uuid::new_v4(), name.into(), Vec::new())
    }

    /// Reference to this entity, as held by its counterparts.
    fn to_ref(&self) -> EntityRef {
        EntityRef::new(self.id(), self.name())
    }

    /// Names of the linked counterparts, in stored order.
    fn counterpart_names(&self) -> Vec<String> {
        self.counterparts()
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        validate_id(Self::KIND, self.id())?;
        validate_name(Self::KIND, self.name())
    }
}
