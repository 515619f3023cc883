//! Student entity.

use crate::model::entity::{EntityKind, EntityRef, LinkedEntity};
use crate::model::project::Project;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable student identifier.
pub type StudentId = Uuid;

/// Student record with its linked projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    /// Natural key, expected unique among students.
    pub name: String,
    /// Linked projects; order carries no meaning.
    pub projects: Vec<EntityRef>,
}

impl Student {
    /// Creates a student with a generated id and no projects.
    pub fn new(name: impl Into<String>) -> Self {
        Self::named(name)
    }
}

impl LinkedEntity for Student {
    type Counterpart = Project;

    const KIND: EntityKind = EntityKind::Student;

    fn from_parts(id: Uuid, name: String, counterparts: Vec<EntityRef>) -> Self {
        Self {
            id,
            name,
            projects: counterparts,
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn counterparts(&self) -> &[EntityRef] {
        &self.projects
    }
}
