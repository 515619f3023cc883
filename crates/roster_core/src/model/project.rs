//! Project entity.

use crate::model::entity::{EntityKind, EntityRef, LinkedEntity};
use crate::model::student::Student;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Project record with its linked students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Natural key, expected unique among projects.
    pub name: String,
    pub students: Vec<EntityRef>,
}

impl Project {
    /// Creates a project with a generated id and no students.
    pub fn new(name: impl Into<String>) -> Self {
        Self::named(name)
    }
}

impl LinkedEntity for Project {
    type Counterpart = Student;

    const KIND: EntityKind = EntityKind::Project;

    fn from_parts(id: Uuid, name: String, counterparts: Vec<EntityRef>) -> Self {
        Self {
            id,
            name,
            students: counterparts,
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn counterparts(&self) -> &[EntityRef] {
        &self.students
    }
}
