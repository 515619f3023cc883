//! Transfer shapes for the request surface.
//!
//! Conversions are explicit, field by field. Counterparts travel as names
//! only, so a response never expands the association graph.

use crate::model::entity::{EntityKind, LinkedEntity};
use crate::model::project::Project;
use crate::model::student::Student;
use crate::service::entity_service::ServiceError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_NUMBER: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Student as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDto {
    #[serde(default)]
    pub student_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub project_names: Vec<String>,
}

/// Project as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    #[serde(default)]
    pub project_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub student_names: Vec<String>,
}

impl From<&Student> for StudentDto {
    fn from(value: &Student) -> Self {
        Self {
            student_id: Some(value.id),
            name: value.name.clone(),
            project_names: value.counterpart_names(),
        }
    }
}

impl From<&Project> for ProjectDto {
    fn from(value: &Project) -> Self {
        Self {
            project_id: Some(value.id),
            name: value.name.clone(),
            student_names: value.counterpart_names(),
        }
    }
}

/// Paging query with the surface defaults (page 1, size 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of transfer objects, echoing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page_number: i64,
    pub page_size: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, items: Vec<T>) -> Self {
        Self {
            page_number: request.page_number,
            page_size: request.page_size,
            items,
        }
    }
}

/// Replace requests must carry the id of the resource they target.
pub fn ensure_path_id(
    kind: EntityKind,
    path_id: Uuid,
    body_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    match body_id {
        Some(body_id) if body_id == path_id => Ok(()),
        Some(body_id) => Err(ServiceError::InvalidArgument(format!(
            "{kind} id in body ({body_id}) does not match path id ({path_id})"
        ))),
        None => Err(ServiceError::InvalidArgument(format!(
            "{kind} id is required in body"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_path_id, PageRequest, ProjectDto, StudentDto};
    use crate::model::entity::{EntityKind, EntityRef};
    use crate::model::project::Project;
    use crate::model::student::Student;
    use uuid::Uuid;

    #[test]
    fn student_dto_carries_project_names_only() {
        let mut student = Student::new("Ann");
        student.projects = vec![EntityRef::new(Uuid::new_v4(), "Alpha")];

        let dto = StudentDto::from(&student);

        assert_eq!(dto.student_id, Some(student.id));
        assert_eq!(dto.project_names, vec!["Alpha".to_string()]);
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["projectNames"][0], "Alpha");
        assert!(json.get("projects").is_none());
    }

    #[test]
    fn project_dto_accepts_body_without_id() {
        let dto: ProjectDto =
            serde_json::from_str(r#"{"name":"Alpha","studentNames":["Ann","Bob"]}"#).unwrap();
        assert_eq!(dto.project_id, None);
        assert_eq!(dto.student_names.len(), 2);

        let project = Project::new("Beta");
        assert_eq!(ProjectDto::from(&project).student_names, Vec::<String>::new());
    }

    #[test]
    fn page_request_defaults_to_first_page_of_ten() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());
        assert_eq!((request.page_number, request.page_size), (1, 10));
    }

    #[test]
    fn ensure_path_id_requires_matching_body_id() {
        let id = Uuid::new_v4();
        assert!(ensure_path_id(EntityKind::Project, id, Some(id)).is_ok());
        assert!(ensure_path_id(EntityKind::Project, id, Some(Uuid::new_v4())).is_err());
        assert!(ensure_path_id(EntityKind::Project, id, None).is_err());
    }
}
