//! Command handlers shared by the student and project subcommands.

use anyhow::Result;
use roster_core::dto::{Page, PageRequest};
use roster_core::{
    ensure_path_id, EntityService, LinkedEntity, ProjectDto, RosterConfig, ServiceError,
    StudentDto,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::EntityCommand;

/// Replace body accepted by `update`.
pub(crate) trait ReplaceBody: DeserializeOwned {
    fn into_parts(self) -> (Option<Uuid>, String, Vec<String>);
}

impl ReplaceBody for StudentDto {
    fn into_parts(self) -> (Option<Uuid>, String, Vec<String>) {
        (self.student_id, self.name, self.project_names)
    }
}

impl ReplaceBody for ProjectDto {
    fn into_parts(self) -> (Option<Uuid>, String, Vec<String>) {
        (self.project_id, self.name, self.student_names)
    }
}

/// Runs one command for entity kind `E`, printing `D` (own shape) or `C`
/// (counterpart shape) as JSON.
pub(crate) fn run_entity<E, D, C>(
    conn: &Connection,
    config: &RosterConfig,
    command: EntityCommand,
) -> Result<()>
where
    E: LinkedEntity,
    D: Serialize + ReplaceBody + for<'a> From<&'a E>,
    C: Serialize + for<'a> From<&'a E::Counterpart>,
{
    let service = EntityService::<E>::new(conn);
    match command {
        EntityCommand::Add { name, links } => {
            let created = service.create(&name, &links)?;
            print_json(&D::from(&created))
        }
        EntityCommand::Get { id } => print_json(&D::from(&service.get_by_id(id)?)),
        EntityCommand::List { page, page_size } => {
            let request = PageRequest {
                page_number: page,
                page_size: page_size.unwrap_or(config.page_size),
            };
            let items = service
                .list(request.page_number, request.page_size)?
                .iter()
                .map(D::from)
                .collect();
            print_json(&Page::new(request, items))
        }
        EntityCommand::Update { id, body } => {
            let body: D = serde_json::from_str(&body).map_err(|err| {
                ServiceError::InvalidArgument(format!("malformed {} body: {err}", E::KIND))
            })?;
            let (body_id, name, links) = body.into_parts();
            ensure_path_id(E::KIND, id, body_id)?;
            service.update(id, &name, &links)?;
            print_json(&D::from(&service.get_by_id(id)?))
        }
        EntityCommand::Delete { id } => {
            service.delete_existing(id)?;
            Ok(())
        }
        EntityCommand::Linked { id } => {
            let linked = service.counterparts_of(id)?;
            if linked.is_empty() {
                return Err(ServiceError::NotFound { kind: E::KIND, id }.into());
            }
            let items: Vec<C> = linked.iter().map(C::from).collect();
            print_json(&items)
        }
        EntityCommand::Count { id } => print_json(&service.counterpart_count(id)?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
