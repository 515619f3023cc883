//! SQLite-backed entity store.
//!
//! # Responsibility
//! - Map `EntityStore` calls onto `students`, `projects` and the
//!   `project_students` join table.
//! - Classify SQLite failures into `StoreError` kinds.
//!
//! # Invariants
//! - Multi-statement writes run inside a savepoint, so they compose with an
//!   enclosing transaction and still roll back on their own failure.
//! - Association pairs are never duplicated.
//! - Result order is `created_at ASC, id ASC`.

use crate::model::entity::{validate_id, EntityKind, EntityRef, LinkedEntity};
use crate::store::entity_store::{EntityStore, StoreError, StoreResult};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use uuid::Uuid;

const LINK_TABLE: &str = "project_students";
const WRITE_SAVEPOINT: &str = "roster_store_write";
// Well under SQLite's bound-variable limit.
const NAME_LOOKUP_CHUNK: usize = 500;

/// Table layout for one side of the association.
#[derive(Debug, Clone, Copy)]
struct Side {
    table: &'static str,
    link_column: &'static str,
}

fn side(kind: EntityKind) -> Side {
    match kind {
        EntityKind::Student => Side {
            table: "students",
            link_column: "student_id",
        },
        EntityKind::Project => Side {
            table: "projects",
            link_column: "project_id",
        },
    }
}

/// Entity store over a borrowed connection.
///
/// Accepts a `rusqlite::Transaction` through deref, which is how services
/// group several store calls into one unit of work.
pub struct SqliteEntityStore<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: LinkedEntity> SqliteEntityStore<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    fn fail(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
        move |err| StoreError::from_sqlite(E::KIND, operation, err)
    }

    fn load(&self, id: Uuid) -> rusqlite::Result<Option<E>> {
        let own = side(E::KIND);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, name FROM {} WHERE id = ?1;", own.table))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => {
                let (id, name) = parse_head(row)?;
                let counterparts = load_refs(self.conn, E::KIND, id)?;
                Ok(Some(E::from_parts(id, name, counterparts)))
            }
            None => Ok(None),
        }
    }

    fn hydrate(&self, heads: Vec<(Uuid, String)>) -> rusqlite::Result<Vec<E>> {
        heads
            .into_iter()
            .map(|(id, name)| {
                let counterparts = load_refs(self.conn, E::KIND, id)?;
                Ok(E::from_parts(id, name, counterparts))
            })
            .collect()
    }

    /// Name lookup in chunks of at most `NAME_LOOKUP_CHUNK` bound values,
    /// merged back into `created_at, id` order.
    fn heads_by_names(&self, names: &[String]) -> rusqlite::Result<Vec<EntityRef>> {
        let unique: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let own = side(E::KIND);

        let mut found: Vec<(i64, EntityRef)> = Vec::new();
        for chunk in unique.chunks(NAME_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "SELECT id, name, created_at FROM {} WHERE name IN ({placeholders});",
                own.table
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                let (id, name) = parse_head(row)?;
                Ok((row.get::<_, i64>(2)?, EntityRef { id, name }))
            })?;
            for row in rows {
                found.push(row?);
            }
        }

        found.sort_by(|(left_at, left), (right_at, right)| {
            left_at.cmp(right_at).then_with(|| left.id.cmp(&right.id))
        });
        Ok(found.into_iter().map(|(_, item)| item).collect())
    }

    fn insert_links(&self, id: Uuid, counterparts: &[EntityRef]) -> rusqlite::Result<()> {
        let own = side(E::KIND);
        let other = side(E::KIND.counterpart());
        let sql = format!(
            "INSERT OR IGNORE INTO {LINK_TABLE} ({}, {}) VALUES (?1, ?2);",
            own.link_column, other.link_column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        for counterpart in counterparts {
            stmt.execute(params![id.to_string(), counterpart.id.to_string()])?;
        }
        Ok(())
    }

    fn delete_links(&self, id: Uuid) -> rusqlite::Result<()> {
        let own = side(E::KIND);
        self.conn.execute(
            &format!(
                "DELETE FROM {LINK_TABLE} WHERE {} = ?1;",
                own.link_column
            ),
            [id.to_string()],
        )?;
        Ok(())
    }
}

impl<E: LinkedEntity> EntityStore for SqliteEntityStore<'_, E> {
    type Entity = E;

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<E>> {
        validate_id(E::KIND, id)?;
        self.load(id).map_err(Self::fail("get"))
    }

    fn exists(&self, id: Uuid) -> StoreResult<bool> {
        validate_id(E::KIND, id)?;
        let own = side(E::KIND);
        let exists: i64 = self
            .conn
            .query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
                    own.table
                ),
                [id.to_string()],
                |row| row.get(0),
            )
            .map_err(Self::fail("exists"))?;
        Ok(exists == 1)
    }

    fn list(&self, page: i64, page_size: i64) -> StoreResult<Vec<E>> {
        let offset = page_offset(page, page_size)?;
        let own = side(E::KIND);
        let sql = format!(
            "SELECT id, name FROM {}
             ORDER BY created_at ASC, id ASC
             LIMIT ?1 OFFSET ?2;",
            own.table
        );
        let list = || -> rusqlite::Result<Vec<E>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let heads = stmt
                .query_map(params![page_size, offset], parse_head)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            self.hydrate(heads)
        };
        list().map_err(Self::fail("list"))
    }

    fn add(&self, entity: &E) -> StoreResult<E> {
        entity.validate()?;
        let own = side(E::KIND);
        let id = entity.id();

        in_savepoint(self.conn, || {
            self.conn.execute(
                &format!("INSERT INTO {} (id, name) VALUES (?1, ?2);", own.table),
                params![id.to_string(), entity.name()],
            )?;
            self.insert_links(id, entity.counterparts())
        })
        .map_err(Self::fail("add"))?;

        self.load(id)
            .map_err(Self::fail("add"))?
            .ok_or(StoreError::NotFound { kind: E::KIND, id })
    }

    fn update(&self, entity: &E) -> StoreResult<()> {
        entity.validate()?;
        let own = side(E::KIND);
        let id = entity.id();

        let changed = in_savepoint(self.conn, || {
            let changed = self.conn.execute(
                &format!("UPDATE {} SET name = ?2 WHERE id = ?1;", own.table),
                params![id.to_string(), entity.name()],
            )?;
            if changed == 0 {
                return Ok(0);
            }
            self.delete_links(id)?;
            self.insert_links(id, entity.counterparts())?;
            Ok(changed)
        })
        .map_err(Self::fail("update"))?;

        if changed == 0 {
            return Err(StoreError::NotFound { kind: E::KIND, id });
        }
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StoreResult<()> {
        validate_id(E::KIND, id)?;
        let own = side(E::KIND);
        in_savepoint(self.conn, || {
            // Join rows go explicitly so the no-cascade-to-counterparts rule
            // holds even on connections opened without foreign_keys.
            self.delete_links(id)?;
            self.conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1;", own.table),
                [id.to_string()],
            )?;
            Ok(())
        })
        .map_err(Self::fail("delete"))
    }

    fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<E>> {
        ensure_names::<E>(names)?;
        let lookup = || -> rusqlite::Result<Vec<E>> {
            let heads = self
                .heads_by_names(names)?
                .into_iter()
                .map(|item| (item.id, item.name))
                .collect();
            self.hydrate(heads)
        };
        lookup().map_err(Self::fail("get_by_names"))
    }

    fn get_refs_by_names(&self, names: &[String]) -> StoreResult<Vec<EntityRef>> {
        ensure_names::<E>(names)?;
        self.heads_by_names(names)
            .map_err(Self::fail("get_refs_by_names"))
    }

    fn get_counterparts_of(
        &self,
        id: Uuid,
    ) -> StoreResult<Vec<<E as LinkedEntity>::Counterpart>> {
        validate_id(E::KIND, id)?;
        let counterparts = SqliteEntityStore::<E::Counterpart>::new(self.conn);
        let lookup = || -> rusqlite::Result<Vec<E::Counterpart>> {
            let heads = load_refs(self.conn, E::KIND, id)?
                .into_iter()
                .map(|item| (item.id, item.name))
                .collect();
            counterparts.hydrate(heads)
        };
        lookup().map_err(Self::fail("get_counterparts"))
    }

    fn count_counterparts(&self, id: Uuid) -> StoreResult<u64> {
        validate_id(E::KIND, id)?;
        let own = side(E::KIND);
        let count: i64 = self
            .conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM {LINK_TABLE} WHERE {} = ?1;",
                    own.link_column
                ),
                [id.to_string()],
                |row| row.get(0),
            )
            .map_err(Self::fail("count_counterparts"))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn ensure_names<E: LinkedEntity>(names: &[String]) -> StoreResult<()> {
    if names.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "{} names must not be empty",
            E::KIND
        )));
    }
    Ok(())
}

/// Validates 1-based paging input and returns the row offset.
pub fn page_offset(page: i64, page_size: i64) -> StoreResult<i64> {
    if page <= 0 || page_size <= 0 {
        return Err(StoreError::InvalidArgument(format!(
            "page and page size must be greater than zero (page={page}, page_size={page_size})"
        )));
    }
    (page - 1).checked_mul(page_size).ok_or_else(|| {
        StoreError::InvalidArgument(format!(
            "page {page} with page size {page_size} is out of range"
        ))
    })
}

/// Runs `write` in a named savepoint, rolling back to it on error.
fn in_savepoint<T>(
    conn: &Connection,
    write: impl FnOnce() -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    conn.execute_batch(&format!("SAVEPOINT {WRITE_SAVEPOINT};"))?;
    match write() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {WRITE_SAVEPOINT};"))?;
            Ok(value)
        }
        Err(err) => {
            // The original failure matters more than a rollback failure.
            let _ = conn.execute_batch(&format!(
                "ROLLBACK TO {WRITE_SAVEPOINT}; RELEASE {WRITE_SAVEPOINT};"
            ));
            Err(err)
        }
    }
}

/// Loads references to the counterparts linked to `id` of kind `kind`.
fn load_refs(conn: &Connection, kind: EntityKind, id: Uuid) -> rusqlite::Result<Vec<EntityRef>> {
    let own = side(kind);
    let other = side(kind.counterpart());
    let mut stmt = conn.prepare(&format!(
        "SELECT c.id, c.name
         FROM {LINK_TABLE} l
         INNER JOIN {} c ON c.id = l.{}
         WHERE l.{} = ?1
         ORDER BY c.created_at ASC, c.id ASC;",
        other.table, other.link_column, own.link_column
    ))?;
    let refs = stmt
        .query_map([id.to_string()], |row| {
            let (id, name) = parse_head(row)?;
            Ok(EntityRef { id, name })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(refs)
}

fn parse_head(row: &Row<'_>) -> rusqlite::Result<(Uuid, String)> {
    let id_text: String = row.get(0)?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
    Ok((id, row.get(1)?))
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(page_offset(1, 10).unwrap(), 0);
        assert_eq!(page_offset(3, 10).unwrap(), 20);
    }

    #[test]
    fn page_offset_rejects_non_positive_input() {
        assert!(page_offset(0, 10).is_err());
        assert!(page_offset(1, 0).is_err());
        assert!(page_offset(-1, -1).is_err());
    }

    #[test]
    fn page_offset_rejects_overflow() {
        assert!(page_offset(i64::MAX, i64::MAX).is_err());
    }
}
