use roster_core::db::open_db_in_memory;
use roster_core::{
    EntityRef, EntityStore, ErrorKind, NameReconciler, Project, SqliteEntityStore, StoreResult,
    Student,
};
use std::collections::HashSet;
use uuid::Uuid;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn student_count(conn: &rusqlite::Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM students;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn creates_every_distinct_missing_name_once() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Student>::new(&conn);

    let outcome = NameReconciler::new(&store)
        .reconcile(&names(&["Ann", "Bob", "Ann"]))
        .unwrap();

    assert_eq!(outcome.created, names(&["Ann", "Bob"]));
    let returned: HashSet<&str> = outcome.refs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(returned, HashSet::from(["Ann", "Bob"]));
    assert_eq!(outcome.refs.len(), 2);
    assert_eq!(student_count(&conn), 2);
}

#[test]
fn fully_covered_names_create_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Project>::new(&conn);
    let alpha = store.add(&Project::new("Alpha")).unwrap();

    let outcome = NameReconciler::new(&store)
        .reconcile(&names(&["Alpha"]))
        .unwrap();

    assert!(outcome.created.is_empty());
    assert_eq!(outcome.refs.len(), 1);
    assert_eq!(outcome.refs[0].id, alpha.id);
}

#[test]
fn reconcile_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Student>::new(&conn);
    let reconciler = NameReconciler::new(&store);
    let requested = names(&["Ann", "Bob"]);

    let first = reconciler.reconcile(&requested).unwrap();
    let second = reconciler.reconcile(&requested).unwrap();

    let ids = |items: &[EntityRef]| items.iter().map(|r| r.id).collect::<HashSet<Uuid>>();
    assert_eq!(ids(&first.refs), ids(&second.refs));
    assert!(second.created.is_empty());
    assert_eq!(student_count(&conn), 2);
}

#[test]
fn partially_covered_names_only_create_the_gap() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Student>::new(&conn);
    let ann = store.add(&Student::new("Ann")).unwrap();

    let outcome = NameReconciler::new(&store)
        .reconcile(&names(&["Ann", "Bob"]))
        .unwrap();

    assert_eq!(outcome.created, names(&["Bob"]));
    assert!(outcome.refs.iter().any(|s| s.id == ann.id));
    assert_eq!(student_count(&conn), 2);
}

#[test]
fn matching_is_case_sensitive_and_untrimmed() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Student>::new(&conn);
    store.add(&Student::new("Ann")).unwrap();

    let outcome = NameReconciler::new(&store)
        .reconcile(&names(&["ann", "Ann "]))
        .unwrap();

    assert_eq!(outcome.created, names(&["ann", "Ann "]));
    assert_eq!(student_count(&conn), 3);
}

#[test]
fn empty_name_list_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Student>::new(&conn);

    let err = NameReconciler::new(&store).reconcile(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(student_count(&conn), 0);
}

/// Store whose name lookups miss rows written by a concurrent writer, the
/// view a reconciler has when it races another one.
struct StaleNameLookup<'a> {
    inner: SqliteEntityStore<'a, Student>,
    hidden: HashSet<String>,
}

impl EntityStore for StaleNameLookup<'_> {
    type Entity = Student;

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Student>> {
        self.inner.get_by_id(id)
    }

    fn exists(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.exists(id)
    }

    fn list(&self, page: i64, page_size: i64) -> StoreResult<Vec<Student>> {
        self.inner.list(page, page_size)
    }

    fn add(&self, entity: &Student) -> StoreResult<Student> {
        self.inner.add(entity)
    }

    fn update(&self, entity: &Student) -> StoreResult<()> {
        self.inner.update(entity)
    }

    fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete(id)
    }

    fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<Student>> {
        Ok(self
            .inner
            .get_by_names(names)?
            .into_iter()
            .filter(|student| !self.hidden.contains(&student.name))
            .collect())
    }

    fn get_refs_by_names(&self, names: &[String]) -> StoreResult<Vec<EntityRef>> {
        Ok(self
            .inner
            .get_refs_by_names(names)?
            .into_iter()
            .filter(|item| !self.hidden.contains(&item.name))
            .collect())
    }

    fn get_counterparts_of(&self, id: Uuid) -> StoreResult<Vec<Project>> {
        self.inner.get_counterparts_of(id)
    }

    fn count_counterparts(&self, id: Uuid) -> StoreResult<u64> {
        self.inner.count_counterparts(id)
    }
}

#[test]
fn losing_a_creation_race_surfaces_conflict_without_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let winner = SqliteEntityStore::<Student>::new(&conn);
    NameReconciler::new(&winner)
        .reconcile(&names(&["Zed"]))
        .unwrap();

    let loser = StaleNameLookup {
        inner: SqliteEntityStore::new(&conn),
        hidden: HashSet::from(["Zed".to_string()]),
    };
    let err = NameReconciler::new(&loser)
        .reconcile(&names(&["Zed"]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    let zed_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM students WHERE name = 'Zed';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(zed_rows, 1);
}

#[test]
fn name_lists_beyond_one_lookup_chunk_reconcile_in_full() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::<Student>::new(&conn);
    let existing = store.add(&Student::new("student 0")).unwrap();
    let requested: Vec<String> = (0..1_200).map(|idx| format!("student {idx}")).collect();

    let outcome = NameReconciler::new(&store).reconcile(&requested).unwrap();

    assert_eq!(outcome.refs.len(), 1_200);
    assert_eq!(outcome.created.len(), 1_199);
    assert!(outcome.refs.iter().any(|r| r.id == existing.id));
    assert_eq!(student_count(&conn), 1_200);
}
