//! In-memory store implementations for tests.
//!
//! `MemoryRelationalStore` enforces the same primary-key, unique and
//! foreign-key constraints that the MySQL DDL in `seed-mysql` declares, so
//! tests exercise the same failure modes as the live database.

use crate::error::{Result, SeedError};
use crate::schema::EntityKind;
use crate::store::{
    CountQuery, DocumentFilter, DocumentRecord, DocumentStore, RelationalRow, RelationalStore,
    Statement,
};
use crate::value::FieldValue;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct DocumentState {
    collections: BTreeMap<String, Vec<DocumentRecord>>,
    counters: BTreeMap<String, i64>,
    unavailable: bool,
}

/// Document store kept in process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocumentState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> Result<MutexGuard<'_, DocumentState>> {
        let state = self.state();
        if state.unavailable {
            return Err(SeedError::StorageUnavailable(
                "memory document store is offline".to_string(),
            ));
        }
        Ok(state)
    }

    /// Make every subsequent call fail with `StorageUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Snapshot of a collection in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<DocumentRecord> {
        self.state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn counter(&self, name: &str) -> Option<i64> {
        self.state().counters.get(name).copied()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, document: DocumentRecord) -> Result<()> {
        let mut state = self.available()?;
        let docs = state.collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.id == document.id) {
            return Err(SeedError::constraint(
                collection,
                format!("duplicate key _id {}", document.id),
            ));
        }
        docs.push(document);
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: &DocumentFilter) -> Result<u64> {
        let mut state = self.available()?;
        let Some(docs) = state.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    async fn find_and_increment_counter(&self, name: &str) -> Result<i64> {
        let mut state = self.available()?;
        let value = state.counters.entry(name.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn upsert_counter(&self, name: &str, value: i64) -> Result<()> {
        let mut state = self.available()?;
        state.counters.insert(name.to_string(), value);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<DocumentRecord>> {
        let state = self.available()?;
        Ok(state
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }
}

type Tables = BTreeMap<EntityKind, BTreeMap<i64, RelationalRow>>;

#[derive(Default)]
struct RelationalState {
    /// What this session sees, including uncommitted writes.
    working: Tables,
    /// What other sessions would see.
    committed: Tables,
    commits: u64,
    unavailable: bool,
}

/// Relational store kept in process memory, with a single session.
#[derive(Default)]
pub struct MemoryRelationalStore {
    state: Mutex<RelationalState>,
}

impl MemoryRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RelationalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> Result<MutexGuard<'_, RelationalState>> {
        let state = self.state();
        if state.unavailable {
            return Err(SeedError::StorageUnavailable(
                "memory relational store is offline".to_string(),
            ));
        }
        Ok(state)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Committed rows of a table, ordered by ID.
    pub fn rows(&self, table: EntityKind) -> Vec<RelationalRow> {
        self.state()
            .committed
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn commit_count(&self) -> u64 {
        self.state().commits
    }

    /// Remove a committed row behind the coordinator's back.
    pub fn remove_row(&self, table: EntityKind, id: i64) {
        let mut guard = self.state();
        let state = &mut *guard;
        for tables in [&mut state.working, &mut state.committed] {
            if let Some(rows) = tables.get_mut(&table) {
                rows.remove(&id);
            }
        }
    }
}

fn insert_row(
    tables: &mut Tables,
    table: EntityKind,
    columns: &[&'static str],
    values: &[FieldValue],
) -> Result<()> {
    if columns.len() != values.len() || columns.first() != Some(&table.id_column()) {
        return Err(SeedError::StorageUnavailable(format!(
            "malformed insert into {table}"
        )));
    }
    let id = values[0].as_i64().ok_or_else(|| {
        SeedError::StorageUnavailable(format!("non-integer key for {table}"))
    })?;

    let row = RelationalRow {
        id,
        values: columns[1..]
            .iter()
            .map(|c| c.to_string())
            .zip(values[1..].iter().cloned())
            .collect(),
    };

    let existing = tables.get(&table);
    if existing.is_some_and(|rows| rows.contains_key(&id)) {
        return Err(SeedError::constraint(
            table.name(),
            format!("duplicate entry '{id}' for key 'PRIMARY'"),
        ));
    }

    for (name, value) in &row.values {
        let Some(column) = table.column(name) else {
            return Err(SeedError::StorageUnavailable(format!(
                "unknown column '{name}' in {table}"
            )));
        };
        if column.unique {
            let taken = existing.is_some_and(|rows| {
                rows.values()
                    .any(|r| r.values.iter().any(|(n, v)| n == name && v == value))
            });
            if taken {
                return Err(SeedError::constraint(
                    table.name(),
                    format!("duplicate entry {value} for key '{name}'"),
                ));
            }
        }
        if let (Some(parent), Some(parent_id)) = (column.references, value.as_i64()) {
            let found = tables
                .get(&parent)
                .is_some_and(|rows| rows.contains_key(&parent_id));
            if !found {
                return Err(SeedError::constraint(
                    table.name(),
                    format!("{name} {parent_id} references missing {parent} row"),
                ));
            }
        }
    }

    tables.entry(table).or_default().insert(id, row);
    Ok(())
}

fn delete_all(tables: &mut Tables, table: EntityKind) -> Result<u64> {
    let Some(ids) = tables.get(&table).filter(|rows| !rows.is_empty()) else {
        return Ok(0);
    };

    for child in EntityKind::ALL {
        for column in child.columns().iter().filter(|c| c.references == Some(table)) {
            let referenced = tables.get(&child).is_some_and(|rows| {
                rows.values().any(|r| {
                    r.values.iter().any(|(n, v)| {
                        n == column.name && v.as_i64().is_some_and(|id| ids.contains_key(&id))
                    })
                })
            });
            if referenced {
                return Err(SeedError::constraint(
                    table.name(),
                    format!("cannot delete: rows referenced by {child}.{}", column.name),
                ));
            }
        }
    }

    let removed = tables.remove(&table).map(|rows| rows.len()).unwrap_or(0);
    Ok(removed as u64)
}

#[async_trait]
impl RelationalStore for MemoryRelationalStore {
    async fn execute(&self, statement: &Statement) -> Result<u64> {
        let mut state = self.available()?;
        match statement {
            Statement::Insert {
                table,
                columns,
                values,
            } => {
                insert_row(&mut state.working, *table, columns, values)?;
                Ok(1)
            }
            Statement::DeleteAll { table } => delete_all(&mut state.working, *table),
        }
    }

    async fn fetch_count(&self, query: &CountQuery) -> Result<u64> {
        let state = self.available()?;
        let count = state
            .working
            .get(&query.table)
            .map(|rows| {
                rows.values()
                    .filter(|r| {
                        if query.column == query.table.id_column() {
                            return query.value.as_i64() == Some(r.id);
                        }
                        r.values
                            .iter()
                            .any(|(n, v)| n == query.column && *v == query.value)
                    })
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn commit(&self) -> Result<()> {
        let mut state = self.available()?;
        state.committed = state.working.clone();
        state.commits += 1;
        Ok(())
    }

    async fn fetch_rows(&self, table: EntityKind) -> Result<Vec<RelationalRow>> {
        let state = self.available()?;
        Ok(state
            .working
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}
