use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::database::store::{Filter, RecordStore, Select};
use crate::database::{activities_repo, activity_members_repo, members_repo};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct ForeignKey {
    table: String,
    column: String,
    references: String,
}

/// In-process store with the same verb semantics as the PostgREST backend.
/// Unique and foreign-key constraints are opt-in, like a real schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    unique: Vec<(String, String)>,
    foreign_keys: Vec<ForeignKey>,
    unreachable: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables as the production schema declares them: unique `nip`, and
    /// assignments referencing both activities and members.
    pub fn with_gym_schema() -> Self {
        Self::new()
            .with_unique(members_repo::MEMBERS_TABLE, "nip")
            .with_foreign_key(
                activity_members_repo::ASSIGNMENTS_TABLE,
                "actividad_id",
                activities_repo::ACTIVITIES_TABLE,
            )
            .with_foreign_key(
                activity_members_repo::ASSIGNMENTS_TABLE,
                "usuario_id",
                members_repo::MEMBERS_TABLE,
            )
    }

    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique.push((table.to_string(), column.to_string()));
        self
    }

    pub fn with_foreign_key(mut self, table: &str, column: &str, references: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            table: table.to_string(),
            column: column.to_string(),
            references: references.to_string(),
        });
        self
    }

    /// Makes every subsequent call fail as if the network were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, AtomicOrdering::SeqCst);
    }

    pub fn read_count(&self) -> u64 {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Inserts a row directly, bypassing constraints. Useful for setting up
    /// data that the application itself would refuse to create.
    pub async fn seed(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unreachable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn check_unique(
        &self,
        table: &str,
        existing: &[Value],
        candidate: &Value,
        skip_index: Option<usize>,
    ) -> Result<(), StoreError> {
        for (_, column) in self.unique.iter().filter(|(t, _)| t == table) {
            let Some(value) = cell(candidate, column) else {
                continue;
            };
            let clash = existing
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip_index)
                .any(|(_, row)| cell(row, column).as_deref() == Some(value.as_str()));
            if clash {
                return Err(StoreError::UniqueViolation(format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    table, column
                )));
            }
        }
        Ok(())
    }

    fn check_foreign_keys(
        &self,
        tables: &HashMap<String, Vec<Value>>,
        table: &str,
        candidate: &Value,
    ) -> Result<(), StoreError> {
        for fk in self.foreign_keys.iter().filter(|fk| fk.table == table) {
            let Some(value) = cell(candidate, &fk.column) else {
                continue;
            };
            let present = tables
                .get(&fk.references)
                .map(|rows| rows.iter().any(|r| cell(r, "id").as_deref() == Some(value.as_str())))
                .unwrap_or(false);
            if !present {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "{}.{} = {} is not present in table \"{}\"",
                    table, fk.column, value, fk.references
                )));
            }
        }
        Ok(())
    }
}

fn cell(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => cell(row, column).as_deref() == Some(value.as_str()),
        Filter::ILike { column, value } => cell(row, column)
            .map(|v| contains_ignore_case(&v, value))
            .unwrap_or(false),
    }
}

// Literal substring match, except `*` stands for any one character, which is
// what the PostgREST backend ends up sending for it.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let haystack: Vec<char> = haystack.to_lowercase().chars().collect();
    let needle: Vec<char> = needle.to_lowercase().chars().collect();
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(&needle)
            .all(|(h, n)| *n == '*' || h == n)
    })
}

// Ascending with NULLs last, like Postgres.
fn compare_rows(a: &Value, b: &Value, order_by: &[String]) -> Ordering {
    for column in order_by {
        let ord = match (cell(a, column), cell(b, column)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Value>, StoreError> {
        self.check_reachable()?;
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);

        let tables = self.tables.lock().await;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !query.order_by.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, &query.order_by));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        self.check_reachable()?;
        if !row.is_object() {
            return Err(StoreError::Rejected {
                status: 400,
                detail: "row must be a JSON object".to_string(),
            });
        }

        let mut tables = self.tables.lock().await;
        let existing = tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        self.check_unique(table, existing, &row, None)?;
        self.check_foreign_keys(&tables, table, &row)?;

        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        changes: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, StoreError> {
        self.check_reachable()?;
        let Value::Object(changes) = changes else {
            return Err(StoreError::Rejected {
                status: 400,
                detail: "changes must be a JSON object".to_string(),
            });
        };

        let mut tables = self.tables.lock().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut staged: Vec<(usize, Value)> = Vec::new();
        for (index, row) in rows.iter().enumerate().filter(|(_, r)| matches(r, filter)) {
            let mut merged: Map<String, Value> = row.as_object().cloned().unwrap_or_default();
            for (k, v) in &changes {
                merged.insert(k.clone(), v.clone());
            }
            let merged = Value::Object(merged);
            self.check_unique(table, rows, &merged, Some(index))?;
            staged.push((index, merged));
        }
        self.check_foreign_keys_all(&tables, table, &staged)?;

        if staged.is_empty() {
            return Ok(Vec::new());
        }
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::with_capacity(staged.len());
        for (index, merged) in staged {
            rows[index] = merged.clone();
            updated.push(merged);
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check_reachable()?;
        let mut tables = self.tables.lock().await;
        self.check_not_referenced(&tables, table, filter)?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, filter));
        let removed = (before - rows.len()) as u64;
        if removed > 0 {
            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        }
        Ok(removed)
    }
}

impl MemoryStore {
    fn check_foreign_keys_all(
        &self,
        tables: &HashMap<String, Vec<Value>>,
        table: &str,
        staged: &[(usize, Value)],
    ) -> Result<(), StoreError> {
        staged
            .iter()
            .try_for_each(|(_, row)| self.check_foreign_keys(tables, table, row))
    }

    // Deleting a row that another table still points at is refused, as
    // Postgres does for a plain (non-cascading) foreign key.
    fn check_not_referenced(
        &self,
        tables: &HashMap<String, Vec<Value>>,
        table: &str,
        filter: &Filter,
    ) -> Result<(), StoreError> {
        let Some(rows) = tables.get(table) else {
            return Ok(());
        };
        for fk in self.foreign_keys.iter().filter(|fk| fk.references == table) {
            let Some(children) = tables.get(&fk.table) else {
                continue;
            };
            let doomed = rows
                .iter()
                .filter(|row| matches(row, filter))
                .filter_map(|row| cell(row, "id"));
            for id in doomed {
                if children
                    .iter()
                    .any(|child| cell(child, &fk.column).as_deref() == Some(id.as_str()))
                {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "{} = {} is still referenced from table \"{}\"",
                        fk.column, id, fk.table
                    )));
                }
            }
        }
        Ok(())
    }
}
