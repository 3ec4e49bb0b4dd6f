//! In-memory `ProductionStore` used by tests and dry runs.
//!
//! Mirrors the server behaviour the routines rely on: unique indexes reject
//! duplicates, inserts are ordered, and user names are unique per database.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::index::IndexSpec;
use crate::record::{OrderKey, ProductionRecord, ProductionStatus};
use crate::store::{AppUser, ProductionStore, UpdateOutcome};

#[derive(Debug, Default)]
struct State {
    users: HashSet<String>,
    indexes: Vec<IndexSpec>,
    records: Vec<ProductionRecord>,
}

#[derive(Debug)]
pub struct InMemoryStore {
    database: String,
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Names of the indexes created so far, in creation order.
    pub fn index_names(&self) -> Vec<String> {
        self.lock().indexes.iter().map(IndexSpec::name).collect()
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> Vec<ProductionRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Comparable value of an indexed field; `None` for fields the store does
/// not know how to index.
fn field_value(record: &ProductionRecord, field: &str) -> Option<String> {
    match field {
        "orderId" => Some(record.order_id.to_string()),
        "status" => Some(record.status.code().to_string()),
        "startedAt" => Some(record.started_at.to_rfc3339()),
        _ => None,
    }
}

fn check_unique(
    indexes: &[IndexSpec],
    existing: &[ProductionRecord],
    candidate: &ProductionRecord,
) -> Result<()> {
    for index in indexes.iter().filter(|index| index.unique) {
        let Some(value) = field_value(candidate, index.field) else {
            continue;
        };
        let clash = existing
            .iter()
            .any(|record| field_value(record, index.field).as_deref() == Some(value.as_str()));
        if clash {
            return Err(StoreError::duplicate_key(format!(
                "index {} dup key: {{ {}: {} }}",
                index.name(),
                index.field,
                value
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ProductionStore for InMemoryStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn create_user(&self, user: &AppUser) -> Result<()> {
        let mut state = self.lock();
        if !state.users.insert(user.name.clone()) {
            return Err(StoreError::DuplicateUser {
                user: user.name.clone(),
                database: user.database.clone(),
            });
        }
        Ok(())
    }

    async fn create_index(&self, index: &IndexSpec) -> Result<String> {
        let mut state = self.lock();

        if let Some(existing) = state.indexes.iter().find(|i| i.field == index.field) {
            if existing == index {
                return Ok(index.name());
            }
            return Err(StoreError::IndexConflict { name: index.name() });
        }

        if index.unique {
            let mut seen: Vec<ProductionRecord> = Vec::with_capacity(state.records.len());
            for record in &state.records {
                check_unique(std::slice::from_ref(index), &seen, record)?;
                seen.push(record.clone());
            }
        }

        state.indexes.push(*index);
        Ok(index.name())
    }

    async fn insert_many(&self, records: &[ProductionRecord]) -> Result<u64> {
        let mut state = self.lock();
        let mut inserted = 0;

        for record in records {
            check_unique(&state.indexes, &state.records, record)?;
            state.records.push(record.clone());
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn update_status(
        &self,
        key: &OrderKey,
        status: ProductionStatus,
        updated_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<UpdateOutcome> {
        let mut state = self.lock();
        let Some(record) = state.records.iter_mut().find(|r| key.matches(r.order_id)) else {
            return Ok(UpdateOutcome::default());
        };

        let mut modified = record.status != status || record.updated_at != updated_at;
        record.status = status;
        record.updated_at = updated_at;
        if let Some(completed_at) = completed_at {
            modified |= record.completed_at != Some(completed_at);
            record.completed_at = Some(completed_at);
        }

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn find_by_order(&self, key: &OrderKey) -> Result<Option<ProductionRecord>> {
        Ok(self
            .lock()
            .records
            .iter()
            .find(|record| key.matches(record.order_id))
            .cloned())
    }

    async fn count_by_status(&self, status: ProductionStatus) -> Result<u64> {
        let count = self
            .lock()
            .records
            .iter()
            .filter(|record| record.status == status)
            .count();
        Ok(count as u64)
    }
}
