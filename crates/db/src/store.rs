//! The storage seam the admin routines run against.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::index::IndexSpec;
use crate::record::{OrderKey, ProductionRecord, ProductionStatus};

/// Application credential provisioned on the target database.
#[derive(Clone, PartialEq, Eq)]
pub struct AppUser {
    pub name: String,
    pub password: String,
    pub role: String,
    pub database: String,
}

impl fmt::Debug for AppUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUser")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("database", &self.database)
            .finish()
    }
}

/// Result of a single-record update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Operations the admin routines issue against the productions collection.
#[async_trait]
pub trait ProductionStore: Send + Sync {
    /// Name of the database this store is bound to.
    fn database_name(&self) -> &str;

    /// Create a user with a single role on `user.database`.
    async fn create_user(&self, user: &AppUser) -> Result<()>;

    /// Create an index and return its server-side name.
    ///
    /// Re-creating an identical index is a no-op; a different definition
    /// under the same name is an `IndexConflict`.
    async fn create_index(&self, index: &IndexSpec) -> Result<String>;

    /// Ordered insert; stops at the first failing record.
    async fn insert_many(&self, records: &[ProductionRecord]) -> Result<u64>;

    /// Set `status` and `updatedAt` on the first record matching `key`,
    /// plus `completedAt` when one is given.
    async fn update_status(
        &self,
        key: &OrderKey,
        status: ProductionStatus,
        updated_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<UpdateOutcome>;

    async fn find_by_order(&self, key: &OrderKey) -> Result<Option<ProductionRecord>>;

    async fn count_by_status(&self, status: ProductionStatus) -> Result<u64>;
}
