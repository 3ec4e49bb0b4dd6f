pub mod fixtures;

use std::fmt;

use anyhow::Context;
use chrono::{DateTime, Utc};
use production_db::{AppUser, ProductionStore, PRODUCTION_INDEXES};
use production_kernel::settings::SeedSettings;

/// What a successful seed run created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub database: String,
    pub user: String,
    pub indexes: Vec<String>,
    pub inserted: u64,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database '{}' initialized with sample data.", self.database)?;
        writeln!(f, "User: {}", self.user)?;
        writeln!(f, "Indexes: {}", self.indexes.join(", "))?;
        write!(f, "Records inserted: {}", self.inserted)
    }
}

/// Credential for the seeded database, taken from configuration.
pub fn app_user(settings: &SeedSettings, database: &str) -> AppUser {
    AppUser {
        name: settings.app_user.clone(),
        password: settings.app_password.clone(),
        role: settings.app_role.clone(),
        database: database.to_string(),
    }
}

/// Provision the application user, indexes and sample records.
///
/// Not idempotent: a second run stops at the user that already exists.
#[tracing::instrument(skip_all, fields(database = %store.database_name()))]
pub async fn run<S>(
    store: &S,
    settings: &SeedSettings,
    now: DateTime<Utc>,
) -> anyhow::Result<SeedSummary>
where
    S: ProductionStore + ?Sized,
{
    let database = store.database_name().to_string();
    let user = app_user(settings, &database);

    store
        .create_user(&user)
        .await
        .with_context(|| format!("failed to create application user '{}'", user.name))?;
    tracing::info!(user = %user.name, role = %user.role, "application user created");

    let mut indexes = Vec::with_capacity(PRODUCTION_INDEXES.len());
    for index in PRODUCTION_INDEXES {
        let name = store
            .create_index(index)
            .await
            .with_context(|| format!("failed to create index on '{}'", index.field))?;
        tracing::info!(index = %name, unique = index.unique, "index ready");
        indexes.push(name);
    }

    let records = fixtures::sample_records(now);
    let inserted = store
        .insert_many(&records)
        .await
        .with_context(|| "failed to insert sample production records")?;
    tracing::info!(inserted, "sample records inserted");

    Ok(SeedSummary {
        database,
        user: user.name,
        indexes,
        inserted,
    })
}
