//! Administrative routines for the productions collection.
//!
//! `modules::seed` provisions a fresh database; `modules::status_update`
//! flips one record's status and reports per-status counts. Both run against
//! any `production_db::ProductionStore`.

pub mod modules;

pub use modules::*;
