//! Persistence for production records: record model, index definitions and
//! the `ProductionStore` seam with MongoDB and in-memory backends.

pub mod error;
pub mod index;
pub mod memory;
pub mod mongo;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use index::{IndexSpec, PRODUCTION_INDEXES};
pub use memory::InMemoryStore;
pub use mongo::{connect, MongoStore};
pub use record::{OrderKey, ParseStatusError, ProductionRecord, ProductionStatus};
pub use store::{AppUser, ProductionStore, UpdateOutcome};
