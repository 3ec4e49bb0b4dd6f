//! MongoDB client factory and `ProductionStore` implementation.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use production_kernel::settings::DatabaseSettings;

use crate::error::{Result, StoreError};
use crate::index::IndexSpec;
use crate::record::{OrderKey, ProductionRecord, ProductionStatus};
use crate::store::{AppUser, ProductionStore, UpdateOutcome};

const DUPLICATE_KEY: i32 = 11000;
const USER_ALREADY_EXISTS: i32 = 51003;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;

/// Connect to the configured deployment and verify it answers a `ping`.
pub async fn connect(settings: &DatabaseSettings) -> Result<MongoStore> {
    tracing::debug!(target: "production-db", database = %settings.name, "connecting to mongodb");

    let client = Client::with_uri_str(&settings.uri).await?;
    let database = client.database(&settings.name);
    database.run_command(doc! { "ping": 1 }).await?;

    tracing::info!(
        target: "production-db",
        database = %settings.name,
        collection = %settings.collection,
        "mongodb connection established"
    );

    Ok(MongoStore::new(client, &settings.name, &settings.collection))
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
    collection: Collection<Document>,
}

impl MongoStore {
    pub fn new(client: Client, database: &str, collection: &str) -> Self {
        let database = client.database(database);
        let collection = database.collection::<Document>(collection);
        Self {
            client,
            database,
            collection,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn key_filter(key: &OrderKey) -> Document {
    match key {
        OrderKey::Int(order_id) => doc! { "orderId": *order_id },
        OrderKey::Text(order_id) => doc! { "orderId": order_id.as_str() },
    }
}

fn status_update(
    status: ProductionStatus,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
) -> Document {
    let mut set = doc! {
        "status": status.code(),
        "updatedAt": bson::DateTime::from_chrono(updated_at),
    };
    if let Some(completed_at) = completed_at {
        set.insert("completedAt", bson::DateTime::from_chrono(completed_at));
    }
    doc! { "$set": set }
}

fn to_document(record: &ProductionRecord) -> Document {
    let mut document = doc! {
        "orderId": record.order_id,
        "productIds": record.product_ids.iter().copied().map(Bson::Int64).collect::<Vec<_>>(),
        "status": record.status.code(),
        "startedAt": bson::DateTime::from_chrono(record.started_at),
    };
    if let Some(completed_at) = record.completed_at {
        document.insert("completedAt", bson::DateTime::from_chrono(completed_at));
    }
    document.insert("createdAt", bson::DateTime::from_chrono(record.created_at));
    document.insert("updatedAt", bson::DateTime::from_chrono(record.updated_at));
    document
}

fn read_i64(value: &Bson, field: &str) -> Result<i64> {
    match value {
        Bson::Int64(v) => Ok(*v),
        Bson::Int32(v) => Ok(i64::from(*v)),
        other => Err(StoreError::malformed(format!(
            "{field} must be an integer, found {other}"
        ))),
    }
}

fn read_datetime(document: &Document, field: &str) -> Result<DateTime<Utc>> {
    document
        .get_datetime(field)
        .map(|value| value.to_chrono())
        .map_err(|err| StoreError::malformed(format!("{field}: {err}")))
}

fn from_document(document: &Document) -> Result<ProductionRecord> {
    let order_id = document
        .get("orderId")
        .ok_or_else(|| StoreError::malformed("missing orderId"))
        .and_then(|value| read_i64(value, "orderId"))?;

    let product_ids = document
        .get_array("productIds")
        .map_err(|err| StoreError::malformed(format!("productIds: {err}")))?
        .iter()
        .map(|value| read_i64(value, "productIds"))
        .collect::<Result<Vec<_>>>()?;

    let status = document
        .get_str("status")
        .map_err(|err| StoreError::malformed(format!("status: {err}")))?
        .parse::<ProductionStatus>()
        .map_err(|err| StoreError::malformed(err.to_string()))?;

    let completed_at = match document.get("completedAt") {
        None | Some(Bson::Null) => None,
        Some(_) => Some(read_datetime(document, "completedAt")?),
    };

    Ok(ProductionRecord {
        order_id,
        product_ids,
        status,
        started_at: read_datetime(document, "startedAt")?,
        completed_at,
        created_at: read_datetime(document, "createdAt")?,
        updated_at: read_datetime(document, "updatedAt")?,
    })
}

/// Map server error codes onto the store's error vocabulary.
fn classify(err: mongodb::error::Error) -> StoreError {
    let duplicate_message = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            Some(write.message.clone())
        }
        ErrorKind::InsertMany(insert) => insert
            .write_errors
            .as_ref()
            .and_then(|errors| errors.iter().find(|e| e.code == DUPLICATE_KEY))
            .map(|e| e.message.clone()),
        ErrorKind::Command(command) if command.code == DUPLICATE_KEY => {
            Some(command.message.clone())
        }
        _ => None,
    };

    match duplicate_message {
        Some(message) => StoreError::duplicate_key(message),
        None => StoreError::Mongo(err),
    }
}

fn command_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

#[async_trait]
impl ProductionStore for MongoStore {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn create_user(&self, user: &AppUser) -> Result<()> {
        let command = doc! {
            "createUser": user.name.as_str(),
            "pwd": user.password.as_str(),
            "roles": [ { "role": user.role.as_str(), "db": user.database.as_str() } ],
        };

        match self.database.run_command(command).await {
            Ok(_) => Ok(()),
            Err(err) if command_code(&err) == Some(USER_ALREADY_EXISTS) => {
                Err(StoreError::DuplicateUser {
                    user: user.name.clone(),
                    database: user.database.clone(),
                })
            }
            Err(err) => Err(classify(err)),
        }
    }

    async fn create_index(&self, index: &IndexSpec) -> Result<String> {
        let mut keys = Document::new();
        keys.insert(index.field, 1);

        let mut options = IndexOptions::default();
        options.name = Some(index.name());
        if index.unique {
            options.unique = Some(true);
        }

        let model = IndexModel::builder().keys(keys).options(options).build();

        match self.collection.create_index(model).await {
            Ok(created) => Ok(created.index_name),
            Err(err)
                if matches!(
                    command_code(&err),
                    Some(INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT)
                ) =>
            {
                Err(StoreError::IndexConflict { name: index.name() })
            }
            Err(err) => Err(classify(err)),
        }
    }

    async fn insert_many(&self, records: &[ProductionRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let documents: Vec<Document> = records.iter().map(to_document).collect();
        let inserted = self
            .collection
            .insert_many(documents)
            .await
            .map_err(classify)?;

        Ok(inserted.inserted_ids.len() as u64)
    }

    async fn update_status(
        &self,
        key: &OrderKey,
        status: ProductionStatus,
        updated_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<UpdateOutcome> {
        let result = self
            .collection
            .update_one(key_filter(key), status_update(status, updated_at, completed_at))
            .await
            .map_err(classify)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn find_by_order(&self, key: &OrderKey) -> Result<Option<ProductionRecord>> {
        let found = self
            .collection
            .find_one(key_filter(key))
            .await
            .map_err(classify)?;

        found.as_ref().map(from_document).transpose()
    }

    async fn count_by_status(&self, status: ProductionStatus) -> Result<u64> {
        self.collection
            .count_documents(doc! { "status": status.code() })
            .await
            .map_err(classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(completed: bool) -> ProductionRecord {
        let now = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap();
        ProductionRecord {
            order_id: 1003,
            product_ids: vec![504, 505, 506],
            status: ProductionStatus::Done,
            started_at: now - Duration::hours(2),
            completed_at: completed.then(|| now - Duration::minutes(30)),
            created_at: now - Duration::hours(2),
            updated_at: now - Duration::minutes(30),
        }
    }

    #[test]
    fn document_uses_int64_identifiers() {
        let document = to_document(&sample(false));
        assert_eq!(document.get("orderId"), Some(&Bson::Int64(1003)));
        assert_eq!(
            document.get_array("productIds").unwrap()[0],
            Bson::Int64(504)
        );
        assert!(!document.contains_key("completedAt"));
    }

    #[test]
    fn document_converts_back_to_record() {
        let record = sample(true);
        let parsed = from_document(&to_document(&record)).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn unknown_status_is_malformed() {
        let mut document = to_document(&sample(false));
        document.insert("status", "SHIPPED");
        let err = from_document(&document).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn status_update_sets_completed_at_only_when_given() {
        let now = Utc::now();

        let plain = status_update(ProductionStatus::InProgress, now, None);
        let set = plain.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "IN_PROGRESS");
        assert!(!set.contains_key("completedAt"));

        let finishing = status_update(ProductionStatus::Done, now, Some(now));
        let set = finishing.get_document("$set").unwrap();
        assert_eq!(
            set.get_datetime("completedAt").unwrap(),
            &bson::DateTime::from_chrono(now)
        );
    }

    #[test]
    fn text_key_filters_on_string() {
        let filter = key_filter(&OrderKey::Text("2001".to_string()));
        assert_eq!(filter.get("orderId"), Some(&Bson::String("2001".to_string())));
    }
}
