use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client as MongoClient, Collection, IndexModel};

use crate::models::{Result, SyncError, TabularRecord};

pub const QUERYABLE_TABULAR_DATABASE_NAME: &str = "sensorData";
pub const QUERYABLE_TABULAR_COLLECTION_NAME: &str = "readings";

/// Field used as the natural dedup key across runs.
pub const TIME_RECEIVED_FIELD: &str = "time_received";

const TIME_RECEIVED_INDEX_NAME: &str = "sync-data-time-received-index";

/// The three destination-store operations the writer needs. Mongo-backed in
/// production; an in-memory double stands in for it in tests.
#[async_trait]
pub trait RecordStore {
    /// Idempotent: creating an index that already exists with the same spec is
    /// a server-side no-op. Fails only on genuine connectivity or permission
    /// problems.
    async fn ensure_time_received_index(&self) -> Result<()>;

    async fn find_by_time_received(&self, value: &Bson) -> Result<Option<Document>>;

    async fn insert(&self, record: TabularRecord) -> Result<()>;
}

pub struct MongoRecordStore {
    collection: Collection<Document>,
}

impl MongoRecordStore {
    /// Open the destination connection for this run. The client is dropped
    /// with the store when the run ends, success or failure.
    pub async fn connect(mongodb_url: &str) -> Result<Self> {
        let client = MongoClient::with_uri_str(mongodb_url)
            .await
            .map_err(|e| SyncError::Connection(format!("failed to connect to local mongo: {}", e)))?;
        let collection = client
            .database(QUERYABLE_TABULAR_DATABASE_NAME)
            .collection::<Document>(QUERYABLE_TABULAR_COLLECTION_NAME);
        Ok(Self { collection })
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn ensure_time_received_index(&self) -> Result<()> {
        // Without this index the per-record existence check degrades linearly
        // as the collection grows.
        let model = IndexModel::builder()
            .keys(doc! { TIME_RECEIVED_FIELD: 1 })
            .options(IndexOptions::builder().name(TIME_RECEIVED_INDEX_NAME.to_string()).build())
            .build();
        self.collection
            .create_index(model, None)
            .await
            .map_err(|e| SyncError::Index(format!("failed to create index: {}", e)))?;
        Ok(())
    }

    async fn find_by_time_received(&self, value: &Bson) -> Result<Option<Document>> {
        self.collection
            .find_one(doc! { TIME_RECEIVED_FIELD: value.clone() }, None)
            .await
            .map_err(|e| SyncError::Write(format!("failed to find matching record: {}", e)))
    }

    async fn insert(&self, record: TabularRecord) -> Result<()> {
        self.collection
            .insert_one(record, None)
            .await
            .map_err(|e| SyncError::Write(format!("failed to insert data: {}", e)))?;
        Ok(())
    }
}

/// Idempotent destination writer: existence-check-then-insert keyed on
/// `time_received`. Re-running over an overlapping look-back window is safe
/// and convergent; only the gap is filled in. The check/insert pair is not
/// atomic, so a single writer per destination collection is assumed.
pub struct SyncWriter<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> SyncWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn ensure_index(&self) -> Result<()> {
        tracing::info!(index = TIME_RECEIVED_INDEX_NAME, "ensuring destination index");
        self.store.ensure_time_received_index().await?;
        tracing::info!("index created");
        Ok(())
    }

    /// Write every record in input order, skipping those whose dedup key is
    /// already present. Returns the number of newly inserted documents. Any
    /// lookup or insert error fails the run immediately.
    pub async fn write_all(&self, records: &[TabularRecord]) -> Result<u64> {
        let total = records.len();
        let mut num_inserted: u64 = 0;

        for (i, record) in records.iter().enumerate() {
            // A missing dedup field dedups against Null, which only matches a
            // stored document that itself carries a null/absent value.
            let key = record.get(TIME_RECEIVED_FIELD).cloned().unwrap_or(Bson::Null);
            let existing = self.store.find_by_time_received(&key).await?;

            if existing.is_none() {
                self.store.insert(record.clone()).await?;
                num_inserted += 1;
            }

            if i % 100 == 0 || i + 1 == total {
                tracing::info!(
                    progress = format!("{}/{}", i + 1, total),
                    newly_inserted = num_inserted,
                    "upload progress"
                );
            }
        }

        Ok(num_inserted)
    }
}
