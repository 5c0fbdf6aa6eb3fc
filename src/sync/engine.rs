use crate::clients::DataServiceClient;
use crate::config::Config;
use crate::models::{RawRecord, Result, SyncError};
use crate::query;
use crate::storage::{MongoRecordStore, SyncWriter};
use crate::transform;

/// Sequences one sync run: build filter, fetch, transform, then the idempotent
/// write phase. Strictly linear; the first failing stage aborts everything
/// after it, and a failed run is restarted from the beginning (safe because
/// writes are idempotent).
pub struct SyncEngine {
    config: Config,
}

impl SyncEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<u64> {
        let client = DataServiceClient::dial(&self.config.source)?;
        tracing::info!(app_url = %self.config.source.app_url, "connected to source");

        let match_stage =
            query::build_match_stage(&self.config.source.part_id, self.config.sync_back_n_days)?;
        tracing::info!(
            part_id = %self.config.source.part_id,
            sync_back_n_days = self.config.sync_back_n_days,
            "built sync window filter"
        );

        let raw_data = client.tabular_data_by_mql(vec![match_stage]).await?;
        ensure_non_empty(&raw_data)?;
        tracing::info!(documents = raw_data.len(), "fetched source documents");

        let records = transform::transform_all(&raw_data, &self.config.destination)?;
        tracing::info!(records = records.len(), "transformed records");

        // Destination connection is scoped to the write phase; dropped when
        // the run ends either way.
        let store = MongoRecordStore::connect(&self.config.destination.mongodb_url).await?;
        let writer = SyncWriter::new(store);
        writer.ensure_index().await?;
        let num_inserted = writer.write_all(&records).await?;

        tracing::info!(newly_inserted = num_inserted, "sync complete");
        Ok(num_inserted)
    }
}

/// Zero documents means there is nothing meaningful to sync; the run aborts
/// before any index or write work is attempted.
pub fn ensure_non_empty(raw_data: &[RawRecord]) -> Result<()> {
    if raw_data.is_empty() {
        return Err(SyncError::NoData);
    }
    Ok(())
}
