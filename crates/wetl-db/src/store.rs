use crate::DbClient;
use anyhow::{Context, Result};
use wetl_core::{DailyRecord, RecordStore, StoreStats};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// [`RecordStore`] backed by the MySQL daily table
#[derive(Clone)]
pub struct DatabaseStore {
    client: DbClient,
    batch_size: usize,
}

impl DatabaseStore {
    pub fn new(client: DbClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    pub fn client(&self) -> &DbClient {
        &self.client
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[async_trait::async_trait]
impl RecordStore for DatabaseStore {
    async fn save(&self, records: &[DailyRecord]) -> Result<usize> {
        self.client
            .save_records(records, self.batch_size)
            .await
            .context("saving records to database")
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.client.stats().await.context("reading database stats")
    }
}
