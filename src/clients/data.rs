use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DataSource;
use crate::models::{RawRecord, Result, SyncError};

const TABULAR_DATA_BY_MQL_PATH: &str = "/viam.app.data.v1.DataService/TabularDataByMQL";
const DEFAULT_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Serialize)]
struct TabularDataByMqlRequest<'a> {
    organization_id: &'a str,
    mql_binary: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TabularDataByMqlResponse {
    #[serde(default)]
    raw_data: Vec<String>,
}

/// Client for the remote tabular data query API. The API-key credential pair
/// is presented as headers on every request of the channel.
#[derive(Clone, Debug)]
pub struct DataServiceClient {
    client: Client,
    base_url: Url,
    organization_id: String,
    api_key_id: String,
    api_key_value: String,
}

impl DataServiceClient {
    pub fn dial(source: &DataSource) -> Result<Self> {
        let base_url = Url::parse(&source.app_url)
            .map_err(|e| SyncError::Connection(format!("invalid app url {}: {}", source.app_url, e)))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .map_err(|e| SyncError::Connection(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            organization_id: source.organization_id.clone(),
            api_key_id: source.api_key_id.clone(),
            api_key_value: source.api_key_value.clone(),
        })
    }

    /// Run one MQL query against the source and return every matching
    /// document as raw BSON bytes. The full result set arrives in a single
    /// response; an empty result is not a fetch error.
    pub async fn tabular_data_by_mql(&self, mql_binary: Vec<Vec<u8>>) -> Result<Vec<RawRecord>> {
        let url = self
            .base_url
            .join(TABULAR_DATA_BY_MQL_PATH)
            .map_err(|e| SyncError::Query(format!("invalid query url: {}", e)))?;

        let body = TabularDataByMqlRequest {
            organization_id: &self.organization_id,
            mql_binary: mql_binary.iter().map(|stage| BASE64.encode(stage)).collect(),
        };

        tracing::debug!(url = %url, stages = body.mql_binary.len(), "querying source data");

        let response = self
            .client
            .post(url)
            .header("key_id", &self.api_key_id)
            .header("key", &self.api_key_value)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::Query(format!(
                "source query failed with status {}: {}",
                status, text
            )));
        }

        let parsed: TabularDataByMqlResponse = response.json().await?;
        parsed
            .raw_data
            .into_iter()
            .map(|encoded| {
                BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| SyncError::Query(format!("undecodable document payload: {}", e)))
            })
            .collect()
    }
}
