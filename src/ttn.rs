//! Module for fetching stored uplinks from a The Things Network storage integration.
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

#[derive(Serialize, Deserialize, Debug, Clone)]
/// Parameters for the connection to the storage API.
pub struct TtnParameters
{
    /// Full url of the `uplink_message` storage endpoint of the device.
    pub url: String,
    /// API key sent as bearer token.
    pub api_key: String,
}

/// Source of raw uplink batches.
#[async_trait]
pub trait UplinkSource: Send + Sync {
    /// Fetch the current batch of stored uplinks as JSON.
    async fn fetch(&self) -> Result<Value>;
}

/// [`UplinkSource`] backed by the storage integration HTTP API.
pub struct TtnStorageClient {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TtnStorageClient {
    pub fn new(params: &TtnParameters) -> Self {
        TtnStorageClient {
            url: params.url.clone(),
            api_key: params.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl UplinkSource for TtnStorageClient {
    async fn fetch(&self) -> Result<Value> {
        let response = self.client
            .get(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                log::error!(target: "uplinkd::ttn", "Could not reach storage API: \'{}\'", err);
                BridgeError::UpstreamFetch { status: None, reason: err.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            log::error!(target: "uplinkd::ttn", "Storage API answered with status \'{}\'", status);
            return Err(BridgeError::UpstreamFetch {
                status: Some(status.as_u16()),
                reason: format!("storage API answered with status {}", status),
            });
        }

        let batch = response.json::<Value>().await.map_err(|err| {
            log::error!(target: "uplinkd::ttn", "Storage API response is not JSON: \'{}\'", err);
            BridgeError::UpstreamFetch { status: None, reason: err.to_string() }
        })?;

        log::debug!(target: "uplinkd::ttn", "Fetched storage batch from \'{}\'", self.url);
        Ok(batch)
    }
}
