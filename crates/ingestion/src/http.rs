//! HTTP sensor source - `GET <base>/metrics`

use reqwest::Client;
use tracing::{instrument, trace};

use contracts::{ContractError, RawReading, SensorEndpointConfig, SensorSource};
use observability::metrics as obs;

use crate::error::{IngestionError, Result};

/// Reading endpoint suffix
pub const METRICS_PATH: &str = "/metrics";
/// Health endpoint suffix
pub const HEALTH_PATH: &str = "/health";

/// Upstream sensor reader
///
/// One request per call, no retries. The underlying client is cheap to
/// clone and shared by every broadcaster.
#[derive(Debug, Clone)]
pub struct HttpSensorSource {
    client: Client,
    base_url: String,
}

impl HttpSensorSource {
    pub fn new(config: &SensorEndpointConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(IngestionError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: "expected http:// or https://".to_string(),
            });
        }

        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an upstream path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fetch any upstream path as opaque JSON
    #[instrument(name = "sensor_fetch_json", skip(self), fields(base = %self.base_url))]
    pub async fn fetch_json(&self, path: &str) -> std::result::Result<serde_json::Value, ContractError> {
        let url = self.url(path);
        let body = self.get_bytes(&url).await?;
        serde_json::from_slice(&body).map_err(|e| ContractError::decode(&url, e.to_string()))
    }

    async fn get_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, ContractError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContractError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::fetch(url, format!("status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ContractError::fetch(url, e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn fetch_reading(&self) -> std::result::Result<RawReading, ContractError> {
        let url = self.url(METRICS_PATH);
        let body = self.get_bytes(&url).await?;
        let reading: RawReading =
            serde_json::from_slice(&body).map_err(|e| ContractError::decode(&url, e.to_string()))?;
        trace!(ts = ?reading.ts, brightness = reading.brightness, "Reading fetched");
        Ok(reading)
    }
}

impl SensorSource for HttpSensorSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> std::result::Result<RawReading, ContractError> {
        let result = self.fetch_reading().await;
        match &result {
            Ok(_) => obs::record_sensor_fetch("ok"),
            Err(e) => obs::record_sensor_fetch(e.kind()),
        }
        result
    }
}
