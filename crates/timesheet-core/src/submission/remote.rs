//! Optional upload of a submitted week to the central server.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::export::ExportRow;
use crate::error::{ConfigError, SubmitError};
use crate::storage::Config;

/// Posts export rows as a JSON array to a fixed endpoint.
pub struct RemoteSubmitter {
    client: Client,
    url: Url,
}

impl RemoteSubmitter {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, SubmitError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// The configured submitter, or `None` when remote submission is off.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ConfigError> {
        if !config.remote.enabled {
            return Ok(None);
        }
        let url = config.remote_url()?;
        let timeout = Duration::from_secs(config.remote.timeout_secs);
        Self::new(url, timeout)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: "remote.url".to_string(),
                message: e.to_string(),
            })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Any 2xx answer counts as accepted.
    pub async fn submit(&self, rows: &[ExportRow]) -> Result<(), SubmitError> {
        debug!(url = %self.url, rows = rows.len(), "posting submission");
        let resp = self.client.post(self.url.clone()).json(rows).send().await?;

        let status = resp.status();
        if status.is_success() {
            info!(url = %self.url, status = status.as_u16(), "submission accepted");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(SubmitError::Remote {
                status: status.as_u16(),
                body,
            })
        }
    }
}
