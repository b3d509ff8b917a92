//! How request bodies reach AnkiConnect.

use crate::error::SyncError;
use serde_json::Value;

/// Sends one JSON request body and returns the raw response body.
///
/// Implementations must not interpret the body or the HTTP status; the sync
/// service parses the envelope and decides what to retry.
pub trait Transport {
    fn post(&self, body: &Value) -> Result<String, SyncError>;
}

/// Blocking HTTP POST to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| SyncError::Transport {
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl Transport for HttpTransport {
    fn post(&self, body: &Value) -> Result<String, SyncError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .map_err(|e| SyncError::Transport {
                detail: e.to_string(),
            })?;

        response.text().map_err(|e| SyncError::Transport {
            detail: format!("failed to read response: {e}"),
        })
    }
}
