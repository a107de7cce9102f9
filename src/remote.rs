//! Remote persistence API client.
//!
//! The remote store is a plain JSON CRUD API over the entity collections
//! in `RecordKind`, authenticated with a bearer credential attached by
//! this client. Transient failures map to `RemoteError::Unavailable`,
//! which the sync coordinator absorbs; anything else is a real error
//! that propagates.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::config::RemoteConfig;
use crate::models::enums::RecordKind;

#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transient network/storage failure. Recovered locally: reads fall
    /// back to the replica, writes are deferred for reconciliation.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The remote store refused the request. Not retried.
    #[error("remote store rejected request: HTTP {status}")]
    Rejected { status: u16 },

    #[error("invalid remote payload: {0}")]
    InvalidPayload(String),
}

/// The remote authoritative store, seam for test fakes.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Send + Sync {
    async fn fetch_all(&self, kind: &RecordKind) -> Result<Vec<Value>, RemoteError>;
    /// Idempotent write keyed by id: the same record written twice must
    /// not duplicate on the remote side.
    async fn put(&self, kind: &RecordKind, id: &Uuid, payload: &Value)
        -> Result<Value, RemoteError>;
    async fn delete(&self, kind: &RecordKind, id: &Uuid) -> Result<(), RemoteError>;
}

/// HTTP client for the remote store.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn collection_url(&self, kind: &RecordKind) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), kind.as_str())
    }

    fn record_url(&self, kind: &RecordKind, id: &Uuid) -> String {
        format!("{}/{id}", self.collection_url(kind))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn check_status(response: &reqwest::Response) -> Result<(), RemoteError> {
        let status = response.status();
        if status.is_server_error() {
            return Err(RemoteError::Unavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(RemoteError::Rejected { status: status.as_u16() });
        }
        Ok(())
    }
}

/// Connection-level reqwest failures are all transient from the sync
/// coordinator's point of view.
fn transport_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(e.to_string())
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch_all(&self, kind: &RecordKind) -> Result<Vec<Value>, RemoteError> {
        let response = self
            .authorize(self.client.get(self.collection_url(kind)))
            .send()
            .await
            .map_err(transport_error)?;
        Self::check_status(&response)?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| RemoteError::InvalidPayload(e.to_string()))
    }

    async fn put(
        &self,
        kind: &RecordKind,
        id: &Uuid,
        payload: &Value,
    ) -> Result<Value, RemoteError> {
        let response = self
            .authorize(self.client.put(self.record_url(kind, id)).json(payload))
            .send()
            .await
            .map_err(transport_error)?;
        Self::check_status(&response)?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(payload.clone());
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| RemoteError::InvalidPayload(e.to_string()))
    }

    async fn delete(&self, kind: &RecordKind, id: &Uuid) -> Result<(), RemoteError> {
        let response = self
            .authorize(self.client.delete(self.record_url(kind, id)))
            .send()
            .await
            .map_err(transport_error)?;
        // A record already gone remotely counts as a confirmed delete.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(&response)
    }
}
