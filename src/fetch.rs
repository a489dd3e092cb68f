//! Retrieval of the raw statistics payload.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::config;
use crate::error::Result;
use crate::models::FetchedPayload;

/// Something that can produce one stats payload per call.
///
/// Implementations must fail closed: any transport, status or shape problem
/// is an error, never a partial payload.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> Result<FetchedPayload>;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> Result<FetchedPayload> + Send + Sync,
{
    fn fetch(&self) -> Result<FetchedPayload> {
        self()
    }
}

/// Blocking HTTP fetcher for the Hive OS stats endpoint.
pub struct HttpFetcher {
    endpoint: String,
    timeout: Duration,
    client: OnceLock<Client>,
}

impl HttpFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            client: OnceLock::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Lazy HTTP client, created on first use.
    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(config::STATS_URL, config::DEFAULT_TIMEOUT)
    }
}

impl SnapshotSource for HttpFetcher {
    /// One GET, no retry. Non-2xx, transport failures and bodies that are not
    /// a `{category: [{name, amount}]}` object are all errors.
    fn fetch(&self) -> Result<FetchedPayload> {
        debug!(url = %self.endpoint, "fetching stats");
        let resp = self.client()?.get(&self.endpoint).send()?.error_for_status()?;
        let body: Value = resp.json()?;
        FetchedPayload::from_body(body)
    }
}
