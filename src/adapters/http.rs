use crate::error::{ProbeError, Result};

use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// Blocking JSON GET with a bounded timeout, shared by every adapter.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn get_json(&self, url: &Url) -> Result<Value> {
        tracing::debug!(url = %url, "fetching");
        let fail = |e: reqwest::Error| ProbeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(fail)?
            .error_for_status()
            .map_err(fail)?;
        response.json::<Value>().map_err(fail)
    }
}

/// Join a relative reference onto a base URL.
pub(crate) fn join(base: &Url, reference: &str) -> Result<Url> {
    base.join(reference).map_err(|e| ProbeError::Fetch {
        url: format!("{base}{reference}"),
        reason: format!("cannot build URL: {e}"),
    })
}
