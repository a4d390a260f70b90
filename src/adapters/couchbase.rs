//! Couchbase REST endpoints.
//!
//! cluster   GET /pools/default/
//! buckets   GET /pools/default/buckets/
//! bucket    GET /pools/default/buckets/<name>/
//! stats     GET /pools/default/buckets/<name>/stats?zoom=minute

use crate::adapters::CouchbaseApi;
use crate::adapters::http::{HttpFetcher, join};
use crate::config::CouchbaseConfig;
use crate::error::{ProbeError, Result};

use reqwest::Url;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CouchbaseHttp {
    fetcher: HttpFetcher,
    cluster_url: Url,
    buckets_url: Url,
}

impl CouchbaseHttp {
    pub fn new(config: &CouchbaseConfig) -> Result<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(config.timeout)?,
            cluster_url: join(&config.api_endpoint, "/pools/default/")?,
            buckets_url: join(&config.api_endpoint, "/pools/default/buckets/")?,
        })
    }

    fn bucket_url(&self, name: &str) -> Result<Url> {
        let mut url = self.buckets_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProbeError::Fetch {
                url: self.buckets_url.to_string(),
                reason: "endpoint cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(name)
            .push("");
        Ok(url)
    }

    fn bucket_stats_url(&self, name: &str) -> Result<Url> {
        join(&self.bucket_url(name)?, "stats?zoom=minute")
    }
}

impl CouchbaseApi for CouchbaseHttp {
    fn cluster(&self) -> Result<Value> {
        self.fetcher.get_json(&self.cluster_url)
    }

    fn buckets(&self) -> Result<Value> {
        self.fetcher.get_json(&self.buckets_url)
    }

    fn bucket(&self, name: &str) -> Result<Value> {
        self.fetcher.get_json(&self.bucket_url(name)?)
    }

    fn bucket_stats(&self, name: &str) -> Result<Value> {
        self.fetcher.get_json(&self.bucket_stats_url(name)?)
    }
}
