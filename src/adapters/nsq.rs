//! NSQ daemon and registry HTTP endpoints.
//!
//! nsqd        GET /info, GET /stats?format=json
//! nsqlookupd  GET /nodes, GET /topics
//!
//! Releases before 1.0 wrap every body as
//! { "status_code": 200, "status_txt": "OK", "data": { ... } }.

use crate::adapters::http::{HttpFetcher, join};
use crate::adapters::{NsqLookupdApi, NsqdApi};
use crate::config::NsqConfig;
use crate::error::Result;

use reqwest::Url;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct NsqdHttp {
    fetcher: HttpFetcher,
    info_url: Url,
    stats_url: Url,
}

impl NsqdHttp {
    pub fn new(config: &NsqConfig) -> Result<Self> {
        let base = config.nsqd_url()?;
        Ok(Self {
            fetcher: HttpFetcher::new(config.timeout())?,
            info_url: join(&base, "/info")?,
            stats_url: join(&base, "/stats?format=json")?,
        })
    }
}

impl NsqdApi for NsqdHttp {
    fn info(&self) -> Result<Value> {
        self.fetcher.get_json(&self.info_url).map(unwrap_envelope)
    }

    fn stats(&self) -> Result<Value> {
        self.fetcher.get_json(&self.stats_url).map(unwrap_envelope)
    }
}

#[derive(Debug, Clone)]
pub struct NsqLookupdHttp {
    fetcher: HttpFetcher,
    nodes_url: Url,
    topics_url: Url,
}

impl NsqLookupdHttp {
    pub fn new(config: &NsqConfig) -> Result<Self> {
        let base = config.nsqlookupd_url()?;
        Ok(Self {
            fetcher: HttpFetcher::new(config.timeout())?,
            nodes_url: join(&base, "/nodes")?,
            topics_url: join(&base, "/topics")?,
        })
    }
}

impl NsqLookupdApi for NsqLookupdHttp {
    fn nodes(&self) -> Result<Value> {
        self.fetcher.get_json(&self.nodes_url).map(unwrap_envelope)
    }

    fn topics(&self) -> Result<Value> {
        self.fetcher.get_json(&self.topics_url).map(unwrap_envelope)
    }
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("status_code") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
