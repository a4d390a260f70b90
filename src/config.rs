//! Per-backend JSON configuration, read once at startup.
//!
//! couchbase.conf:
//! { "api_endpoint": "http://127.0.0.1:8091", "timeout_secs": 10 }
//!
//! nsq.conf (every key optional):
//! {
//!   "nsq_host": "127.0.0.1",
//!   "nsq_nsqd": true,
//!   "nsq_nsqd_http_port": 4151,
//!   "nsq_nsqlookupd": true,
//!   "nsq_nsqlookupd_http_port": 4161,
//!   "timeout_secs": 10
//! }

use crate::error::{ProbeError, Result};

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which config file a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Couchbase,
    Nsq,
}

impl Backend {
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Couchbase => "couchbase.conf",
            Self::Nsq => "nsq.conf",
        }
    }

    /// `<exe dir>/../conf/<file>`, falling back to `../conf/<file>` relative to
    /// the working directory when the executable path is unknown.
    pub fn default_config_path(self) -> PathBuf {
        let conf_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("..").join("conf")))
            .unwrap_or_else(|| Path::new("..").join("conf"));
        conf_dir.join(self.file_name())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawCouchbaseConfig {
    #[serde(default)]
    api_endpoint: Option<String>,

    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CouchbaseConfig {
    pub api_endpoint: Url,
    pub timeout: Duration,
}

impl CouchbaseConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw: RawCouchbaseConfig = read_json(path)?;
        let endpoint = raw
            .api_endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ProbeError::ConfigMissing {
                path: path.to_path_buf(),
                key: "api_endpoint",
            })?;

        Ok(Self {
            api_endpoint: parse_url(path, endpoint.trim())?,
            timeout: Duration::from_secs(raw.timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NsqConfig {
    #[serde(default = "default_nsq_host")]
    pub nsq_host: String,

    #[serde(default = "default_enabled")]
    pub nsq_nsqd: bool,

    #[serde(default = "default_nsqd_port")]
    pub nsq_nsqd_http_port: u16,

    #[serde(default = "default_enabled")]
    pub nsq_nsqlookupd: bool,

    #[serde(default = "default_nsqlookupd_port")]
    pub nsq_nsqlookupd_http_port: u16,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(skip)]
    source: PathBuf,
}

impl NsqConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Self = read_json(path)?;
        config.source = path.to_path_buf();
        Ok(config)
    }

    pub fn nsqd_url(&self) -> Result<Url> {
        if !self.nsq_nsqd {
            return Err(ProbeError::ServiceDisabled("nsqd"));
        }
        self.service_url(self.nsq_nsqd_http_port)
    }

    pub fn nsqlookupd_url(&self) -> Result<Url> {
        if !self.nsq_nsqlookupd {
            return Err(ProbeError::ServiceDisabled("nsqlookupd"));
        }
        self.service_url(self.nsq_nsqlookupd_http_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn service_url(&self, port: u16) -> Result<Url> {
        parse_url(&self.source, &format!("http://{}:{}", self.nsq_host, port))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let invalid = |reason: String| ProbeError::ConfigInvalid {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| invalid(format!("cannot read: {e}")))?;
    serde_json::from_str(&text).map_err(|e| invalid(format!("malformed JSON: {e}")))
}

fn parse_url(path: &Path, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ProbeError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: format!("bad URL {raw:?}: {e}"),
    })
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_nsq_host() -> String {
    "127.0.0.1".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_nsqd_port() -> u16 {
    4151
}

fn default_nsqlookupd_port() -> u16 {
    4161
}
