//! Read-only query surfaces of the monitored backends.
//!
//! The router only talks to these traits; the HTTP implementations live next
//! to them and tests substitute in-memory fakes.

pub mod couchbase;
pub mod http;
pub mod nsq;

use crate::error::Result;
use serde_json::Value;

pub use couchbase::CouchbaseHttp;
pub use nsq::{NsqLookupdHttp, NsqdHttp};

pub trait CouchbaseApi {
    /// `/pools/default/`: cluster-wide fields plus the `nodes` list.
    fn cluster(&self) -> Result<Value>;
    /// `/pools/default/buckets/`: a list of bucket objects with `name`.
    fn buckets(&self) -> Result<Value>;
    fn bucket(&self, name: &str) -> Result<Value>;
    fn bucket_stats(&self, name: &str) -> Result<Value>;
}

pub trait NsqdApi {
    /// `/info`: `start_time`, `version`, ...
    fn info(&self) -> Result<Value>;
    /// `/stats`: `health` and the `topics` summaries.
    fn stats(&self) -> Result<Value>;
}

pub trait NsqLookupdApi {
    /// `/nodes`: registered daemons under `producers`.
    fn nodes(&self) -> Result<Value>;
    /// `/topics`: every topic name in the cluster under `topics`.
    fn topics(&self) -> Result<Value>;
}
