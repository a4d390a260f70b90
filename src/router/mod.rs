//! Command routing: turn (object kind, positional args) into a typed request,
//! then run it against the matching adapter.
//!
//! Accepted shapes:
//!   cluster <path> <type>
//!   bucket <name> <path> <type>
//!   node <hostname> <path> <type>
//!   discovery <nodes|buckets>
//!   nsqd <uptime|health|version>
//!   nsqd discovery topics
//!   nsqlookupd <count|names|topics>

pub mod couchbase;
pub mod nsq;

use crate::coerce::TypeTag;
use crate::config::Backend;
use crate::error::{ProbeError, Result};
use crate::tree::{MetricPath, resolve};

use serde_json::Value;

pub use couchbase::run_couchbase;
pub use nsq::{run_lookupd, run_nsqd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Couchbase(CouchbaseRequest),
    Nsqd(NsqdRequest),
    Lookupd(LookupdRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouchbaseRequest {
    Cluster {
        path: MetricPath,
        tag: TypeTag,
    },
    Bucket {
        name: String,
        path: MetricPath,
        tag: TypeTag,
    },
    Node {
        hostname: String,
        path: MetricPath,
        tag: TypeTag,
    },
    Discovery(DiscoveryTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryTarget {
    Nodes,
    Buckets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsqdRequest {
    Uptime,
    Health,
    Version,
    DiscoverTopics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupdRequest {
    Count,
    Names,
    Topics,
}

impl Request {
    /// Parse the positional form. Empty arguments are dropped first, since
    /// the poller passes `""` for unused item-key parameters. Trailing extra
    /// arguments are ignored.
    pub fn parse(kind: &str, args: &[String]) -> Result<Self> {
        let mut args = Positional::new(kind, args);

        let request = match kind {
            "cluster" => Self::Couchbase(CouchbaseRequest::Cluster {
                path: args.path()?,
                tag: args.tag()?,
            }),
            "bucket" => Self::Couchbase(CouchbaseRequest::Bucket {
                name: args.next("name")?.to_string(),
                path: args.path()?,
                tag: args.tag()?,
            }),
            "node" => Self::Couchbase(CouchbaseRequest::Node {
                hostname: args.next("hostname")?.to_string(),
                path: args.path()?,
                tag: args.tag()?,
            }),
            "discovery" => {
                let target = match args.next("nodes|buckets")? {
                    "nodes" => DiscoveryTarget::Nodes,
                    "buckets" => DiscoveryTarget::Buckets,
                    other => return Err(ProbeError::UnknownCommand(format!("discovery {other}"))),
                };
                Self::Couchbase(CouchbaseRequest::Discovery(target))
            }
            "nsqd" => Self::Nsqd(match args.next("uptime|health|version|discovery")? {
                "uptime" => NsqdRequest::Uptime,
                "health" => NsqdRequest::Health,
                "version" => NsqdRequest::Version,
                "discovery" => match args.next("topics")? {
                    "topics" => NsqdRequest::DiscoverTopics,
                    other => {
                        return Err(ProbeError::UnknownCommand(format!(
                            "nsqd discovery {other}"
                        )));
                    }
                },
                other => return Err(ProbeError::UnknownCommand(format!("nsqd {other}"))),
            }),
            "nsqlookupd" => Self::Lookupd(match args.next("count|names|topics")? {
                "count" => LookupdRequest::Count,
                "names" => LookupdRequest::Names,
                "topics" => LookupdRequest::Topics,
                other => return Err(ProbeError::UnknownCommand(format!("nsqlookupd {other}"))),
            }),
            other => return Err(ProbeError::UnknownCommand(other.to_string())),
        };

        args.warn_unused();
        Ok(request)
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Couchbase(_) => Backend::Couchbase,
            Self::Nsqd(_) | Self::Lookupd(_) => Backend::Nsq,
        }
    }
}

/// Cursor over the non-empty positional arguments of one command.
struct Positional<'a> {
    command: &'a str,
    args: Vec<&'a str>,
    pos: usize,
}

impl<'a> Positional<'a> {
    fn new(command: &'a str, args: &'a [String]) -> Self {
        Self {
            command,
            args: args
                .iter()
                .map(String::as_str)
                .filter(|a| !a.is_empty())
                .collect(),
            pos: 0,
        }
    }

    fn next(&mut self, argument: &'static str) -> Result<&'a str> {
        let value = self
            .args
            .get(self.pos)
            .copied()
            .ok_or_else(|| ProbeError::MissingArgument {
                command: self.command.to_string(),
                argument,
            })?;
        self.pos += 1;
        Ok(value)
    }

    fn path(&mut self) -> Result<MetricPath> {
        MetricPath::parse(self.next("path")?)
    }

    fn tag(&mut self) -> Result<TypeTag> {
        self.next("type")?.parse()
    }

    fn warn_unused(&self) {
        if let Some(extra) = self.args.get(self.pos..).filter(|rest| !rest.is_empty()) {
            tracing::warn!(command = self.command, ?extra, "ignoring extra arguments");
        }
    }
}

/// Look up a single top-level key.
pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    resolve(value, &MetricPath::parse(key)?)
}
