use crate::adapters::CouchbaseApi;
use crate::coerce::{MacroName, TypeTag, coerce, display_string};
use crate::error::{ProbeError, Result};
use crate::router::{CouchbaseRequest, DiscoveryTarget, field};
use crate::tree::{MetricPath, resolve};

use serde_json::Value;

const BUCKET_NODE_HOSTNAMES: &str = "nodes.hostnames";

pub fn run_couchbase<A: CouchbaseApi + ?Sized>(
    api: &A,
    request: &CouchbaseRequest,
) -> Result<String> {
    match request {
        CouchbaseRequest::Cluster { path, tag } => {
            tracing::debug!(%path, "cluster lookup");
            let doc = api.cluster()?;
            coerce_at(&doc, path, *tag)
        }
        CouchbaseRequest::Bucket { name, path, tag } => bucket(api, name, path, *tag),
        CouchbaseRequest::Node {
            hostname,
            path,
            tag,
        } => {
            tracing::debug!(%hostname, %path, "node lookup");
            let doc = api.cluster()?;
            let node = find_node(&doc, hostname)?;
            coerce_at(node, path, *tag)
        }
        CouchbaseRequest::Discovery(DiscoveryTarget::Nodes) => {
            let doc = api.cluster()?;
            let hosts = node_list(&doc)?
                .iter()
                .map(|node| {
                    node_hostname(node).map(|h| Value::String(strip_port(h).to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            discovery(hosts, "NODEHOST")
        }
        CouchbaseRequest::Discovery(DiscoveryTarget::Buckets) => {
            let doc = api.buckets()?;
            let names = doc
                .as_array()
                .ok_or(ProbeError::UnexpectedShape {
                    what: "bucket listing",
                    expected: "a list",
                })?
                .iter()
                .map(|bucket| {
                    field(bucket, "name").map(|n| Value::String(display_string(n)))
                })
                .collect::<Result<Vec<_>>>()?;
            discovery(names, "BUCKETNAME")
        }
    }
}

/// `stats.<rest>` reads the stats endpoint at `<rest>`. `nodes.hostnames`
/// joins the raw hostnames of the bucket's nodes, ports included.
fn bucket<A: CouchbaseApi + ?Sized>(
    api: &A,
    name: &str,
    path: &MetricPath,
    tag: TypeTag,
) -> Result<String> {
    if let Some(rest) = path.strip_head("stats") {
        tracing::debug!(bucket = name, path = %rest, "bucket stats lookup");
        let doc = api.bucket_stats(name)?;
        return coerce_at(&doc, &rest, tag);
    }

    tracing::debug!(bucket = name, %path, "bucket lookup");
    let doc = api.bucket(name)?;
    if path.as_str() == BUCKET_NODE_HOSTNAMES {
        let hostnames = node_list(&doc)?
            .iter()
            .map(node_hostname)
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        return coerce(
            &Value::String(hostnames),
            tag,
            Some(&MacroName::from_segment(path.last_segment())),
        );
    }
    coerce_at(&doc, path, tag)
}

fn coerce_at(doc: &Value, path: &MetricPath, tag: TypeTag) -> Result<String> {
    let value = resolve(doc, path)?;
    coerce(value, tag, Some(&MacroName::from_segment(path.last_segment())))
}

fn discovery(names: Vec<Value>, macro_name: &str) -> Result<String> {
    if names.is_empty() {
        tracing::warn!(macro_name, "discovery found no entities");
    }
    coerce(
        &Value::Array(names),
        TypeTag::StringList,
        Some(&MacroName::new(macro_name)),
    )
}

fn node_list(doc: &Value) -> Result<&Vec<Value>> {
    field(doc, "nodes")?
        .as_array()
        .ok_or(ProbeError::UnexpectedShape {
            what: "nodes",
            expected: "a list",
        })
}

fn node_hostname(node: &Value) -> Result<&str> {
    field(node, "hostname")?
        .as_str()
        .ok_or(ProbeError::UnexpectedShape {
            what: "node hostname",
            expected: "a string",
        })
}

/// First node whose hostname, port stripped, equals `hostname`.
fn find_node<'a>(doc: &'a Value, hostname: &str) -> Result<&'a Value> {
    for node in node_list(doc)? {
        if strip_port(node_hostname(node)?) == hostname {
            return Ok(node);
        }
    }
    Err(ProbeError::NodeNotFound(hostname.to_string()))
}

/// `host1:8091` => `host1`. Only a trailing all-digit suffix counts as a port.
fn strip_port(hostname: &str) -> &str {
    match hostname.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            host
        }
        _ => hostname,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use std::cell::RefCell;

    /// Canned documents; records which endpoint each call hit.
    #[derive(Default)]
    struct FakeCouchbase {
        cluster: Value,
        buckets: Value,
        bucket: Value,
        stats: Value,
        calls: RefCell<Vec<String>>,
    }

    impl FakeCouchbase {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CouchbaseApi for FakeCouchbase {
        fn cluster(&self) -> Result<Value> {
            self.calls.borrow_mut().push("cluster".to_string());
            Ok(self.cluster.clone())
        }

        fn buckets(&self) -> Result<Value> {
            self.calls.borrow_mut().push("buckets".to_string());
            Ok(self.buckets.clone())
        }

        fn bucket(&self, name: &str) -> Result<Value> {
            self.calls.borrow_mut().push(format!("bucket {name}"));
            Ok(self.bucket.clone())
        }

        fn bucket_stats(&self, name: &str) -> Result<Value> {
            self.calls.borrow_mut().push(format!("stats {name}"));
            Ok(self.stats.clone())
        }
    }

    fn fake() -> FakeCouchbase {
        FakeCouchbase {
            cluster: json!({
                "name": "default",
                "maxBucketCount": 10,
                "storageTotals": { "hdd": { "free": 1024 } },
                "nodes": [
                    {
                        "hostname": "10.0.0.1:8091",
                        "interestingStats": { "couch_views_data_size": 0 }
                    },
                    {
                        "hostname": "10.0.0.2:8091",
                        "interestingStats": { "couch_views_data_size": 77 }
                    }
                ]
            }),
            buckets: json!([{ "name": "beer-sample" }, { "name": "default" }]),
            bucket: json!({
                "name": "beer-sample",
                "basicStats": { "itemCount": "7303" },
                "nodes": [{ "hostname": "h1:x" }, { "hostname": "h2:y" }]
            }),
            stats: json!({ "op": { "samples": { "ops": [1, 2, 3] } } }),
            calls: RefCell::default(),
        }
    }

    fn cb(kind: &str, args: &[&str]) -> CouchbaseRequest {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        match crate::router::Request::parse(kind, &args).unwrap() {
            crate::router::Request::Couchbase(request) => request,
            other => panic!("not a couchbase request: {other:?}"),
        }
    }

    #[rstest]
    #[case(&["maxBucketCount", "int"], "10")]
    #[case(&["name", "string"], "default")]
    #[case(&["storageTotals.hdd.free", "int"], "1024")]
    fn cluster_paths(#[case] args: &[&str], #[case] expected: &str) {
        let api = fake();
        assert_eq!(run_couchbase(&api, &cb("cluster", args)).unwrap(), expected);
        assert_eq!(api.calls(), ["cluster"]);
    }

    #[test]
    fn cluster_missing_path_fails() {
        let api = fake();
        assert!(matches!(
            run_couchbase(&api, &cb("cluster", &["storageTotals.ssd", "int"])),
            Err(ProbeError::PathNotFound { .. })
        ));
    }

    #[test]
    fn bucket_stats_prefix_uses_stats_endpoint() {
        let api = fake();
        let request = cb("bucket", &["beer-sample", "stats.op.samples.ops", "avg"]);
        let out = run_couchbase(&api, &request).unwrap();
        assert_eq!(out, "2.0");
        assert_eq!(api.calls(), ["stats beer-sample"]);
    }

    #[test]
    fn bucket_stats_path_is_resolved_without_prefix() {
        let api = FakeCouchbase {
            stats: json!({ "stats": { "op": 1 }, "op": { "samples": { "ops": [4] } } }),
            ..fake()
        };
        let request = cb("bucket", &["b", "stats.op.samples.ops", "avg"]);
        let out = run_couchbase(&api, &request).unwrap();
        assert_eq!(out, "4.0");
    }

    #[test]
    fn bucket_generic_path_uses_bucket_endpoint() {
        let api = fake();
        let request = cb("bucket", &["beer-sample", "basicStats.itemCount", "int"]);
        let out = run_couchbase(&api, &request).unwrap();
        assert_eq!(out, "7303");
        assert_eq!(api.calls(), ["bucket beer-sample"]);
    }

    #[test]
    fn bucket_node_hostnames_keep_ports() {
        let api = fake();
        let request = cb("bucket", &["beer-sample", "nodes.hostnames", "string"]);
        let out = run_couchbase(&api, &request).unwrap();
        assert_eq!(out, "h1:x, h2:y");
    }

    #[rstest]
    #[case("10.0.0.2", "77")]
    #[case("10.0.0.1", "0")]
    fn node_lookup_strips_port(#[case] hostname: &str, #[case] expected: &str) {
        let api = fake();
        let out = run_couchbase(
            &api,
            &cb("node", &[hostname, "interestingStats.couch_views_data_size", "int"]),
        )
        .unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn node_lookup_fails_for_unknown_host() {
        let api = fake();
        match run_couchbase(&api, &cb("node", &["10.0.0.9", "hostname", "string"])) {
            Err(ProbeError::NodeNotFound(host)) => assert_eq!(host, "10.0.0.9"),
            other => panic!("expected NodeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn node_lookup_does_not_match_with_port() {
        let api = fake();
        assert!(matches!(
            run_couchbase(&api, &cb("node", &["10.0.0.1:8091", "hostname", "string"])),
            Err(ProbeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn discover_nodes() {
        let api = fake();
        let out = run_couchbase(&api, &cb("discovery", &["nodes"])).unwrap();
        assert_eq!(
            out,
            r#"{"data":[{"{#NODEHOST}":"10.0.0.1"},{"{#NODEHOST}":"10.0.0.2"}]}"#
        );
        assert_eq!(api.calls(), ["cluster"]);
    }

    #[test]
    fn discover_buckets() {
        let api = fake();
        let out = run_couchbase(&api, &cb("discovery", &["buckets"])).unwrap();
        assert_eq!(
            out,
            r#"{"data":[{"{#BUCKETNAME}":"beer-sample"},{"{#BUCKETNAME}":"default"}]}"#
        );
        assert_eq!(api.calls(), ["buckets"]);
    }

    #[test]
    fn discover_buckets_rejects_non_list() {
        let api = FakeCouchbase {
            buckets: json!({ "name": "default" }),
            ..fake()
        };
        assert!(matches!(
            run_couchbase(&api, &cb("discovery", &["buckets"])),
            Err(ProbeError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn generic_string_list_derives_macro_from_path() {
        let api = FakeCouchbase {
            cluster: json!({ "pool": { "names": ["a", "b"] } }),
            ..fake()
        };
        let request = cb("cluster", &["pool.names", "string_list"]);
        let out = run_couchbase(&api, &request).unwrap();
        assert_eq!(out, r#"{"data":[{"{#NAMES}":"a"},{"{#NAMES}":"b"}]}"#);
    }

    #[rstest]
    #[case("host1:8091", "host1")]
    #[case("host1", "host1")]
    #[case("h1:x", "h1:x")]
    #[case("[::1]:8091", "[::1]")]
    fn port_suffix(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_port(raw), expected);
    }
}
