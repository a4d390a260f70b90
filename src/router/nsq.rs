use crate::adapters::{NsqLookupdApi, NsqdApi};
use crate::coerce::{MacroName, TypeTag, coerce, display_string, format_discovery_entries};
use crate::error::{ProbeError, Result};
use crate::router::{LookupdRequest, NsqdRequest, field};

use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Macro name and source field for each column of a topic discovery entry.
const TOPIC_FIELDS: [(&str, &str); 5] = [
    ("TOPICNAME", "topic_name"),
    ("BACKENDDEPTH", "backend_depth"),
    ("DEPTH", "depth"),
    ("MESSAGE_COUNT", "message_count"),
    ("PAUSED", "paused"),
];

/// `now` is injected so uptime stays testable.
pub fn run_nsqd<A: NsqdApi + ?Sized>(
    api: &A,
    request: NsqdRequest,
    now: SystemTime,
) -> Result<String> {
    match request {
        NsqdRequest::Uptime => {
            let info = api.info()?;
            let start = field(&info, "start_time")?;
            let start_secs = start
                .as_u64()
                .or_else(|| start.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .ok_or(ProbeError::UnexpectedShape {
                    what: "start_time",
                    expected: "a unix timestamp",
                })?;
            let now_secs = now
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            Ok(now_secs.saturating_sub(start_secs).to_string())
        }
        NsqdRequest::Health => {
            let stats = api.stats()?;
            coerce(field(&stats, "health")?, TypeTag::String, None)
        }
        NsqdRequest::Version => {
            let info = api.info()?;
            coerce(field(&info, "version")?, TypeTag::String, None)
        }
        NsqdRequest::DiscoverTopics => {
            let stats = api.stats()?;
            let topics = match field(&stats, "topics")? {
                Value::Null => &[][..],
                Value::Array(topics) => topics.as_slice(),
                _ => {
                    return Err(ProbeError::UnexpectedShape {
                        what: "topics",
                        expected: "a list",
                    });
                }
            };
            if topics.is_empty() {
                tracing::warn!("nsqd reports no topics");
            }
            Ok(format_discovery_entries(topics.iter().map(topic_entry)))
        }
    }
}

pub fn run_lookupd<A: NsqLookupdApi + ?Sized>(api: &A, request: LookupdRequest) -> Result<String> {
    match request {
        LookupdRequest::Count => Ok(node_names(&api.nodes()?)?.len().to_string()),
        LookupdRequest::Names => Ok(node_names(&api.nodes()?)?.join(", ")),
        LookupdRequest::Topics => Ok(topic_names(&api.topics()?).join(", ")),
    }
}

fn topic_entry(topic: &Value) -> Map<String, Value> {
    TOPIC_FIELDS
        .iter()
        .map(|(name, key)| {
            let value = topic.get(*key).cloned().unwrap_or(Value::Null);
            (MacroName::new(*name).to_string(), value)
        })
        .collect()
}

/// Hostnames of the registered daemons, sorted ascending.
fn node_names(doc: &Value) -> Result<Vec<String>> {
    let mut names = doc
        .get("producers")
        .and_then(Value::as_array)
        .map(|producers| {
            producers
                .iter()
                .map(|p| field(p, "hostname").map(display_string))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();
    names.sort();
    Ok(names)
}

/// Every topic in the cluster, sorted ascending. Each registry holds the full
/// set, so any one of them answers for the cluster.
fn topic_names(doc: &Value) -> Vec<String> {
    let mut names: Vec<String> = doc
        .get("topics")
        .and_then(Value::as_array)
        .map(|topics| topics.iter().map(display_string).collect())
        .unwrap_or_default();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use std::time::Duration;

    struct FakeNsqd {
        info: Value,
        stats: Value,
    }

    impl NsqdApi for FakeNsqd {
        fn info(&self) -> Result<Value> {
            Ok(self.info.clone())
        }

        fn stats(&self) -> Result<Value> {
            Ok(self.stats.clone())
        }
    }

    struct FakeLookupd {
        nodes: Value,
        topics: Value,
    }

    impl NsqLookupdApi for FakeLookupd {
        fn nodes(&self) -> Result<Value> {
            Ok(self.nodes.clone())
        }

        fn topics(&self) -> Result<Value> {
            Ok(self.topics.clone())
        }
    }

    fn nsqd() -> FakeNsqd {
        FakeNsqd {
            info: json!({ "version": "1.2.1", "start_time": 1_700_000_000 }),
            stats: json!({
                "health": "OK",
                "topics": [
                    {
                        "topic_name": "events",
                        "backend_depth": 0,
                        "depth": 12,
                        "message_count": 9001,
                        "paused": false,
                        "channels": []
                    },
                    { "topic_name": "audit", "depth": 1 }
                ]
            }),
        }
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn uptime_is_seconds_since_start() {
        let out = run_nsqd(&nsqd(), NsqdRequest::Uptime, at(1_700_000_125)).unwrap();
        assert_eq!(out, "125");
    }

    #[test]
    fn uptime_never_negative() {
        let out = run_nsqd(&nsqd(), NsqdRequest::Uptime, at(1_600_000_000)).unwrap();
        assert_eq!(out, "0");
    }

    #[test]
    fn health_and_version() {
        assert_eq!(run_nsqd(&nsqd(), NsqdRequest::Health, at(0)).unwrap(), "OK");
        assert_eq!(
            run_nsqd(&nsqd(), NsqdRequest::Version, at(0)).unwrap(),
            "1.2.1"
        );
    }

    #[test]
    fn missing_version_is_path_not_found() {
        let api = FakeNsqd {
            info: json!({}),
            ..nsqd()
        };
        assert!(matches!(
            run_nsqd(&api, NsqdRequest::Version, at(0)),
            Err(ProbeError::PathNotFound { .. })
        ));
    }

    #[test]
    fn topic_discovery_has_one_multi_field_entry_per_topic() {
        let out = run_nsqd(&nsqd(), NsqdRequest::DiscoverTopics, at(0)).unwrap();
        assert_eq!(
            out,
            concat!(
                r#"{"data":["#,
                r#"{"{#TOPICNAME}":"events","{#BACKENDDEPTH}":0,"{#DEPTH}":12,"#,
                r#""{#MESSAGE_COUNT}":9001,"{#PAUSED}":false},"#,
                r#"{"{#TOPICNAME}":"audit","{#BACKENDDEPTH}":null,"{#DEPTH}":1,"#,
                r#""{#MESSAGE_COUNT}":null,"{#PAUSED}":null}"#,
                r#"]}"#
            )
        );
    }

    #[test]
    fn topic_discovery_with_null_topics() {
        let api = FakeNsqd {
            stats: json!({ "health": "OK", "topics": null }),
            ..nsqd()
        };
        assert_eq!(
            run_nsqd(&api, NsqdRequest::DiscoverTopics, at(0)).unwrap(),
            r#"{"data":[]}"#
        );
    }

    fn lookupd() -> FakeLookupd {
        FakeLookupd {
            nodes: json!({ "producers": [{ "hostname": "b" }, { "hostname": "a" }] }),
            topics: json!({ "topics": ["orders", "events", "audit"] }),
        }
    }

    #[rstest]
    #[case(LookupdRequest::Count, "2")]
    #[case(LookupdRequest::Names, "a, b")]
    #[case(LookupdRequest::Topics, "audit, events, orders")]
    fn lookupd_queries(#[case] request: LookupdRequest, #[case] expected: &str) {
        assert_eq!(run_lookupd(&lookupd(), request).unwrap(), expected);
    }

    #[rstest]
    #[case(LookupdRequest::Count, "0")]
    #[case(LookupdRequest::Names, "")]
    #[case(LookupdRequest::Topics, "")]
    fn lookupd_empty_registry(#[case] request: LookupdRequest, #[case] expected: &str) {
        let api = FakeLookupd {
            nodes: json!({ "producers": [] }),
            topics: json!({ "topics": null }),
        };
        assert_eq!(run_lookupd(&api, request).unwrap(), expected);
    }

    #[test]
    fn producer_without_hostname_fails() {
        let api = FakeLookupd {
            nodes: json!({ "producers": [{ "broadcast_address": "a" }] }),
            ..lookupd()
        };
        assert!(matches!(
            run_lookupd(&api, LookupdRequest::Names),
            Err(ProbeError::PathNotFound { .. })
        ));
    }
}
