//! Metric path type used on the command line.
//!
//! Example: `storageTotals.hdd.free`  =>  ["storageTotals", "hdd", "free"]
//!
//! Segments are literal object keys split on a literal `.`. There is no
//! escaping, so a key that itself contains `.` cannot be addressed.

use crate::error::{ProbeError, Result};

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPath {
    raw: String,
    segments: Vec<String>,
}

impl MetricPath {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(ProbeError::PathNotFound {
                path: String::new(),
                segment: String::new(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            segments: raw.split('.').map(str::to_string).collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// If the first segment is `head` and more segments follow, return the
    /// remainder as its own path (`stats.op.samples` => `op.samples`).
    pub fn strip_head(&self, head: &str) -> Option<Self> {
        match self.segments.split_first() {
            Some((first, rest)) if first == head && !rest.is_empty() => Some(Self {
                raw: rest.join("."),
                segments: rest.to_vec(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for MetricPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Walk `path` from the root of `tree`, one object key per segment.
///
/// Fails with `PathNotFound` naming the first segment that is absent, or
/// whose parent is not an object.
pub fn resolve<'a>(tree: &'a Value, path: &MetricPath) -> Result<&'a Value> {
    let mut current = tree;
    for segment in path.segments() {
        current = match current {
            Value::Object(map) => map.get(segment),
            _ => None,
        }
        .ok_or_else(|| ProbeError::PathNotFound {
            path: path.as_str().to_string(),
            segment: segment.clone(),
        })?;
    }
    Ok(current)
}
