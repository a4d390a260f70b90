//! Low-level discovery payloads.
//!
//! JSON shape:
//! {
//!   "data": [
//!     { "{#NODEHOST}": "10.0.0.1" },
//!     { "{#NODEHOST}": "10.0.0.2" }
//!   ]
//! }
//!
//! Entries keep the order of the input, and keys inside an entry keep the
//! order they were inserted in.

use serde_json::{Map, Value, json};
use std::fmt;

/// Name of a poller macro, rendered as the `{#NAME}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroName(String);

impl MacroName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive a macro from a metric path segment: `names` => `NAMES`,
    /// `vBucket-map` => `VBUCKET_MAP`.
    pub fn from_segment(segment: &str) -> Self {
        if segment.is_empty() {
            return Self::new("ITEM");
        }
        let name = segment
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect::<String>();
        Self(name)
    }
}

impl fmt::Display for MacroName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{#{}}}", self.0)
    }
}

/// One single-key entry per name, all under the same macro.
pub fn format_discovery<S: AsRef<str>>(names: &[S], macro_name: &MacroName) -> String {
    let key = macro_name.to_string();
    format_discovery_entries(names.iter().map(|name| {
        let mut entry = Map::new();
        entry.insert(key.clone(), Value::String(name.as_ref().to_string()));
        entry
    }))
}

/// Multi-field form: each entry already maps placeholders to values.
pub fn format_discovery_entries<I>(entries: I) -> String
where
    I: IntoIterator<Item = Map<String, Value>>,
{
    let data: Vec<Value> = entries.into_iter().map(Value::Object).collect();
    json!({ "data": data }).to_string()
}
