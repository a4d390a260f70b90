//! Dotted-path traversal into a fetched JSON document.
//!
//! The document itself is a `serde_json::Value`: Null, Bool, Number, String,
//! Array or Object. Nothing here mutates it.

pub mod path;

pub use path::{MetricPath, resolve};
