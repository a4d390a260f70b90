//! Value coercion: turn a resolved JSON value into the single line the poller
//! reads, and the discovery payload format used for low-level discovery.

pub mod discovery;
pub mod tag;
pub mod value;

pub use discovery::{MacroName, format_discovery_entries};
pub use tag::TypeTag;
pub use value::{coerce, display_string};
