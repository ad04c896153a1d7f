//! Gauge - Protocol
//!
//! The value object that flows through the pipeline, and the codec that turns
//! a tag map into the canonical grouping key.
//!
//! # Key Design
//!
//! - **`MetricElement`**: a single `(name, value, tags)` observation.
//!   Immutable after construction; owned by whichever stage holds it.
//! - **Tag-key codec**: `key_from_tags` / `tags_from_key` are exact inverses.
//!   Keys are deterministic and order-insensitive, so two tag maps with the
//!   same pairs always group together.
//!
//! # Example
//!
//! ```
//! use gauge_protocol::{MetricElement, TagMap};
//!
//! let tags = TagMap::from([("env".to_string(), "dev".to_string())]);
//! let element = MetricElement::new("requests", 1, Some(tags));
//! assert_eq!(element.key().as_deref(), Some("env:dev"));
//! ```

mod element;
mod tags;

pub use element::MetricElement;
pub use tags::{key_from_tags, tags_from_key, TagMap};

#[cfg(test)]
mod tags_test;
