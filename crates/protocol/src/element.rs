//! Metric element
//!
//! A single observation: name, numeric value, optional tags. Elements are
//! immutable once constructed and move through the pipeline by value (or
//! behind an `Arc` during fan-out), so there are no aliasing hazards.

use std::fmt;

use crate::tags::{key_from_tags, TagMap};

/// A single `(name, value, tags)` metric observation.
///
/// Values are stored as `f64` regardless of whether the caller supplied an
/// integer, so equality is numeric: an element carrying `1` equals one
/// carrying `1.0`.
///
/// In typical usage elements are not built by hand; callers pass
/// `(name, value, tags)` into `Coordinator::send` or `Coordinator::timer`,
/// which construct the element internally.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricElement {
    name: String,
    value: f64,
    tags: Option<TagMap>,
}

impl MetricElement {
    /// Create a new metric element.
    pub fn new(name: impl Into<String>, value: impl Into<f64>, tags: Option<TagMap>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            tags,
        }
    }

    /// Base name of the metric this element belongs to.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric value of the element.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Tags associated with this element, if any.
    #[inline]
    pub fn tags(&self) -> Option<&TagMap> {
        self.tags.as_ref()
    }

    /// Canonical tag signature, used as the grouping key.
    ///
    /// `None` when the element carries no tags; `""` for an empty tag map.
    pub fn key(&self) -> Option<String> {
        key_from_tags(self.tags.as_ref())
    }
}

impl fmt::Display for MetricElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.name)?;
        // Integral values render without a fractional part.
        if self.value.fract() == 0.0 && self.value.abs() < 1e15 {
            write!(f, "{}", self.value as i64)?;
        } else {
            write!(f, "{}", self.value)?;
        }
        if let Some(key) = self.key() {
            write!(f, " [{key}]")?;
        }
        Ok(())
    }
}
