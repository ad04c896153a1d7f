//! Tag-key codec
//!
//! Canonicalizes a tag map to and from a deterministic string signature.
//! The signature is used as the grouping key inside the stream engine, so it
//! must be stable: pairs are ordered by key, rendered `k:v`, and joined with
//! `|`. `tags_from_key(key_from_tags(t)) == t` for every tag map, including
//! the empty map (`""`) and the absent case (`None`).
//!
//! Tag keys and values must not contain the `:` or `|` delimiters; the codec
//! performs no escaping. This is a documented limitation inherited from the
//! wire formats the keys end up in.

use std::collections::BTreeMap;

/// Tag map attached to a metric element.
///
/// A `BTreeMap` keeps entries ordered by key, which makes the encoded
/// signature order-insensitive with respect to insertion order.
pub type TagMap = BTreeMap<String, String>;

/// Encode a tag map into its canonical string signature.
///
/// `None` stays `None`; the empty map encodes to `""`.
///
/// ```
/// use gauge_protocol::{key_from_tags, TagMap};
///
/// let tags = TagMap::from([
///     ("foo".to_string(), "bar".to_string()),
///     ("bat".to_string(), "baz".to_string()),
/// ]);
/// assert_eq!(key_from_tags(Some(&tags)).as_deref(), Some("bat:baz|foo:bar"));
/// assert_eq!(key_from_tags(None), None);
/// ```
pub fn key_from_tags(tags: Option<&TagMap>) -> Option<String> {
    tags.map(|tags| {
        tags.iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect::<Vec<_>>()
            .join("|")
    })
}

/// Decode a canonical signature back into a tag map.
///
/// Splits on `|`, drops empty segments, and splits each segment on the first
/// `:`. A segment without a `:` decodes to a tag with an empty value.
///
/// ```
/// use gauge_protocol::tags_from_key;
///
/// let tags = tags_from_key(Some("bat:baz|foo:bar")).unwrap();
/// assert_eq!(tags.get("foo").map(String::as_str), Some("bar"));
/// assert_eq!(tags_from_key(None), None);
/// assert!(tags_from_key(Some("")).unwrap().is_empty());
/// ```
pub fn tags_from_key(key: Option<&str>) -> Option<TagMap> {
    key.map(|key| {
        key.split('|')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once(':') {
                Some((field, value)) => (field.to_string(), value.to_string()),
                None => (segment.to_string(), String::new()),
            })
            .collect()
    })
}
