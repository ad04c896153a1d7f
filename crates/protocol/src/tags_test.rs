//! Tag-key codec tests
//!
//! Round-trip and ordering guarantees for `key_from_tags` / `tags_from_key`.

use crate::tags::{key_from_tags, tags_from_key, TagMap};

/// Helper to build a tag map from string pairs
fn tag_map(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_encode_none() {
    assert_eq!(key_from_tags(None), None);
}

#[test]
fn test_encode_empty_map() {
    assert_eq!(key_from_tags(Some(&TagMap::new())).as_deref(), Some(""));
}

#[test]
fn test_encode_single_pair() {
    let tags = tag_map(&[("foo", "bar")]);
    assert_eq!(key_from_tags(Some(&tags)).as_deref(), Some("foo:bar"));
}

#[test]
fn test_encode_sorts_by_key() {
    let tags = tag_map(&[("foo", "bar"), ("bat", "baz")]);
    assert_eq!(
        key_from_tags(Some(&tags)).as_deref(),
        Some("bat:baz|foo:bar")
    );
}

#[test]
fn test_encode_is_order_insensitive() {
    let forward = tag_map(&[("a", "1"), ("b", "2")]);
    let reverse = tag_map(&[("b", "2"), ("a", "1")]);
    assert_eq!(key_from_tags(Some(&forward)), key_from_tags(Some(&reverse)));
}

#[test]
fn test_decode_none() {
    assert_eq!(tags_from_key(None), None);
}

#[test]
fn test_decode_empty_string() {
    assert_eq!(tags_from_key(Some("")), Some(TagMap::new()));
}

#[test]
fn test_decode_multiple_pairs() {
    let tags = tags_from_key(Some("bat:baz|foo:bar")).unwrap();
    assert_eq!(tags, tag_map(&[("bat", "baz"), ("foo", "bar")]));
}

#[test]
fn test_decode_splits_on_first_colon_only() {
    // A value containing no delimiter after the first colon stays intact.
    let tags = tags_from_key(Some("ts:12:30:00")).unwrap();
    assert_eq!(tags, tag_map(&[("ts", "12:30:00")]));
}

#[test]
fn test_decode_drops_empty_segments() {
    let tags = tags_from_key(Some("foo:bar||bat:baz")).unwrap();
    assert_eq!(tags, tag_map(&[("bat", "baz"), ("foo", "bar")]));
}

#[test]
fn test_round_trip() {
    let cases = [
        None,
        Some(TagMap::new()),
        Some(tag_map(&[("a", "b")])),
        Some(tag_map(&[("a", "b"), ("c", "d")])),
    ];
    for tags in cases {
        let key = key_from_tags(tags.as_ref());
        assert_eq!(tags_from_key(key.as_deref()), tags);
    }
}
