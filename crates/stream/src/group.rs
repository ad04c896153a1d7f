//! Batch grouping by tag signature
//!
//! Groups a completed batch by each element's canonical tag key, preserving
//! the order in which distinct keys were first seen within the batch. That
//! order is load-bearing: it fixes the emission order of aggregated results.

use std::collections::HashMap;

use gauge_protocol::MetricElement;

/// Group a batch by tag signature in first-occurrence order.
///
/// The untagged case (`None` key) forms a group like any other.
pub(crate) fn group_by_key(batch: Vec<MetricElement>) -> Vec<(Option<String>, Vec<MetricElement>)> {
    let mut groups: Vec<(Option<String>, Vec<MetricElement>)> = Vec::new();
    let mut index: HashMap<Option<String>, usize> = HashMap::new();

    for element in batch {
        let key = element.key();
        match index.get(&key) {
            Some(&slot) => groups[slot].1.push(element),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![element]));
            }
        }
    }

    groups
}
