//! Maps dominant emotions to recommended reflection tools.

use std::collections::HashSet;

use crate::emotion::{DominantEmotion, Emotion};
use crate::types::DbId;

/// Build the deduplicated tool suggestion list for one entry.
///
/// `candidates` holds `(emotion, tool)` links, typically in database order.
/// Tools are grouped by the first dominant emotion that links to them and
/// otherwise keep candidate order. A tool linked to several dominant
/// emotions appears once, under the first.
pub fn suggest<T, F>(
    dominant: &[DominantEmotion],
    candidates: Vec<(Emotion, T)>,
    tool_id: F,
) -> Vec<T>
where
    F: Fn(&T) -> DbId,
{
    let mut buckets: Vec<Vec<T>> = dominant.iter().map(|_| Vec::new()).collect();
    for (emotion, tool) in candidates {
        if let Some(slot) = dominant.iter().position(|d| d.emotion == emotion) {
            buckets[slot].push(tool);
        }
    }

    let mut seen = HashSet::new();
    buckets
        .into_iter()
        .flatten()
        .filter(|tool| seen.insert(tool_id(tool)))
        .collect()
}
