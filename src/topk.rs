//! Ranking utilities.

use ordered_float::NotNan;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// The `k` highest-scoring entries, descending by score.
///
/// Non-finite and non-positive scores are skipped. Equal scores are ordered by
/// key so the ranking is stable across runs.
pub fn top_k<'a, I>(scores: I, k: usize) -> Vec<(&'a str, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (key, score) in scores {
        if !score.is_finite() || score <= 0.0 {
            continue;
        }
        let Ok(s) = NotNan::new(score) else { continue };
        // Min-heap on (score, reversed key): the root is the entry to evict.
        let entry = Reverse((s, Reverse(key)));
        if heap.len() < k {
            heap.push(entry);
        } else if let Some(Reverse(root)) = heap.peek() {
            if (s, Reverse(key)) > *root {
                heap.pop();
                heap.push(entry);
            }
        }
    }
    let mut results: Vec<(&str, f64)> = heap
        .into_iter()
        .map(|Reverse((s, Reverse(key)))| (key, s.into_inner()))
        .collect();
    results.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    results
}
