//! Breakpoint detection over consecutive embedding distances.

use super::config::BreakpointStrategy;

/// Cosine distance in `0.0..=2.0`; zero vectors are maximally distant.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 1.0;
    }
    1.0 - dot / denom
}

/// Distance between each pair of consecutive embeddings. Returns one fewer
/// entry than the input.
pub(crate) fn consecutive_distances(embeddings: &[Vec<f32>]) -> Vec<f32> {
    embeddings
        .windows(2)
        .map(|pair| cosine_distance(&pair[0], &pair[1]))
        .collect()
}

/// Indices `i` such that a chunk boundary belongs between sentence `i` and
/// sentence `i + 1`.
pub(crate) fn breakpoint_indices(distances: &[f32], strategy: BreakpointStrategy) -> Vec<usize> {
    let Some(threshold) = breakpoint_threshold(distances, strategy) else {
        return Vec::new();
    };
    distances
        .iter()
        .enumerate()
        .filter(|(_, distance)| **distance > threshold)
        .map(|(index, _)| index)
        .collect()
}

/// Threshold derivation. `None` when there is nothing to split.
fn breakpoint_threshold(distances: &[f32], strategy: BreakpointStrategy) -> Option<f32> {
    if distances.is_empty() {
        return None;
    }
    match strategy {
        BreakpointStrategy::Absolute { cutoff } => Some(cutoff),
        BreakpointStrategy::Percentile { threshold } => {
            Some(percentile(distances, threshold.clamp(0.0, 1.0)))
        }
    }
}

/// Nearest-rank percentile over an unsorted sample.
fn percentile(sample: &[f32], fraction: f32) -> f32 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((sorted.len() - 1) as f32 * fraction).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
