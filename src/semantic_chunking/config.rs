//! Chunking configuration.

use serde::{Deserialize, Serialize};

/// How the distance threshold for chunk boundaries is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakpointStrategy {
    /// Boundary wherever the distance exceeds the given percentile of the
    /// observed distance distribution. `threshold` is in `0.0..=1.0`.
    Percentile { threshold: f32 },
    /// Boundary wherever the distance exceeds a fixed cosine-distance cutoff.
    Absolute { cutoff: f32 },
}

impl Default for BreakpointStrategy {
    fn default() -> Self {
        Self::Percentile { threshold: 0.95 }
    }
}

/// Knobs for [`super::service::SemanticChunker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Breakpoint derivation strategy.
    pub strategy: BreakpointStrategy,
    /// Neighbor sentences joined into each embedding window on both sides.
    /// Smooths single-sentence noise; 0 embeds each sentence alone.
    pub buffer_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: BreakpointStrategy::default(),
            buffer_size: 1,
        }
    }
}
