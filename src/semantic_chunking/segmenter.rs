//! Sentence segmentation.
//!
//! Sentences are the atomic units the chunker embeds and merges. Splitting
//! uses Unicode sentence boundaries (UAX #29) rather than a hand-rolled
//! period scanner.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into trimmed, non-empty sentences in source order.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
