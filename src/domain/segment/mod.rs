pub mod splitter;

pub use splitter::{safe_segments, split_segment};

/// Characters that end a sentence, preferred cut points
pub const SENTENCE_TERMINATORS: [char; 6] = ['。', '！', '？', '.', '!', '?'];

/// Characters that end a clause, used when no sentence terminator fits
pub const CLAUSE_SEPARATORS: [char; 4] = ['，', ',', '；', ';'];

/// Cost of a single character against the TTS per-request quota.
/// Non-ASCII characters count double.
pub fn char_weight(c: char) -> usize {
    if c.is_ascii() {
        1
    } else {
        2
    }
}

/// Weighted length of a text as the TTS service counts it
pub fn weighted_len(text: &str) -> usize {
    text.chars().map(char_weight).sum()
}
