use super::{char_weight, weighted_len, CLAUSE_SEPARATORS, SENTENCE_TERMINATORS};

/// Split a segment into pieces whose weighted length fits `max_weight`.
///
/// Cuts prefer the last sentence terminator inside the window, then the last
/// clause separator, and only force-cut mid-clause when neither exists.
/// Pieces are exact slices of `text`: joining them gives back `text`.
/// Whitespace right after a cut stays with the preceding piece while it fits.
///
/// `max_weight` should be at least 2 so any single character fits; a smaller
/// limit still terminates because every cut consumes at least one character.
pub fn split_segment(text: &str, max_weight: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if weighted_len(rest) <= max_weight {
            pieces.push(rest.to_string());
            break;
        }

        let window_end = window_end(rest, max_weight);
        let window = &rest[..window_end];

        let cut = last_boundary(window, &SENTENCE_TERMINATORS)
            .or_else(|| last_boundary(window, &CLAUSE_SEPARATORS))
            .unwrap_or(window_end);

        // A window that cannot hold even one character still has to make progress
        let cut = if cut == 0 {
            rest.chars().next().map_or(rest.len(), char::len_utf8)
        } else {
            cut
        };

        let end = absorb_whitespace(rest, cut, max_weight);
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    pieces
}

/// Make every segment TTS-safe, keeping script order.
/// Pieces with nothing but whitespace are dropped.
pub fn safe_segments<S: AsRef<str>>(segments: &[S], max_weight: usize) -> Vec<String> {
    segments
        .iter()
        .flat_map(|segment| split_segment(segment.as_ref(), max_weight))
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

/// Byte offset just past the longest prefix whose weighted length fits
fn window_end(text: &str, max_weight: usize) -> usize {
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let weight = char_weight(c);
        if used + weight > max_weight {
            break;
        }
        used += weight;
        end = idx + c.len_utf8();
    }
    end
}

/// Byte offset just past the last character of `window` found in `boundaries`
fn last_boundary(window: &str, boundaries: &[char]) -> Option<usize> {
    window
        .char_indices()
        .rev()
        .find(|(_, c)| boundaries.contains(c))
        .map(|(idx, c)| idx + c.len_utf8())
}

fn absorb_whitespace(text: &str, cut: usize, max_weight: usize) -> usize {
    let mut weight = weighted_len(&text[..cut]);
    let mut end = cut;
    for c in text[cut..].chars() {
        if !c.is_whitespace() || weight + char_weight(c) > max_weight {
            break;
        }
        weight += char_weight(c);
        end += c.len_utf8();
    }
    end
}
