// src/pipeline/chunk.rs

//! Delivery chunking.
//!
//! Webhook channels cap message size (Discord at 2000 characters), so a
//! rendered report is cut into chunks below the cap. Cuts prefer the
//! paragraph delimiter closest to the limit so individual site entries stay
//! intact; a hard cut only happens when a single entry overruns the whole
//! window.

use unicode_segmentation::UnicodeSegmentation;

/// Paragraph delimiter between rendered entries.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

/// Splits text into chunks of at most `max_len` grapheme clusters.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_len: usize,
}

impl Chunker {
    pub fn new(max_len: usize) -> Self {
        assert!(max_len > 0, "chunk size must be positive");
        Self { max_len }
    }

    /// Lazily iterate chunks of `text`.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            rest: text,
            max_len: self.max_len,
        }
    }
}

/// Iterator over delivery-sized chunks.
pub struct Chunks<'a> {
    rest: &'a str,
    max_len: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        // Byte offset one past the window of max_len graphemes. When the
        // remainder fits, it is the final chunk.
        let window_end = match self.rest.grapheme_indices(true).nth(self.max_len) {
            Some((offset, _)) => offset,
            None => {
                let chunk = self.rest;
                self.rest = "";
                return Some(chunk);
            }
        };

        let window = &self.rest[..window_end];
        match window.rfind(PARAGRAPH_DELIMITER) {
            // Split at the delimiter nearest to (and before) the limit; the
            // delimiter itself is consumed.
            Some(split) => {
                let chunk = &self.rest[..split];
                self.rest = &self.rest[split + PARAGRAPH_DELIMITER.len()..];
                Some(chunk)
            }
            // No delimiter inside the window: hard cut at the limit.
            None => {
                self.rest = &self.rest[window_end..];
                Some(window)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str, max_len: usize) -> Vec<&str> {
        Chunker::new(max_len).chunks(text).collect()
    }

    fn grapheme_len(s: &str) -> usize {
        s.graphemes(true).count()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(collect("hello world", 100), vec!["hello world"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(collect("", 100).is_empty());
    }

    #[test]
    fn test_no_chunk_exceeds_limit() {
        let body = "entry one\n\nentry two is a bit longer\n\nentry three\n\nentry four";
        for max_len in [10, 16, 25, 40] {
            for chunk in collect(body, max_len) {
                assert!(
                    grapheme_len(chunk) <= max_len,
                    "chunk of {} graphemes exceeds {max_len}",
                    grapheme_len(chunk)
                );
            }
        }
    }

    #[test]
    fn test_splits_at_paragraph_boundary() {
        let body = "first entry\n\nsecond entry";
        let chunks = collect(body, 20);
        assert_eq!(chunks, vec!["first entry", "second entry"]);
    }

    #[test]
    fn test_hard_cut_without_delimiter() {
        let body = "a".repeat(25);
        let chunks = collect(&body, 10);
        assert_eq!(chunks, vec!["a".repeat(10), "a".repeat(10), "a".repeat(5)]);
    }

    #[test]
    fn test_final_short_chunk_is_emitted() {
        let body = "0123456789\n\nx";
        let chunks = collect(body, 12);
        assert_eq!(chunks.last(), Some(&"x"));
    }

    #[test]
    fn test_reconstruction_at_delimiter_splits() {
        let body = "alpha\n\nbravo\n\ncharlie\n\ndelta";
        let chunks = collect(body, 16);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(PARAGRAPH_DELIMITER), body);
    }

    #[test]
    fn test_reconstruction_with_hard_cuts() {
        let body = "x".repeat(45);
        let chunks = collect(&body, 20);
        // hard cuts consume no characters
        assert_eq!(chunks.concat(), body);
    }

    #[test]
    fn test_multibyte_text_never_splits_inside_grapheme() {
        let body = "naïve café entry 🦘🦘🦘\n\nsecond entry ✓";
        for max_len in [5, 8, 13] {
            let mut reassembled = String::new();
            for chunk in collect(body, max_len) {
                assert!(grapheme_len(chunk) <= max_len);
                reassembled.push_str(chunk);
            }
            // every character survives somewhere (delimiters may be consumed)
            for part in body.split(PARAGRAPH_DELIMITER) {
                for word in part.split_whitespace() {
                    assert!(reassembled.contains(word), "lost '{word}'");
                }
            }
        }
    }

    #[test]
    fn test_report_sized_body_splits_in_two() {
        // ~3500 characters with a paragraph break every ~500: the split lands
        // on a boundary and two chunks suffice at a 2000 limit.
        let entry = format!("{}\n\n", "e".repeat(498));
        let body = entry.repeat(7);
        let body = body.trim_end();

        let chunks = collect(body, 2000);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(grapheme_len(chunk) <= 2000);
            // paragraph split: chunks end on a full entry
            assert!(chunk.ends_with('e'));
        }
    }
}
