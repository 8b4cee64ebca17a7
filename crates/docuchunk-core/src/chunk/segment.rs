//! Sentence segmentation.
//!
//! A sentence ends at `.`, `!`, or `?` followed by whitespace or the end of
//! the text. Runs of terminal punctuation (`?!`, `...`) end where the run is
//! followed by whitespace. Abbreviations are not special-cased.
//!
//! Spans exclude surrounding whitespace, so their union need not cover the
//! whole input.
//!
//! # Example
//!
//! ```rust
//! use docuchunk_core::chunk::segment::{segment, SentenceSpan};
//!
//! let spans = segment("One. Two!  Three");
//! assert_eq!(
//!     spans,
//!     vec![
//!         SentenceSpan { start: 0, end: 4 },
//!         SentenceSpan { start: 5, end: 9 },
//!         SentenceSpan { start: 11, end: 16 },
//!     ]
//! );
//! ```

/// Half-open char span `[start, end)` of one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}

impl SentenceSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split `text` into ordered, non-overlapping sentence spans (char offsets).
pub fn segment(text: &str) -> Vec<SentenceSpan> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut content_end = 0;

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            continue;
        }
        let start = *open.get_or_insert(i);
        content_end = i + 1;

        let at_boundary = chars.get(i + 1).map_or(true, |next| next.is_whitespace());
        if is_terminal(c) && at_boundary {
            spans.push(SentenceSpan { start, end: i + 1 });
            open = None;
        }
    }

    if let Some(start) = open {
        spans.push(SentenceSpan {
            start,
            end: content_end,
        });
    }

    spans
}
