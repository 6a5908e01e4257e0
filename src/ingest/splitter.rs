//! Boundary-aware text splitting with guaranteed overlap.
//!
//! Text is first cut into pieces no longer than half the non-overlapping
//! budget, preferring paragraph, line, sentence and word boundaries in that
//! order and falling back to hard character cuts. Pieces keep their trailing
//! separator, so a window of consecutive pieces is an exact slice of the
//! source text. Windows are packed greedily up to `chunk_size` characters and
//! each next window rewinds to the latest piece boundary that still keeps
//! `chunk_overlap` characters of the previous one.
//!
//! All lengths are counted in `char`s.

use crate::error::{NyayError, Result};

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", "; ", " "];

/// A chunk-sized slice of the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    /// Offset of the first character, in chars from the start of the input.
    pub char_start: usize,
    pub char_len: usize,
}

impl Span<'_> {
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_len
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(NyayError::Configuration(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(NyayError::Configuration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Largest piece the packer can be handed while still guaranteeing that
    /// every window both keeps the overlap and admits one new piece.
    fn max_piece(&self) -> usize {
        ((self.chunk_size - self.chunk_overlap) / 2).max(1)
    }

    pub fn split<'a>(&self, text: &'a str) -> Vec<Span<'a>> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        collect_pieces(text, 0, text.len(), SEPARATORS, self.max_piece(), &mut pieces);

        let mut char_starts = Vec::with_capacity(pieces.len());
        let mut running = 0;
        for piece in &pieces {
            char_starts.push(running);
            running += piece.chars;
        }

        let n = pieces.len();
        let mut spans = Vec::new();
        let mut i = 0;

        loop {
            let mut j = i;
            let mut len = 0;
            while j < n && len + pieces[j].chars <= self.chunk_size {
                len += pieces[j].chars;
                j += 1;
            }

            spans.push(Span {
                text: &text[pieces[i].start..pieces[j - 1].end],
                char_start: char_starts[i],
                char_len: len,
            });

            if j == n {
                break;
            }

            let mut k = j;
            let mut kept = 0;
            while k > i + 1 && kept < self.chunk_overlap {
                k -= 1;
                kept += pieces[k].chars;
            }
            i = k;
        }

        spans
    }
}

fn collect_pieces(
    text: &str,
    start: usize,
    end: usize,
    separators: &[&str],
    max_chars: usize,
    out: &mut Vec<Piece>,
) {
    let slice = &text[start..end];
    let chars = slice.chars().count();
    if chars <= max_chars {
        if chars > 0 {
            out.push(Piece { start, end, chars });
        }
        return;
    }

    let Some((separator, rest)) = separators.split_first() else {
        hard_cut(text, start, end, max_chars, out);
        return;
    };

    let mut segment_start = start;
    for (pos, _) in slice.match_indices(separator) {
        let segment_end = start + pos + separator.len();
        collect_pieces(text, segment_start, segment_end, rest, max_chars, out);
        segment_start = segment_end;
    }
    if segment_start < end {
        collect_pieces(text, segment_start, end, rest, max_chars, out);
    }
}

fn hard_cut(text: &str, start: usize, end: usize, max_chars: usize, out: &mut Vec<Piece>) {
    let mut piece_start = start;
    let mut count = 0;
    for (offset, _) in text[start..end].char_indices() {
        if count == max_chars {
            out.push(Piece {
                start: piece_start,
                end: start + offset,
                chars: count,
            });
            piece_start = start + offset;
            count = 0;
        }
        count += 1;
    }
    if count > 0 {
        out.push(Piece {
            start: piece_start,
            end,
            chars: count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(splitter: &RecursiveSplitter, text: &str) {
        let spans = splitter.split(text);
        for span in &spans {
            assert!(span.char_len <= splitter.chunk_size());
            assert_eq!(span.text.chars().count(), span.char_len);
        }
        for pair in spans.windows(2) {
            let overlap = pair[0].char_end().saturating_sub(pair[1].char_start);
            assert!(
                overlap >= splitter.chunk_overlap(),
                "overlap {} < {}",
                overlap,
                splitter.chunk_overlap()
            );
            assert!(pair[1].char_start > pair[0].char_start);
        }
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(RecursiveSplitter::new(100, 100).is_err());
        assert!(RecursiveSplitter::new(0, 0).is_err());
        assert!(RecursiveSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let s = RecursiveSplitter::new(1000, 200).unwrap();
        let spans = s.split("Section 420 deals with cheating.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Section 420 deals with cheating.");
        assert_eq!(spans[0].char_start, 0);
    }

    #[test]
    fn whitespace_only_text_has_no_chunks() {
        let s = RecursiveSplitter::new(1000, 200).unwrap();
        assert!(s.split("   \n\n  ").is_empty());
        assert!(s.split("").is_empty());
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let s = RecursiveSplitter::new(60, 10).unwrap();
        let text = "First paragraph about bail.\n\nSecond paragraph about FIR filing.\n\nThird one.";
        let spans = s.split(text);
        assert!(spans.len() > 1);
        // No span starts in the middle of a word.
        for span in &spans {
            let start_byte = span.text.as_ptr() as usize - text.as_ptr() as usize;
            if start_byte > 0 {
                let prev = text[..start_byte].chars().last().unwrap();
                assert!(prev.is_whitespace() || prev == '.', "cut after {:?}", prev);
            }
        }
        assert_invariants(&s, text);
    }

    #[test]
    fn spans_are_exact_slices() {
        let s = RecursiveSplitter::new(50, 10).unwrap();
        let text = "The Consumer Protection Act, 2019 gives every consumer the right to be informed. \
                    A complaint may be filed with the District Commission.";
        for span in s.split(text) {
            assert!(text.contains(span.text));
            let expected: String = text.chars().skip(span.char_start).take(span.char_len).collect();
            assert_eq!(span.text, expected);
        }
    }

    #[test]
    fn hard_cuts_unbroken_text() {
        let s = RecursiveSplitter::new(100, 20).unwrap();
        let text = "x".repeat(950);
        let spans = s.split(&text);
        assert!(spans.len() > 9);
        assert_invariants(&s, &text);
        assert_eq!(spans.last().unwrap().char_end(), 950);
    }

    #[test]
    fn counts_devanagari_by_chars() {
        let s = RecursiveSplitter::new(40, 8).unwrap();
        let text = "न्याय सेतु भारतीय कानून के बारे में जानकारी देता है। ".repeat(12);
        assert_invariants(&s, &text);
    }

    #[test]
    fn default_sizes_hold_on_long_document() {
        let s = RecursiveSplitter::new(1000, 200).unwrap();
        let para = "Whoever cheats and thereby dishonestly induces the person deceived to deliver any property shall be punished. ";
        let text = (0..40)
            .map(|i| format!("{}{}\n\n", para.repeat(i % 5 + 1), i))
            .collect::<String>();
        assert_invariants(&s, &text);
    }

    #[test]
    fn zero_overlap_tiles_the_text() {
        let s = RecursiveSplitter::new(30, 0).unwrap();
        let text = "one two three four five six seven eight nine ten eleven twelve thirteen";
        let spans = s.split(text);
        let joined: String = spans.iter().map(|sp| sp.text).collect();
        assert_eq!(joined, text);
    }
}
