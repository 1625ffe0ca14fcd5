//! Tokenizer over a single source line (spec.md §4.1 "Tokenization").
//!
//! `get_next_word` in the spec skips leading whitespace *and* commas, then
//! reads until the next whitespace/comma/end. That collapses comma
//! information the parser needs back (to tell "one comma" from "two commas
//! in a row" apart, spec.md's comma-count error messages). [`Scanner`]
//! keeps the two concerns separate: [`Scanner::take_word`] is the
//! spec's `get_next_word`, and [`Scanner::skip_commas`] is called
//! explicitly by the parser wherever a comma is a meaningful separator,
//! returning how many it actually consumed.

#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    rest: &'a str,
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || c == ','
}

impl<'a> Scanner<'a> {
    pub fn new(line: &'a str) -> Self {
        Scanner {
            rest: line.trim_end_matches(['\n', '\r']),
        }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start_matches(|c: char| c.is_whitespace());
    }

    /// Skips leading whitespace and every comma found (with whitespace
    /// between them), returning how many commas were consumed.
    pub fn skip_commas(&mut self) -> usize {
        self.skip_whitespace();
        let mut count = 0;
        while self.rest.starts_with(',') {
            count += 1;
            self.rest = &self.rest[1..];
            self.skip_whitespace();
        }
        count
    }

    /// True once only whitespace (no more tokens) remains.
    pub fn is_exhausted(&self) -> bool {
        self.rest.trim_start().is_empty()
    }

    /// Reads the next token: skips leading whitespace (not commas), then
    /// reads until the next whitespace, comma, or end of line. Does not
    /// consume a trailing comma.
    pub fn take_word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.find(is_word_boundary).unwrap_or(self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(word)
    }

    /// Everything left on the line, whitespace-trimmed at both ends. Used
    /// for constructs with no further internal tokenization, like the
    /// quoted body of `.string`.
    pub fn rest_trimmed(&self) -> &'a str {
        self.rest.trim()
    }

    /// Everything left on the line, with only leading whitespace trimmed;
    /// preserves trailing content verbatim (used to detect "unexpected
    /// characters after operands" without losing what they were).
    pub fn rest_from_here(&self) -> &'a str {
        self.rest.trim_start()
    }
}
