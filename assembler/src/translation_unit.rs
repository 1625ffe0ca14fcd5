//! Per-file assembly state threaded through the first and second passes
//! (spec.md §3 "TranslationUnit", §4.3, §4.4).

use crate::symbol::{EntriesList, ExternalsList, SymbolTable};
use crate::word::Word;

/// First instruction address (spec.md §4.3 "IC starts at 100").
pub const STARTING_ADDRESS: i32 = 100;

/// Upper bound on combined instruction + data words a single file may
/// produce (spec.md §4.3 "the image may not exceed 3996 words").
pub const MAX_IMAGE_WORDS: usize = 3996;

#[derive(Debug)]
pub struct TranslationUnit {
    pub instruction_image: Vec<Word>,
    pub data_image: Vec<Word>,
    pub ic: i32,
    pub dc: i32,
    pub symbol_table: SymbolTable,
    pub entries: EntriesList,
    pub externals: ExternalsList,
    /// Total external-reference *sites* seen across the whole file (spec.md
    /// §3), not the number of distinct external symbols — every operand word
    /// that resolved to an `extern` name increments this once, even when
    /// several sites share a symbol.
    pub external_count: u32,
}

impl TranslationUnit {
    pub fn new() -> Self {
        TranslationUnit {
            instruction_image: Vec::new(),
            data_image: Vec::new(),
            ic: STARTING_ADDRESS,
            dc: 0,
            symbol_table: SymbolTable::new(),
            entries: EntriesList::new(),
            externals: ExternalsList::new(),
            external_count: 0,
        }
    }

    /// Total words committed so far, the quantity spec.md §4.3 bounds by
    /// [`MAX_IMAGE_WORDS`].
    pub fn word_count(&self) -> usize {
        self.instruction_image.len() + self.data_image.len()
    }

    pub fn would_overflow(&self, additional_words: usize) -> bool {
        self.word_count() + additional_words > MAX_IMAGE_WORDS
    }

    /// First pass only knows *how many* words a line will take (spec.md
    /// §4.3.1), not their final bit patterns, so it just advances the
    /// counter; the second pass later fills the images word-by-word via
    /// [`TranslationUnit::push_instruction_word`].
    pub fn advance_ic(&mut self, words: i32) {
        self.ic += words;
    }

    pub fn advance_dc(&mut self, words: i32) {
        self.dc += words;
    }

    pub fn push_instruction_word(&mut self, word: Word) {
        self.instruction_image.push(word);
        self.ic += 1;
    }

    pub fn push_data_word(&mut self, word: Word) {
        self.data_image.push(word);
        self.dc += 1;
    }

    /// Final address of every data symbol is its offset plus the address
    /// right after the last instruction word (spec.md §4.3 step 4
    /// "relocate data symbols by the final IC").
    pub fn data_base_address(&self) -> i32 {
        STARTING_ADDRESS + self.instruction_image.len() as i32
    }
}

impl Default for TranslationUnit {
    fn default() -> Self {
        TranslationUnit::new()
    }
}
