//! Fixed keyword tables the lexer/parser is a pure function of (spec.md
//! §4.1). Mirrors the teacher's `OpCode` enum in spirit (a closed table of
//! mnemonics mapped to their encoding), but as a plain lookup table rather
//! than a derive-macro-populated enum, since the mnemonics here carry no
//! further per-opcode behavior beyond their table index.

/// Mnemonic, opcode index (spec.md §4.1).
pub const MNEMONICS: &[(&str, u8)] = &[
    ("mov", 0),
    ("cmp", 1),
    ("add", 2),
    ("sub", 3),
    ("not", 4),
    ("clr", 5),
    ("lea", 6),
    ("inc", 7),
    ("dec", 8),
    ("jmp", 9),
    ("bne", 10),
    ("red", 11),
    ("prn", 12),
    ("jsr", 13),
    ("rts", 14),
    ("hlt", 15),
];

pub const DIRECTIVES: &[&str] = &[".data", ".string", ".entry", ".extern", ".define"];

/// Registers usable as operands; their index is the 3-bit register field of
/// spec.md §4.4. `PSW` and `PC` are reserved names for the identifier
/// collision rule (spec.md §4.1) but are not among the encodable registers
/// — see DESIGN.md for why the instruction word has no room for them.
pub const REGISTERS: &[&str] = &["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

pub const RESERVED_NON_REGISTER_NAMES: &[&str] = &["PSW", "PC"];

pub fn opcode_of(mnemonic: &str) -> Option<u8> {
    MNEMONICS
        .iter()
        .find(|(name, _)| *name == mnemonic)
        .map(|(_, op)| *op)
}

pub fn is_mnemonic(word: &str) -> bool {
    MNEMONICS.iter().any(|(name, _)| *name == word)
}

pub fn is_directive(word: &str) -> bool {
    DIRECTIVES.contains(&word)
}

pub fn register_number(word: &str) -> Option<u8> {
    REGISTERS.iter().position(|&r| r == word).map(|i| i as u8)
}

pub fn is_reserved_word(word: &str) -> bool {
    is_mnemonic(word)
        || is_directive(word)
        || REGISTERS.contains(&word)
        || RESERVED_NON_REGISTER_NAMES.contains(&word)
}

/// Operand-arity/type table (spec.md §4.1 "Operand arity and type
/// constraints"). `true` means "immediate operands are rejected in this
/// slot".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperandSlots {
    /// No operands at all (`rts`, `hlt`).
    None,
    /// A single destination-only operand; `no_immediate` forbids `#value`.
    DestOnly { no_immediate: bool },
    /// A single destination-only operand that must be a label, optionally
    /// with an index, but never indexed (`jmp`, `bne`, `jsr`).
    LabelOnly,
    /// Source and destination, destination never immediate.
    SourceAndDest,
    /// Source and destination, either may be any kind (`cmp`).
    Both,
    /// Source must be a label (plain or indexed), destination never
    /// immediate (`lea`).
    LeaSourceAndDest,
}

pub fn operand_slots_of(mnemonic: &str) -> OperandSlots {
    match mnemonic {
        "rts" | "hlt" => OperandSlots::None,
        "jmp" | "bne" | "jsr" => OperandSlots::LabelOnly,
        "not" | "clr" | "inc" | "dec" | "red" => OperandSlots::DestOnly { no_immediate: true },
        "prn" => OperandSlots::DestOnly { no_immediate: false },
        "mov" | "add" | "sub" => OperandSlots::SourceAndDest,
        "cmp" => OperandSlots::Both,
        "lea" => OperandSlots::LeaSourceAndDest,
        _ => unreachable!("operand_slots_of called with non-mnemonic {:?}", mnemonic),
    }
}
