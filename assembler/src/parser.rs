//! The lexer/parser (spec.md §4.1) — the lexical/syntactic heart of the
//! system. `parse_line` is a pure function of one line of text and the
//! fixed tables in [`crate::keywords`]; it always terminates in a
//! [`LineAst`], never panics on malformed input, and is deterministic
//! (spec.md §8 "Parsing is a pure function of the input line").

use crate::keywords;
use crate::lexer::Scanner;

pub const MIN_NUMBER: i16 = -2048;
pub const MAX_NUMBER: i16 = 2047;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImmediateValue {
    Number(i16),
    Constant(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IndexValue {
    Number(i16),
    Constant(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Immediate(ImmediateValue),
    Indexed { label: String, index: IndexValue },
    Label(String),
    Register(u8),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataOperand {
    Number(i16),
    Constant(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Directive {
    Data(Vec<DataOperand>),
    Str(String),
    Entry(String),
    Extern(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub mnemonic: String,
    pub opcode: u8,
    pub source: Option<Operand>,
    pub dest: Option<Operand>,
}

/// A fully parsed source line (spec.md §3 "LineAst").
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineAst {
    Empty,
    Note,
    Directive {
        label: Option<String>,
        directive: Directive,
    },
    Instruction {
        label: Option<String>,
        instruction: Instruction,
    },
    ConstantDef {
        name: String,
        value: i16,
    },
    Error {
        detail: String,
    },
}

impl LineAst {
    pub fn label(&self) -> Option<&str> {
        match self {
            LineAst::Directive { label, .. } | LineAst::Instruction { label, .. } => {
                label.as_deref()
            }
            _ => None,
        }
    }
}

fn err(detail: &str) -> LineAst {
    LineAst::Error {
        detail: detail.to_string(),
    }
}

/// Identifier/label validity (spec.md §4.1 "Identifier/label rules"):
/// alphabetic first character, alphanumeric rest, length (without a
/// trailing `:`) at most 31, and no collision with a directive, mnemonic,
/// or register name. Macro-name collisions are a first-pass concern
/// (spec.md §4.3 step 2) since the parser has no macro table to consult.
pub fn is_valid_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    if !chars.clone().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    if word.chars().count() > 31 {
        return false;
    }
    !keywords::is_reserved_word(word)
}

/// spec.md §4.1 "Numbers": base-10 signed, fits in `-2048..=2047`, at most
/// 5 characters including an optional sign, no trailing non-digit chars.
pub fn parse_number(token: &str) -> Option<i16> {
    if token.is_empty() || token.len() > 5 {
        return None;
    }
    let (negative, digits) = match token.as_bytes()[0] {
        b'+' => (false, &token[1..]),
        b'-' => (true, &token[1..]),
        _ => (false, token),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i32 = digits.parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    if (MIN_NUMBER as i32..=MAX_NUMBER as i32).contains(&value) {
        Some(value as i16)
    } else {
        None
    }
}

pub fn parse_line(line: &str) -> LineAst {
    let trimmed_start = line.trim_start();
    if trimmed_start.is_empty() {
        return LineAst::Empty;
    }
    if trimmed_start.starts_with(';') {
        return LineAst::Note;
    }

    let mut scanner = Scanner::new(line);
    let first = scanner
        .take_word()
        .expect("a non-empty, non-comment line has at least one token");

    if let Some(name) = first.strip_suffix(':') {
        if !is_valid_identifier(name) {
            return err("a label is in an invalid place");
        }
        if scanner.is_exhausted() {
            return err("the line contains only label name");
        }
        let keyword = scanner
            .take_word()
            .expect("checked non-exhausted above");
        return parse_statement(&mut scanner, keyword, Some(name.to_string()));
    }

    parse_statement(&mut scanner, first, None)
}

fn parse_statement(scanner: &mut Scanner, keyword: &str, label: Option<String>) -> LineAst {
    if keyword == ".define" {
        if label.is_some() {
            return err("a label must not be defined in a constant definition line");
        }
        return parse_constant_def(scanner);
    }
    if keywords::is_directive(keyword) {
        return parse_directive(scanner, keyword, label);
    }
    if keywords::is_mnemonic(keyword) {
        return parse_instruction(scanner, keyword, label);
    }
    if label.is_some() {
        err("after defining a label there must be an instruction or directive")
    } else {
        err("the first word must be an instruction or directive or .define or label name")
    }
}

fn parse_constant_def(scanner: &mut Scanner) -> LineAst {
    if scanner.skip_commas() > 0 {
        return err("there is a comma, after an instruction/directive/define");
    }
    let name = match scanner.take_word() {
        Some(w) if is_valid_identifier(w) => w,
        _ => return err("a constant definition is missing after the word define"),
    };

    scanner.skip_commas();
    let eq = match scanner.take_word() {
        Some(w) => w,
        None => return err("missing the equality sign in a constant definition statment"),
    };
    if eq != "=" {
        return err("missing the equality sign in a constant definition statment");
    }

    scanner.skip_commas();
    let value_tok = match scanner.take_word() {
        Some(w) => w,
        None => return err("missing a number in a constant definition statement"),
    };
    let value = match parse_number(value_tok) {
        Some(v) => v,
        None => return err("a no valid number is given in a constant definition statement"),
    };

    if !scanner.is_exhausted() {
        return err("unexpected characters after operands");
    }

    LineAst::ConstantDef {
        name: name.to_string(),
        value,
    }
}

fn parse_directive(scanner: &mut Scanner, keyword: &str, label: Option<String>) -> LineAst {
    if scanner.skip_commas() > 0 {
        return err("there is a comma, after an instruction/directive/define");
    }
    if scanner.is_exhausted() {
        return err("a directive word must be followed by an operand");
    }
    match keyword {
        ".data" => parse_data_directive(scanner, label),
        ".string" => parse_string_directive(scanner, label),
        ".entry" => parse_entry_extern(scanner, label, true),
        ".extern" => parse_entry_extern(scanner, label, false),
        _ => unreachable!("is_directive guarantees one of the four keywords above"),
    }
}

fn parse_data_operand(token: &str) -> Result<DataOperand, &'static str> {
    if token.ends_with(':') {
        return Err("a label is in an invalid place");
    }
    if let Some(n) = parse_number(token) {
        return Ok(DataOperand::Number(n));
    }
    if is_valid_identifier(token) {
        return Ok(DataOperand::Constant(token.to_string()));
    }
    Err("the operation type received an operand of an inappropriate type")
}

fn parse_data_directive(scanner: &mut Scanner, label: Option<String>) -> LineAst {
    let mut operands = Vec::new();
    loop {
        let token = match scanner.take_word() {
            Some(w) => w,
            None => return err("missing operand"),
        };
        match parse_data_operand(token) {
            Ok(op) => operands.push(op),
            Err(detail) => return err(detail),
        }

        let commas = scanner.skip_commas();
        if scanner.is_exhausted() {
            if commas > 0 {
                return err("there is a comma after the last number");
            }
            break;
        }
        if commas == 0 {
            return err("missing operand");
        }
        if commas > 1 {
            return err("there are 2 commas between a number and another number");
        }
    }
    LineAst::Directive {
        label,
        directive: Directive::Data(operands),
    }
}

fn parse_string_directive(scanner: &mut Scanner, label: Option<String>) -> LineAst {
    let token = scanner
        .take_word()
        .expect("caller checked the scanner is not exhausted");
    if !token.starts_with('"') {
        return err("after the string directive the operand must start with the character \"");
    }
    if token.len() < 2 || !token.ends_with('"') {
        return err("in the operand of the directive string there is no closing hyphen");
    }
    let inner = &token[1..token.len() - 1];
    if !inner.chars().all(|c| c.is_ascii_alphabetic()) {
        return err(
            "the operand of the string directive must include only alphabetic letters between the 2 hyphenes",
        );
    }
    if !scanner.is_exhausted() {
        return err("unexpected characters after operands");
    }
    LineAst::Directive {
        label,
        directive: Directive::Str(inner.to_string()),
    }
}

fn parse_entry_extern(scanner: &mut Scanner, label: Option<String>, is_entry: bool) -> LineAst {
    let token = scanner
        .take_word()
        .expect("caller checked the scanner is not exhausted");
    if !is_valid_identifier(token) {
        return err("an operand of entry and extern must be a proper name of a label");
    }
    if !scanner.is_exhausted() {
        return err("unexpected characters after operands");
    }
    let directive = if is_entry {
        Directive::Entry(token.to_string())
    } else {
        Directive::Extern(token.to_string())
    };
    LineAst::Directive { label, directive }
}

fn parse_operand(token: &str) -> Result<Operand, &'static str> {
    if token.ends_with(':') {
        return Err("a label is in an invalid place");
    }
    if let Some(rest) = token.strip_prefix('#') {
        if rest.is_empty() {
            return Err("# must be followed by a number or constant");
        }
        if let Some(n) = parse_number(rest) {
            return Ok(Operand::Immediate(ImmediateValue::Number(n)));
        }
        if is_valid_identifier(rest) {
            return Ok(Operand::Immediate(ImmediateValue::Constant(rest.to_string())));
        }
        return Err("# must be followed by a number or constant");
    }
    if let Some(reg) = keywords::register_number(token) {
        return Ok(Operand::Register(reg));
    }
    if let Some(open) = token.find('[') {
        if !token.ends_with(']') {
            return Err("the operation type received an operand of an inappropriate type");
        }
        let label = &token[..open];
        let index_str = &token[open + 1..token.len() - 1];
        if !is_valid_identifier(label) {
            return Err("the operation type received an operand of an inappropriate type");
        }
        let index = if let Some(n) = parse_number(index_str) {
            IndexValue::Number(n)
        } else if is_valid_identifier(index_str) {
            IndexValue::Constant(index_str.to_string())
        } else {
            return Err("the operation type received an operand of an inappropriate type");
        };
        return Ok(Operand::Indexed {
            label: label.to_string(),
            index,
        });
    }
    if is_valid_identifier(token) {
        return Ok(Operand::Label(token.to_string()));
    }
    Err("the operation type received an operand of an inappropriate type")
}

fn parse_instruction(scanner: &mut Scanner, mnemonic: &str, label: Option<String>) -> LineAst {
    let opcode = keywords::opcode_of(mnemonic).expect("is_mnemonic guarantees a table entry");
    match keywords::operand_slots_of(mnemonic) {
        keywords::OperandSlots::None => {
            if !scanner.is_exhausted() {
                return err("unexpected characters after operands");
            }
            instruction_ast(label, mnemonic, opcode, None, None)
        }
        keywords::OperandSlots::LabelOnly => {
            if scanner.skip_commas() > 0 {
                return err("there is a comma, after an instruction/directive/define");
            }
            let token = match scanner.take_word() {
                Some(w) => w,
                None => return err("missing operand"),
            };
            if token.ends_with(':') {
                return err("a label is in an invalid place");
            }
            if !is_valid_identifier(token) {
                return err("the operation type received an operand of an inappropriate type");
            }
            if !scanner.is_exhausted() {
                return err("unexpected characters after operands");
            }
            instruction_ast(
                label,
                mnemonic,
                opcode,
                None,
                Some(Operand::Label(token.to_string())),
            )
        }
        keywords::OperandSlots::DestOnly { no_immediate } => {
            if scanner.skip_commas() > 0 {
                return err("there is a comma, after an instruction/directive/define");
            }
            let token = match scanner.take_word() {
                Some(w) => w,
                None => return err("missing operand"),
            };
            let dest = match parse_operand(token) {
                Ok(op) => op,
                Err(detail) => return err(detail),
            };
            if no_immediate && matches!(dest, Operand::Immediate(_)) {
                return err("the operation type received an operand of an inappropriate type");
            }
            if !scanner.is_exhausted() {
                return err("unexpected characters after operands");
            }
            instruction_ast(label, mnemonic, opcode, None, Some(dest))
        }
        slots @ (keywords::OperandSlots::SourceAndDest
        | keywords::OperandSlots::Both
        | keywords::OperandSlots::LeaSourceAndDest) => {
            if scanner.skip_commas() > 0 {
                return err("there is a comma, after an instruction/directive/define");
            }
            let first = match scanner.take_word() {
                Some(w) => w,
                None => return err("missing operand"),
            };
            let source = match parse_operand(first) {
                Ok(op) => op,
                Err(detail) => return err(detail),
            };

            let commas = scanner.skip_commas();
            if scanner.is_exhausted() {
                return err("missing operand");
            }
            if commas == 0 {
                return err("missing operand");
            }
            if commas > 1 {
                return err("multiple commas between 2 operands");
            }

            let second = match scanner.take_word() {
                Some(w) => w,
                None => return err("missing operand"),
            };
            let dest = match parse_operand(second) {
                Ok(op) => op,
                Err(detail) => return err(detail),
            };

            if matches!(slots, keywords::OperandSlots::LeaSourceAndDest)
                && !matches!(source, Operand::Label(_) | Operand::Indexed { .. })
            {
                return err("the operation type received an operand of an inappropriate type");
            }
            let dest_no_immediate = !matches!(slots, keywords::OperandSlots::Both);
            if dest_no_immediate && matches!(dest, Operand::Immediate(_)) {
                return err("the operation type received an operand of an inappropriate type");
            }

            if !scanner.is_exhausted() {
                return err("unexpected characters after operands");
            }
            instruction_ast(label, mnemonic, opcode, Some(source), Some(dest))
        }
    }
}

fn instruction_ast(
    label: Option<String>,
    mnemonic: &str,
    opcode: u8,
    source: Option<Operand>,
    dest: Option<Operand>,
) -> LineAst {
    LineAst::Instruction {
        label,
        instruction: Instruction {
            mnemonic: mnemonic.to_string(),
            opcode,
            source,
            dest,
        },
    }
}

/// How many 14-bit words this instruction occupies (spec.md §4.3.1), shared
/// by the first pass (to advance `ic`) and the second pass (to know how
/// many operand words to emit).
pub fn instruction_word_count(instruction: &Instruction) -> i32 {
    if keywords::operand_slots_of(&instruction.mnemonic) == keywords::OperandSlots::None {
        return 1;
    }
    if let (Some(Operand::Register(_)), Some(Operand::Register(_))) =
        (&instruction.source, &instruction.dest)
    {
        return 2;
    }
    let mut words = 1;
    for operand in [&instruction.source, &instruction.dest].into_iter().flatten() {
        words += match operand {
            Operand::Indexed { .. } => 2,
            _ => 1,
        };
    }
    words
}

/// Words a `.data`/`.string` directive contributes to `dc` (spec.md
/// §4.3.1); `.entry`/`.extern` always contribute zero.
pub fn directive_word_count(directive: &Directive) -> i32 {
    match directive {
        Directive::Data(items) => items.len() as i32,
        Directive::Str(s) => s.chars().count() as i32 + 1,
        Directive::Entry(_) | Directive::Extern(_) => 0,
    }
}
