//! Second pass (spec.md §4.4): re-parses the same `.am` lines and emits the
//! 14-bit instruction/data words into the images at the positions the
//! first pass already measured out, resolving every operand against the
//! symbol table the first pass built.

use crate::error::{Diagnostic, Outcome};
use crate::parser::{
    parse_line, DataOperand, Directive, ImmediateValue, IndexValue, Instruction, LineAst, Operand,
};
use crate::symbol::{SymbolKind, SymbolTable};
use crate::translation_unit::TranslationUnit;
use crate::word::{
    data_word, opcode_word, register_dest_word, register_pair_word, register_source_word,
    value_word, AddressingMode, Are,
};

const LABEL_UNDEFINED: &str = "using a label that was not defined in the file";
const CONSTANT_UNDEFINED: &str = "using a constant that was not defined in the file";
const CONSTANT_USED_EARLY: &str = "using a constant whose definition is done at a later stage in the file";

pub struct SecondPassResult {
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: Outcome,
}

#[derive(Clone, Copy)]
enum Role {
    Source,
    Dest,
}

pub fn run(file: &str, am_lines: &[String], unit: &mut TranslationUnit) -> SecondPassResult {
    let mut diagnostics = Vec::new();
    let mut had_errors = false;

    for (idx, line_text) in am_lines.iter().enumerate() {
        let line_num = (idx + 1) as u32;
        match parse_line(line_text) {
            LineAst::Empty
            | LineAst::Note
            | LineAst::ConstantDef { .. }
            | LineAst::Directive {
                directive: Directive::Entry(_) | Directive::Extern(_),
                ..
            } => {}
            LineAst::Error { .. } => {
                debug_assert!(
                    false,
                    "first pass already guarantees every line parses cleanly here"
                );
            }
            LineAst::Directive {
                directive: Directive::Data(items),
                ..
            } => {
                for item in items {
                    match resolve_data_value(&item, line_num, &unit.symbol_table) {
                        Ok(value) => unit.push_data_word(data_word(value)),
                        Err(detail) => {
                            diagnostics.push(Diagnostic::line_level(file, line_num, detail));
                            had_errors = true;
                            unit.push_data_word(data_word(0));
                        }
                    }
                }
            }
            LineAst::Directive {
                directive: Directive::Str(s),
                ..
            } => {
                for c in s.chars() {
                    unit.push_data_word(data_word(c as i32));
                }
                unit.push_data_word(data_word(0));
            }
            LineAst::Instruction { instruction, .. } => {
                encode_instruction(
                    &instruction,
                    unit,
                    file,
                    line_num,
                    &mut diagnostics,
                    &mut had_errors,
                );
            }
        }
    }

    SecondPassResult {
        diagnostics,
        outcome: if had_errors {
            Outcome::HadErrors
        } else {
            Outcome::Ok
        },
    }
}

fn resolve_data_value(
    item: &DataOperand,
    current_line: u32,
    symbols: &SymbolTable,
) -> Result<i32, &'static str> {
    match item {
        DataOperand::Number(n) => Ok(*n as i32),
        DataOperand::Constant(name) => resolve_constant(name, current_line, symbols),
    }
}

fn resolve_constant(name: &str, current_line: u32, symbols: &SymbolTable) -> Result<i32, &'static str> {
    match symbols.get(name) {
        Some(symbol) if symbol.kind == SymbolKind::Const => {
            if symbol.address < current_line as i32 {
                Ok(symbol.value)
            } else {
                Err(CONSTANT_USED_EARLY)
            }
        }
        _ => Err(CONSTANT_UNDEFINED),
    }
}

fn addressing_mode_of(operand: &Option<Operand>) -> AddressingMode {
    match operand {
        None => AddressingMode::Immediate,
        Some(Operand::Immediate(_)) => AddressingMode::Immediate,
        Some(Operand::Label(_)) => AddressingMode::Direct,
        Some(Operand::Indexed { .. }) => AddressingMode::Indexed,
        Some(Operand::Register(_)) => AddressingMode::Register,
    }
}

fn encode_instruction(
    instruction: &Instruction,
    unit: &mut TranslationUnit,
    file: &str,
    line_num: u32,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    let src_mode = addressing_mode_of(&instruction.source);
    let dest_mode = addressing_mode_of(&instruction.dest);
    unit.push_instruction_word(opcode_word(instruction.opcode, src_mode, dest_mode));

    if let (Some(Operand::Register(src)), Some(Operand::Register(dest))) =
        (&instruction.source, &instruction.dest)
    {
        unit.push_instruction_word(register_pair_word(*src, *dest));
        return;
    }

    if let Some(source) = &instruction.source {
        emit_operand(source, Role::Source, unit, file, line_num, diagnostics, had_errors);
    }
    if let Some(dest) = &instruction.dest {
        emit_operand(dest, Role::Dest, unit, file, line_num, diagnostics, had_errors);
    }
}

fn emit_operand(
    operand: &Operand,
    role: Role,
    unit: &mut TranslationUnit,
    file: &str,
    line_num: u32,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    match operand {
        Operand::Register(reg) => {
            let word = match role {
                Role::Source => register_source_word(*reg),
                Role::Dest => register_dest_word(*reg),
            };
            unit.push_instruction_word(word);
        }
        Operand::Immediate(ImmediateValue::Number(n)) => {
            unit.push_instruction_word(value_word(Are::Absolute, *n));
        }
        Operand::Immediate(ImmediateValue::Constant(name)) => {
            match resolve_constant(name, line_num, &unit.symbol_table) {
                Ok(value) => unit.push_instruction_word(value_word(Are::Absolute, value as i16)),
                Err(detail) => {
                    diagnostics.push(Diagnostic::line_level(file, line_num, detail));
                    *had_errors = true;
                    unit.push_instruction_word(value_word(Are::Absolute, 0));
                }
            }
        }
        Operand::Label(name) => {
            emit_label_word(name, unit, file, line_num, diagnostics, had_errors);
        }
        Operand::Indexed { label, index } => {
            emit_label_word(label, unit, file, line_num, diagnostics, had_errors);
            match index {
                IndexValue::Number(n) => {
                    unit.push_instruction_word(value_word(Are::Absolute, *n));
                }
                IndexValue::Constant(name) => {
                    match resolve_constant(name, line_num, &unit.symbol_table) {
                        Ok(value) => {
                            unit.push_instruction_word(value_word(Are::Absolute, value as i16))
                        }
                        Err(detail) => {
                            diagnostics.push(Diagnostic::line_level(file, line_num, detail));
                            *had_errors = true;
                            unit.push_instruction_word(value_word(Are::Absolute, 0));
                        }
                    }
                }
            }
        }
    }
}

fn emit_label_word(
    name: &str,
    unit: &mut TranslationUnit,
    file: &str,
    line_num: u32,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    let reference_address = unit.ic;
    match unit.symbol_table.get(name).map(|s| (s.kind, s.address)) {
        Some((SymbolKind::Extern, _)) => {
            unit.push_instruction_word(value_word(Are::External, 0));
            unit.externals.record(name.to_string(), reference_address);
            unit.external_count += 1;
        }
        Some((
            SymbolKind::Data | SymbolKind::DataEntry | SymbolKind::Inst | SymbolKind::InstEntry,
            address,
        )) => {
            unit.push_instruction_word(value_word(Are::Relocatable, address as i16));
        }
        _ => {
            diagnostics.push(Diagnostic::line_level(file, line_num, LABEL_UNDEFINED));
            *had_errors = true;
            unit.push_instruction_word(value_word(Are::Absolute, 0));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::first_pass;
    use std::collections::HashSet;

    fn assemble(source: &str) -> (TranslationUnit, SecondPassResult) {
        let lines: Vec<String> = source.lines().map(|s| s.to_string()).collect();
        let first = first_pass::run("f", &lines, &HashSet::new());
        assert_eq!(first.outcome, Outcome::Ok, "first pass diagnostics: {:?}", first
            .diagnostics
            .iter()
            .map(|d| &d.detail)
            .collect::<Vec<_>>());
        let mut unit = first.unit;
        let second = run("f", &lines, &mut unit);
        (unit, second)
    }

    #[test]
    fn two_hlt_instructions() {
        let (unit, result) = assemble("hlt\nhlt");
        assert_eq!(result.outcome, Outcome::Ok);
        assert_eq!(unit.instruction_image.len(), 2);
        assert_eq!(unit.ic, 102);
    }

    #[test]
    fn string_directive_emits_chars_and_trailing_zero() {
        let (unit, result) = assemble("STR: .string \"ab\"\nhlt");
        assert_eq!(result.outcome, Outcome::Ok);
        assert_eq!(unit.data_image, vec![97, 98, 0]);
    }

    #[test]
    fn external_reference_records_its_address() {
        let (unit, result) = assemble(".extern EXT\nmov EXT, r1\nhlt");
        assert_eq!(result.outcome, Outcome::Ok);
        let refs: Vec<_> = unit.externals.iter().collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "EXT");
        assert_eq!(refs[0].addresses, vec![101]);
        assert_eq!(unit.external_count, 1);
    }

    #[test]
    fn external_count_tracks_every_reference_site_not_just_distinct_symbols() {
        let (unit, result) = assemble(".extern EXT\nmov EXT, EXT\nhlt");
        assert_eq!(result.outcome, Outcome::Ok);
        assert_eq!(unit.external_count, 2);
        assert_eq!(unit.externals.iter().count(), 1);
    }

    #[test]
    fn register_pair_shares_a_single_extra_word() {
        let (unit, result) = assemble("mov r1, r2");
        assert_eq!(result.outcome, Outcome::Ok);
        assert_eq!(unit.instruction_image.len(), 2);
    }

    #[test]
    fn forward_constant_use_is_an_error() {
        let (_, result) = assemble("mov #K, r0\n.define K = 7\nhlt");
        assert_eq!(result.outcome, Outcome::HadErrors);
        assert!(result.diagnostics.iter().any(|d| d.detail == CONSTANT_USED_EARLY));
    }

    #[test]
    fn undefined_constant_is_an_error() {
        let (_, result) = assemble("mov #K, r0\nhlt");
        assert_eq!(result.outcome, Outcome::HadErrors);
        assert!(result.diagnostics.iter().any(|d| d.detail == CONSTANT_UNDEFINED));
    }

    #[test]
    fn indexed_operand_with_constant_index() {
        let (unit, result) = assemble(".define I = 1\nARR: .data 10, 20, 30\nmov ARR[I], r1\nhlt");
        assert_eq!(result.outcome, Outcome::Ok);
        // opcode word + label word + index word = 3 instruction words for mov.
        assert_eq!(unit.instruction_image.len(), 4);
    }
}
