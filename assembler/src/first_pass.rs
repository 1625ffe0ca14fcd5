//! First pass (spec.md §4.3): streams the expanded `.am` lines, builds the
//! symbol table, and advances `ic`/`dc` far enough to know every symbol's
//! final address without yet knowing the instruction/data words themselves.

use std::collections::HashSet;

use crate::error::{Diagnostic, Outcome, ALLOCATION_FAILURE};
use crate::parser::{directive_word_count, instruction_word_count, parse_line, Directive, LineAst};
use crate::symbol::SymbolKind;
use crate::translation_unit::TranslationUnit;

pub struct FirstPassResult {
    pub unit: TranslationUnit,
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: Outcome,
}

const MACRO_COLLISION: &str = "redefining a name for a macro and symbol";
const SYMBOL_REDEFINITION: &str = "redefenition of symbol";

pub fn run(file: &str, am_lines: &[String], macro_names: &HashSet<String>) -> FirstPassResult {
    let mut unit = TranslationUnit::new();
    let mut diagnostics = Vec::new();
    let mut had_errors = false;

    for (idx, line_text) in am_lines.iter().enumerate() {
        let line_num = (idx + 1) as u32;
        match parse_line(line_text) {
            LineAst::Empty | LineAst::Note => {}
            LineAst::Error { detail } => {
                if detail == ALLOCATION_FAILURE {
                    return FirstPassResult {
                        unit,
                        diagnostics,
                        outcome: Outcome::Fatal,
                    };
                }
                diagnostics.push(Diagnostic::line_level(file, line_num, detail));
                had_errors = true;
            }
            LineAst::ConstantDef { name, value } => {
                if macro_names.contains(&name) {
                    diagnostics.push(Diagnostic::line_level(file, line_num, MACRO_COLLISION));
                    had_errors = true;
                } else if unit.symbol_table.contains(&name) {
                    diagnostics.push(Diagnostic::line_level(file, line_num, SYMBOL_REDEFINITION));
                    had_errors = true;
                } else {
                    unit.symbol_table
                        .insert(name, SymbolKind::Const, line_num as i32, value as i32);
                }
            }
            LineAst::Directive { label, directive } => {
                let is_entry_or_extern =
                    matches!(directive, Directive::Entry(_) | Directive::Extern(_));
                if !is_entry_or_extern {
                    handle_label(
                        label.as_deref(),
                        false,
                        macro_names,
                        &mut unit,
                        file,
                        line_num,
                        &mut diagnostics,
                        &mut had_errors,
                    );
                }
                match &directive {
                    Directive::Data(_) | Directive::Str(_) => {
                        unit.advance_dc(directive_word_count(&directive));
                    }
                    Directive::Entry(name) => handle_entry(
                        name,
                        macro_names,
                        &mut unit,
                        file,
                        line_num,
                        &mut diagnostics,
                        &mut had_errors,
                    ),
                    Directive::Extern(name) => handle_extern(
                        name,
                        macro_names,
                        &mut unit,
                        file,
                        line_num,
                        &mut diagnostics,
                        &mut had_errors,
                    ),
                }
            }
            LineAst::Instruction { label, instruction } => {
                handle_label(
                    label.as_deref(),
                    true,
                    macro_names,
                    &mut unit,
                    file,
                    line_num,
                    &mut diagnostics,
                    &mut had_errors,
                );
                unit.advance_ic(instruction_word_count(&instruction));
            }
        }
    }

    finalize(&mut unit, file, &mut diagnostics, &mut had_errors);

    FirstPassResult {
        unit,
        diagnostics,
        outcome: if had_errors {
            Outcome::HadErrors
        } else {
            Outcome::Ok
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_label(
    label: Option<&str>,
    is_instruction_line: bool,
    macro_names: &HashSet<String>,
    unit: &mut TranslationUnit,
    file: &str,
    line_num: u32,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    let Some(name) = label else { return };

    if macro_names.contains(name) {
        diagnostics.push(Diagnostic::line_level(file, line_num, MACRO_COLLISION));
        *had_errors = true;
        return;
    }

    match unit.symbol_table.get(name).map(|s| s.kind) {
        Some(SymbolKind::EntryPending) => {
            let address = if is_instruction_line { unit.ic } else { unit.dc };
            unit.symbol_table.promote_to_entry(name);
            unit.symbol_table.set_address(name, address);
        }
        Some(_) => {
            diagnostics.push(Diagnostic::line_level(file, line_num, SYMBOL_REDEFINITION));
            *had_errors = true;
        }
        None => {
            let (kind, address) = if is_instruction_line {
                (SymbolKind::Inst, unit.ic)
            } else {
                (SymbolKind::Data, unit.dc)
            };
            unit.symbol_table.insert(name, kind, address, 0);
        }
    }
}

fn handle_entry(
    name: &str,
    macro_names: &HashSet<String>,
    unit: &mut TranslationUnit,
    file: &str,
    line_num: u32,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    if macro_names.contains(name) {
        diagnostics.push(Diagnostic::line_level(file, line_num, MACRO_COLLISION));
        *had_errors = true;
        return;
    }
    match unit.symbol_table.get(name).map(|s| s.kind) {
        Some(SymbolKind::Data) | Some(SymbolKind::Inst) => unit.symbol_table.promote_to_entry(name),
        Some(SymbolKind::EntryPending) => {}
        Some(_) => {
            diagnostics.push(Diagnostic::line_level(file, line_num, SYMBOL_REDEFINITION));
            *had_errors = true;
        }
        None => unit
            .symbol_table
            .insert(name, SymbolKind::EntryPending, 0, 0),
    }
}

fn handle_extern(
    name: &str,
    macro_names: &HashSet<String>,
    unit: &mut TranslationUnit,
    file: &str,
    line_num: u32,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    if macro_names.contains(name) {
        diagnostics.push(Diagnostic::line_level(file, line_num, MACRO_COLLISION));
        *had_errors = true;
        return;
    }
    if unit.symbol_table.contains(name) {
        diagnostics.push(Diagnostic::line_level(file, line_num, SYMBOL_REDEFINITION));
        *had_errors = true;
        return;
    }
    unit.symbol_table.insert(name, SymbolKind::Extern, 0, 0);
}

/// spec.md §4.3 "After streaming all lines": flag any still-unresolved
/// `.entry`, relocate data symbols by the final `ic`, then build the
/// entries list from the now-final addresses.
fn finalize(
    unit: &mut TranslationUnit,
    file: &str,
    diagnostics: &mut Vec<Diagnostic>,
    had_errors: &mut bool,
) {
    for symbol in unit.symbol_table.iter() {
        if symbol.kind == SymbolKind::EntryPending {
            diagnostics.push(Diagnostic::file_level(
                file,
                format!(
                    "{} defined as an entry but did not receive a value",
                    symbol.name
                ),
            ));
            *had_errors = true;
        }
    }

    let ic = unit.ic;
    for symbol in unit.symbol_table.iter_mut() {
        if matches!(symbol.kind, SymbolKind::Data | SymbolKind::DataEntry) {
            symbol.address += ic;
        }
    }

    let names_and_addresses: Vec<(String, i32)> = unit
        .symbol_table
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::DataEntry | SymbolKind::InstEntry))
        .map(|s| (s.name.clone(), s.address))
        .collect();
    for (name, address) in names_and_addresses {
        unit.entries.prepend(name, address);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(source: &str) -> Vec<String> {
        source.lines().map(|s| s.to_string()).collect()
    }

    #[test]
    fn simple_data_label_gets_relocated_by_final_ic() {
        let src = lines("STR: .string \"ab\"\nhlt");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::Ok);
        let sym = result.unit.symbol_table.get("STR").unwrap();
        assert_eq!(sym.kind, SymbolKind::Data);
        // 2 chars + NUL = 3 data words; one hlt = 1 instruction word.
        assert_eq!(sym.address, 101);
    }

    #[test]
    fn entry_before_definition_is_promoted_and_addressed() {
        let src = lines(".entry STR\nSTR: .string \"ab\"");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::Ok);
        let sym = result.unit.symbol_table.get("STR").unwrap();
        assert_eq!(sym.kind, SymbolKind::DataEntry);
        assert_eq!(sym.address, 100);
        assert_eq!(result.unit.entries.iter().collect::<Vec<_>>(), vec![&("STR".to_string(), 100)]);
    }

    #[test]
    fn entry_after_definition_promotes_existing_symbol() {
        let src = lines("LOOP: hlt\n.entry LOOP");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::Ok);
        assert_eq!(result.unit.symbol_table.get("LOOP").unwrap().kind, SymbolKind::InstEntry);
    }

    #[test]
    fn entry_never_defined_is_an_error() {
        let src = lines(".entry GHOST");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::HadErrors);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.detail == "defined as an entry but did not receive a value"));
    }

    #[test]
    fn redefining_a_label_is_an_error() {
        let src = lines("LOOP: hlt\nLOOP: hlt");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::HadErrors);
        assert!(result.diagnostics.iter().any(|d| d.detail == SYMBOL_REDEFINITION));
    }

    #[test]
    fn label_colliding_with_a_macro_name_is_an_error() {
        let mut macro_names = HashSet::new();
        macro_names.insert("M".to_string());
        let src = lines("M: hlt");
        let result = run("f", &src, &macro_names);
        assert_eq!(result.outcome, Outcome::HadErrors);
        assert!(result.diagnostics.iter().any(|d| d.detail == MACRO_COLLISION));
    }

    #[test]
    fn extern_then_redeclared_extern_is_an_error() {
        let src = lines(".extern EXT\n.extern EXT");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::HadErrors);
    }

    #[test]
    fn constant_definition_is_recorded_with_its_line_number() {
        let src = lines(".define SZ = 5\nhlt");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::Ok);
        let sym = result.unit.symbol_table.get("SZ").unwrap();
        assert_eq!(sym.kind, SymbolKind::Const);
        assert_eq!(sym.value, 5);
        assert_eq!(sym.address, 1);
    }

    #[test]
    fn a_per_line_parse_error_does_not_stop_the_stream() {
        let src = lines("frobnicate\nhlt");
        let result = run("f", &src, &HashSet::new());
        assert_eq!(result.outcome, Outcome::HadErrors);
        assert_eq!(result.unit.ic, 101);
    }
}
