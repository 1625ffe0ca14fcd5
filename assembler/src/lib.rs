//! Two-pass assembler and macro pre-processor for a 14-bit word machine.
//!
//! The pipeline is four stages run in order over one input file: macro
//! expansion ([`macro_processor`]), the first pass ([`first_pass`]) that
//! builds the symbol table and measures out addresses, the second pass
//! ([`second_pass`]) that encodes every word, and emission ([`emit`]) that
//! serializes the result to the `.ob`/`.ent`/`.ext` text formats.
//!
//! [`assemble`] runs the whole pipeline against in-memory source text and
//! never touches the filesystem; [`assemble_file`] is the thin driver the
//! binary (`src/main.rs`) uses to read a `.as` stem and write its outputs.
//! Neither function prints anything — every stage reports through
//! [`error::Outcome`] and [`error::Diagnostic`], matching the teacher's own
//! split between `vasm::assemble` and its CLI wrapper.

pub mod error;
mod keywords;
mod lexer;
pub mod parser;
pub mod symbol;
pub mod translation_unit;
pub mod word;

mod emit;
mod first_pass;
mod macro_processor;
mod second_pass;

#[cfg(test)]
mod test;

use std::fs;
use std::path::Path;

use error::{AssemblerError, Diagnostic, Outcome, Result};
use translation_unit::TranslationUnit;

/// Everything [`assemble`] produced for one source file, purely in memory.
pub struct AssembleOutput {
    /// The expanded `.am` text, or `None` if macro expansion itself failed
    /// (spec.md §4.2: on a macro-stage error nothing downstream runs and
    /// any existing `.am` file must be removed, not left stale).
    pub am_text: Option<String>,
    pub object_text: Option<String>,
    pub entries_text: Option<String>,
    pub externals_text: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: Outcome,
}

/// Runs the full pipeline against `source`, named `file` for diagnostics.
///
/// `file` is only ever used to label [`Diagnostic`]s; this function performs
/// no I/O of its own.
pub fn assemble(file: &str, source: &str) -> AssembleOutput {
    let expansion = match macro_processor::expand(source) {
        Ok(expansion) => expansion,
        Err(diag) => {
            return AssembleOutput {
                am_text: None,
                object_text: None,
                entries_text: None,
                externals_text: None,
                diagnostics: vec![Diagnostic::line_level(file, diag.line, diag.detail)],
                outcome: Outcome::HadErrors,
            };
        }
    };

    let am_lines: Vec<String> = expansion.am_text.lines().map(String::from).collect();

    let first = first_pass::run(file, &am_lines, &expansion.macro_names);
    let mut outcome = first.outcome;
    let mut diagnostics = first.diagnostics;
    let mut unit: TranslationUnit = first.unit;

    if !matches!(outcome, Outcome::Ok) {
        return AssembleOutput {
            am_text: Some(expansion.am_text),
            object_text: None,
            entries_text: None,
            externals_text: None,
            diagnostics,
            outcome,
        };
    }

    let second = second_pass::run(file, &am_lines, &mut unit);
    outcome = outcome.merge(second.outcome);
    diagnostics.extend(second.diagnostics);

    if !matches!(outcome, Outcome::Ok) {
        return AssembleOutput {
            am_text: Some(expansion.am_text),
            object_text: None,
            entries_text: None,
            externals_text: None,
            diagnostics,
            outcome,
        };
    }

    AssembleOutput {
        am_text: Some(expansion.am_text),
        object_text: Some(emit::object_file(&unit)),
        entries_text: emit::entries_file(&unit),
        externals_text: emit::externals_file(&unit),
        diagnostics,
        outcome,
    }
}

/// What [`assemble_file`] reports back to the caller about one stem.
pub struct FileReport {
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: Outcome,
}

/// Reads `<stem>.as`, runs [`assemble`], and writes whichever of
/// `<stem>.am`/`.ob`/`.ent`/`.ext` the result calls for (spec.md §4.5, §6).
///
/// A missing output is not written at all; if a stale `.am` exists from a
/// previous run and this run's macro stage failed, that stale file is
/// removed so it cannot be mistaken for a fresh expansion.
pub fn assemble_file(stem: &Path) -> Result<FileReport> {
    let source_path = stem.with_extension("as");
    let source = fs::read_to_string(&source_path).map_err(AssemblerError::ReadInput)?;

    let file_label = source_path.display().to_string();
    let output = assemble(&file_label, &source);

    match &output.am_text {
        Some(am_text) => {
            fs::write(stem.with_extension("am"), am_text).map_err(AssemblerError::WriteOutput)?;
        }
        None => {
            let am_path = stem.with_extension("am");
            if am_path.exists() {
                fs::remove_file(&am_path).map_err(AssemblerError::WriteOutput)?;
            }
        }
    }

    if let Some(object_text) = &output.object_text {
        fs::write(stem.with_extension("ob"), object_text).map_err(AssemblerError::WriteOutput)?;
    }
    if let Some(entries_text) = &output.entries_text {
        fs::write(stem.with_extension("ent"), entries_text).map_err(AssemblerError::WriteOutput)?;
    }
    if let Some(externals_text) = &output.externals_text {
        fs::write(stem.with_extension("ext"), externals_text)
            .map_err(AssemblerError::WriteOutput)?;
    }

    Ok(FileReport {
        diagnostics: output.diagnostics,
        outcome: output.outcome,
    })
}
