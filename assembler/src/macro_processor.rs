//! Macro pre-processor (spec.md §4.2): streams a `.as` source line-by-line,
//! recognizes `mcr NAME … endmcr` definitions, and splices the stored body
//! of a macro verbatim at every invocation site.
//!
//! Unlike the first/second pass, a macro-stage error is never recoverable
//! per-line: spec.md §4.2 "Failure modes & cleanup" has the whole stage
//! stop at the first error and hand back a sentinel telling the caller to
//! skip the file, so [`expand`] returns as soon as one is found instead of
//! accumulating diagnostics the way [`crate::first_pass`]/[`crate::second_pass`] do.

use std::collections::HashSet;

use crate::lexer::Scanner;
use crate::parser::is_valid_identifier;

/// Longest permitted line, terminator excluded (spec.md §4.2 "Validates
/// line length ≤ 80 characters").
pub const MAX_LINE_LENGTH: usize = 80;

pub struct MacroDiagnostic {
    pub line: u32,
    pub detail: String,
}

pub struct MacroExpansion {
    pub am_text: String,
    /// Every defined macro name, carried forward so the first pass can
    /// still reject collisions with them (spec.md §4.3 steps 2, 4, 5, 6)
    /// even though the macro bodies themselves are discarded here
    /// (spec.md §3 "Macro... live for the pre-processing of one file").
    pub macro_names: HashSet<String>,
}

struct Macro {
    body: Vec<String>,
}

enum State {
    Normal,
    Recording { name: String, body: Vec<String> },
}

pub fn expand(source: &str) -> Result<MacroExpansion, MacroDiagnostic> {
    let mut macros: indexmap::IndexMap<String, Macro> = indexmap::IndexMap::new();
    let mut state = State::Normal;
    let mut output_lines: Vec<String> = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_num = (idx + 1) as u32;
        let line = raw_line.trim_end_matches('\r');
        if line.chars().count() > MAX_LINE_LENGTH {
            return Err(MacroDiagnostic {
                line: line_num,
                detail: "the line is too long".to_string(),
            });
        }

        let is_comment = line.trim_start().starts_with(';');

        match &mut state {
            State::Normal => {
                if is_comment {
                    output_lines.push(line.to_string());
                    continue;
                }
                let mut scanner = Scanner::new(line);
                let first = scanner.take_word();
                match first {
                    Some("mcr") => {
                        let name = parse_macro_header(&mut scanner, &macros, line_num)?;
                        state = State::Recording {
                            name,
                            body: Vec::new(),
                        };
                    }
                    Some("endmcr") => {
                        return Err(MacroDiagnostic {
                            line: line_num,
                            detail: "endmcr without mcr".to_string(),
                        });
                    }
                    Some(name) if macros.contains_key(name) => {
                        output_lines.extend(macros[name].body.iter().cloned());
                    }
                    _ => output_lines.push(line.to_string()),
                }
            }
            State::Recording { name, body } => {
                if !is_comment {
                    let mut scanner = Scanner::new(line);
                    match scanner.take_word() {
                        Some("mcr") => {
                            return Err(MacroDiagnostic {
                                line: line_num,
                                detail: "a macro definition cannot be nested inside another macro definition".to_string(),
                            });
                        }
                        Some("endmcr") => {
                            if !scanner.is_exhausted() {
                                return Err(MacroDiagnostic {
                                    line: line_num,
                                    detail: "endmcr must not be followed by any other text".to_string(),
                                });
                            }
                            let name = name.clone();
                            let body = std::mem::take(body);
                            macros.insert(name, Macro { body });
                            state = State::Normal;
                            continue;
                        }
                        _ => {}
                    }
                }
                body.push(line.to_string());
            }
        }
    }

    if let State::Recording { name, .. } = &state {
        return Err(MacroDiagnostic {
            line: (source.lines().count()) as u32,
            detail: format!("macro \"{}\" is missing its endmcr", name),
        });
    }

    let mut am_text = output_lines.join("\n");
    if !output_lines.is_empty() {
        am_text.push('\n');
    }

    Ok(MacroExpansion {
        am_text,
        macro_names: macros.keys().cloned().collect(),
    })
}

fn parse_macro_header(
    scanner: &mut Scanner,
    macros: &indexmap::IndexMap<String, Macro>,
    line_num: u32,
) -> Result<String, MacroDiagnostic> {
    let name = scanner.take_word().ok_or_else(|| MacroDiagnostic {
        line: line_num,
        detail: "a macro definition must be followed by exactly one name".to_string(),
    })?;
    if !scanner.is_exhausted() {
        return Err(MacroDiagnostic {
            line: line_num,
            detail: "a macro definition must be followed by exactly one name".to_string(),
        });
    }
    if !is_valid_identifier(name) || macros.contains_key(name) {
        return Err(MacroDiagnostic {
            line: line_num,
            detail: "a macro name must not collide with a directive, instruction, or macro name"
                .to_string(),
        });
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    fn expand_ok(source: &str) -> MacroExpansion {
        match expand(source) {
            Ok(e) => e,
            Err(d) => panic!("expected success, got error at line {}: {}", d.line, d.detail),
        }
    }

    #[test]
    fn passthrough_with_no_macros() {
        let e = expand_ok("mov r1, r2\nhlt\n");
        assert_eq!(e.am_text, "mov r1, r2\nhlt\n");
        assert!(e.macro_names.is_empty());
    }

    #[test]
    fn defines_and_splices_a_macro_body() {
        let source = "mcr M\n  hlt\nendmcr\nM\nM\n";
        let e = expand_ok(source);
        assert_eq!(e.am_text, "  hlt\n  hlt\n");
        assert!(e.macro_names.contains("M"));
    }

    #[test]
    fn comment_lines_pass_through_in_normal_state() {
        let e = expand_ok("; a comment\nhlt\n");
        assert_eq!(e.am_text, "; a comment\nhlt\n");
    }

    #[test]
    fn comment_lines_become_part_of_the_body_while_recording() {
        let source = "mcr M\n; inside body\nendmcr\nM\n";
        let e = expand_ok(source);
        assert_eq!(e.am_text, "; inside body\n");
    }

    #[test]
    fn invocation_inside_a_body_is_stored_but_not_expanded() {
        let source = "mcr A\n  hlt\nendmcr\nmcr B\nA\nendmcr\nB\n";
        let e = expand_ok(source);
        // B's stored body literally contains the text "A" — expansion does
        // not recurse (spec.md §4.2), so the output keeps that line as-is.
        assert_eq!(e.am_text, "A\n");
    }

    #[test]
    fn endmcr_without_mcr_is_an_error() {
        let err = expand("endmcr\n").unwrap_err();
        assert_eq!(err.detail, "endmcr without mcr");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn nested_mcr_is_rejected() {
        let err = expand("mcr A\nmcr B\nendmcr\nendmcr\n").unwrap_err();
        assert_eq!(
            err.detail,
            "a macro definition cannot be nested inside another macro definition"
        );
    }

    #[test]
    fn macro_header_needs_exactly_one_name() {
        let err = expand("mcr\nendmcr\n").unwrap_err();
        assert_eq!(
            err.detail,
            "a macro definition must be followed by exactly one name"
        );
        let err = expand("mcr A B\nendmcr\n").unwrap_err();
        assert_eq!(
            err.detail,
            "a macro definition must be followed by exactly one name"
        );
    }

    #[test]
    fn macro_name_cannot_collide_with_a_mnemonic() {
        let err = expand("mcr mov\nendmcr\n").unwrap_err();
        assert_eq!(
            err.detail,
            "a macro name must not collide with a directive, instruction, or macro name"
        );
    }

    #[test]
    fn macro_name_cannot_be_redefined() {
        let err = expand("mcr A\nendmcr\nmcr A\nendmcr\n").unwrap_err();
        assert_eq!(
            err.detail,
            "a macro name must not collide with a directive, instruction, or macro name"
        );
    }

    #[test]
    fn line_longer_than_budget_is_fatal() {
        let long_line = "a".repeat(81);
        let err = expand(&long_line).unwrap_err();
        assert_eq!(err.detail, "the line is too long");
    }

    #[test]
    fn unterminated_macro_is_an_error() {
        let err = expand("mcr A\n  hlt\n").unwrap_err();
        assert!(err.detail.contains("endmcr"));
    }
}
