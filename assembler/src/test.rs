//! End-to-end pipeline tests, one per scenario worked through by hand in
//! spec.md §8, plus real filesystem round trips through
//! [`crate::assemble_file`].

use crate::error::Outcome;
use crate::{assemble, assemble_file};
use std::fs;

#[test]
fn empty_source_emits_header_only() {
    let out = assemble("foo.as", "");
    assert_eq!(out.outcome, Outcome::Ok);
    assert_eq!(out.am_text.as_deref(), Some(""));
    assert_eq!(out.object_text.as_deref(), Some("  0 0\n"));
    assert!(out.entries_text.is_none());
    assert!(out.externals_text.is_none());
}

#[test]
fn constant_and_data_scenario() {
    let source = ".define SZ = 5\nSTR: .string \"ab\"\n.entry STR\n";
    let out = assemble("foo.as", source);
    assert_eq!(out.outcome, Outcome::Ok);

    let object = out.object_text.expect("object file expected");
    let mut lines = object.lines();
    assert_eq!(lines.next(), Some("  100 3"));
    assert_eq!(lines.count(), 3);

    assert_eq!(out.entries_text.as_deref(), Some("STR\t0100\n"));
    assert!(out.externals_text.is_none());
}

#[test]
fn macro_expansion_scenario() {
    let source = "mcr M\n  hlt\nendmcr\nM\nM\n";
    let out = assemble("foo.as", source);
    assert_eq!(out.outcome, Outcome::Ok);
    assert_eq!(out.am_text.as_deref(), Some("  hlt\n  hlt\n"));

    let object = out.object_text.expect("object file expected");
    assert_eq!(object.lines().next(), Some("  102 0"));
}

#[test]
fn external_reference_scenario() {
    let source = ".extern EXT\nmov EXT, r1\nhlt\n";
    let out = assemble("foo.as", source);
    assert_eq!(out.outcome, Outcome::Ok);
    assert_eq!(out.externals_text.as_deref(), Some("EXT\t0101\n"));

    let object = out.object_text.expect("object file expected");
    // header + (mov opcode, EXT operand, r1 operand) + hlt opcode.
    assert_eq!(object.lines().count(), 5);
}

#[test]
fn indexed_register_operand_is_rejected() {
    let source = "ARR: .data 10,20,30\nmov ARR[r0], r1\n";
    let out = assemble("foo.as", source);
    assert_eq!(out.outcome, Outcome::HadErrors);
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.detail == "the operation type received an operand of an inappropriate type"));
    assert!(out.object_text.is_none());
}

#[test]
fn forward_constant_use_scenario() {
    let source = "mov #K, r0\n.define K = 7\n";
    let out = assemble("foo.as", source);
    assert_eq!(out.outcome, Outcome::HadErrors);
    assert!(out.diagnostics.iter().any(|d| d
        .detail
        .contains("using a constant whose definition is done at a later stage")));
    assert!(out.object_text.is_none());
}

#[test]
fn assemble_file_writes_expected_outputs_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("foo");
    fs::write(stem.with_extension("as"), ".extern EXT\nmov EXT, r1\nhlt\n").unwrap();

    let report = assemble_file(&stem).unwrap();
    assert_eq!(report.outcome, Outcome::Ok);
    assert!(report.diagnostics.is_empty());

    assert!(stem.with_extension("am").exists());
    assert!(stem.with_extension("ob").exists());
    assert!(stem.with_extension("ext").exists());
    assert!(!stem.with_extension("ent").exists());

    let ext_contents = fs::read_to_string(stem.with_extension("ext")).unwrap();
    assert_eq!(ext_contents, "EXT\t0101\n");
}

#[test]
fn assemble_file_removes_a_stale_am_when_the_macro_stage_fails() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("foo");
    fs::write(stem.with_extension("am"), "leftover from a previous run\n").unwrap();
    fs::write(stem.with_extension("as"), "endmcr\n").unwrap();

    let report = assemble_file(&stem).unwrap();
    assert_eq!(report.outcome, Outcome::HadErrors);
    assert!(!stem.with_extension("am").exists());
    assert!(!stem.with_extension("ob").exists());
}

#[test]
fn assemble_file_reports_read_errors_for_a_missing_stem() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("does_not_exist");
    assert!(assemble_file(&stem).is_err());
}
