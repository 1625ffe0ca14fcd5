#[macro_use]
extern crate clap;

use clap::Arg;
use std::path::Path;
use std::process;

use assembler::error::Diagnostic;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("STEM")
                .help("Source file stem(s) to assemble (without the .as extension)")
                .required(true)
                .multiple(true)
                .index(1),
        )
        .get_matches();

    let stems: Vec<&str> = matches.values_of("STEM").unwrap().collect();

    let mut any_failed = false;
    for stem in stems {
        if !run_one(stem) {
            any_failed = true;
        }
    }

    if any_failed {
        process::exit(1);
    }
}

/// Assembles one stem, printing every diagnostic to stderr. Returns `false`
/// if the file could not be read/written or produced any diagnostic.
fn run_one(stem: &str) -> bool {
    let report = match assembler::assemble_file(Path::new(stem)) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{}", err);
            return false;
        }
    };

    for diagnostic in &report.diagnostics {
        print_diagnostic(diagnostic);
    }

    report.outcome.is_ok()
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    eprintln!("{}", diagnostic);
}
