//! Fixture tree lint CLI.
//!
//! # Usage
//!
//! ```bash
//! # Lint the default fixture directory
//! cargo run -p srt-harness --bin srt-fixlint -- --root fixtures
//!
//! # Machine-readable output, warnings fail the build
//! cargo run -p srt-harness --bin srt-fixlint -- --root fixtures --json --strict
//! ```

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use srt_harness::fixlint::{lint_tree, Severity};

/// Static checks over a recorded fixture tree.
#[derive(Parser, Debug)]
#[command(name = "srt-fixlint")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fixture tree root (`<service>/<operation>.requests.json` layout).
    #[arg(short, long, default_value = "fixtures")]
    root: PathBuf,

    /// Output the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Treat warnings as errors.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let report = match lint_tree(&args.root) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error reading fixture tree {}: {e}", args.root.display());
            return ExitCode::from(2);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("error rendering report: {e}");
                return ExitCode::from(2);
            }
        }
    } else {
        println!(
            "checked {} operation(s), {} finding(s)",
            report.operations,
            report.findings.len()
        );
        for finding in &report.findings {
            let tag = match finding.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN ",
            };
            println!(
                "{tag} {} [{}] {}",
                finding.operation, finding.kind, finding.message
            );
        }
    }

    let failed = report.has_errors() || (args.strict && report.has_findings());
    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
