// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use anyhow::Result;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use chumsky::error::{Rich, RichPattern, RichReason};
use clap::{ArgAction, Parser, Subcommand};
use intmachine::Program;
use itertools::Itertools;
use std::borrow::Cow;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

mod amplify;
mod run;
mod search;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Log more details to stderr. Pass twice to log every executed instruction.
    ///
    /// The RUST_LOG environment variable takes precedence if set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Run a single Intcode program
    Run(run::RunArgs),
    /// Run a program as a chain of amplifiers, finding the best phase setting
    #[command(alias = "amp")]
    Amplify(amplify::AmplifyArgs),
    /// Find values for addresses 1 and 2 that make a program leave a target at address 0
    Search(search::SearchArgs),
}

impl Action {
    fn run(&self) -> Result<()> {
        match self {
            Action::Run(run_args) => run_args.run(),
            Action::Amplify(amplify_args) => amplify_args.run(),
            Action::Search(search_args) => search_args.run(),
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Read the program text from `path`, or from stdin if `path` is `-`
fn read_src(path: &Path) -> Result<(Cow<'_, str>, String)> {
    Ok(if path == Path::new("-") {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        ("stdin".into(), s)
    } else {
        (path.as_os_str().to_string_lossy(), fs::read_to_string(path)?)
    })
}

fn report_parse_err(err: &Rich<'_, char>, file: &str, source: &str) {
    let mut builder = Report::build(ReportKind::Error, (file, err.span().into_range()))
        .with_message(format!("Failed to parse {}", file.fg(Color::Red)));

    let message = match (err.reason(), err.found()) {
        (RichReason::Custom(msg), _) => msg.clone(),
        (_, Some(found)) => format!(
            "Found character \'{}\'",
            found.escape_default().fg(Color::Cyan)
        ),
        (_, None) => String::from("Unexpected end of input"),
    };
    builder = builder.with_label(
        Label::new((file, err.span().into_range()))
            .with_message(message)
            .with_color(Color::Yellow),
    );

    let mut expected = err
        .expected()
        // no need to explicitly mention whitespace
        .filter(|pat| !matches!(pat, RichPattern::Label(s) if s.ends_with("whitespace")))
        .collect_vec();

    // make sure that "something else" is the last listed entry
    expected.sort_unstable_by(|&a, &b| {
        use std::cmp::Ordering;
        match (a, b) {
            (RichPattern::SomethingElse, _) => Ordering::Greater,
            (_, RichPattern::SomethingElse) => Ordering::Less,
            (a, b) => a.cmp(b),
        }
    });

    match expected.as_slice() {
        &[] => (),
        &[pat] => {
            builder = builder.with_note(format!("Expected {}", pat.fg(Color::Blue)));
        }
        pats => {
            builder = builder.with_note(format!(
                "Expected one of the following:\n{}",
                pats.iter()
                    .format_with("\n", |p, f| f(&format_args!("- {}", p.fg(Color::Blue))))
            ));
        }
    }

    builder
        .finish()
        .eprint((file, Source::from(source)))
        .unwrap_or_else(|e| panic!("failure to write to stderr: {e}"));
}

/// Parse `src` as a program, reporting any errors against `file`
///
/// On error, prints a report for each problem then [exits][std::process::exit] with exit code 1.
fn checked_parse(file: &str, src: &str) -> Program {
    match Program::parse(src) {
        Ok(program) => program,
        Err(errs) => {
            for err in errs.inner() {
                log::debug!("report_parse_err({err:?}, {file:?}, ...)");
                report_parse_err(err, file, src);
            }
            #[allow(clippy::exit, reason = "explicitly documented in docstring")]
            std::process::exit(1)
        }
    }
}

/// Read and parse the program at `path`, exiting with a report if it doesn't parse
fn load_program(path: &Path) -> Result<Program> {
    let (file, src) = read_src(path)?;
    let program = checked_parse(&file, &src);
    log::debug!("loaded {} integers from {file}", program.len());
    Ok(program)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.action.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::try_parse_from(["intmachine", "search", "-", "--target", "5", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.action, Action::Search(_)));
    }
}
