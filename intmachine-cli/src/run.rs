// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Run a single program, with inputs from the command line or from a prompt

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, ValueHint};
use intmachine::io::{InputQueue, OutputPort, PortError, Prompt};
use intmachine::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::load_program;

#[derive(Debug, Parser)]
pub(crate) struct RunArgs {
    /// File containing the program to run, or "-" to read it from stdin
    #[arg(value_name = "PROGRAM", value_hint = ValueHint::FilePath)]
    program: PathBuf,
    /// Provide an input value. Can be passed multiple times, and values are consumed in order.
    #[arg(short, long = "input", value_name = "N", allow_negative_numbers = true)]
    inputs: Vec<i64>,
    /// Write VALUE to address ADDR before running
    #[arg(short = 's', long = "set", value_name = "ADDR=VALUE", value_parser = parse_patch)]
    patches: Vec<(i64, i64)>,
    /// Print the value at ADDR after the program halts
    #[arg(short = 'p', long = "peek", value_name = "ADDR")]
    peeks: Vec<i64>,
    /// Prompt for each input on stdin instead of taking them from --input
    #[arg(short = 'I', long, action = ArgAction::SetTrue, conflicts_with = "inputs")]
    interactive: bool,
    /// Print a trace of every executed instruction to stderr once the program stops
    #[arg(short, long, action = ArgAction::SetTrue)]
    trace: bool,
}

fn parse_patch(s: &str) -> Result<(i64, i64)> {
    let (addr, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ADDR=VALUE, found {s:?}"))?;
    Ok((
        addr.trim().parse().context("invalid address")?,
        value.trim().parse().context("invalid value")?,
    ))
}

/// Writes each output to stdout as soon as it's produced
struct Printer(io::Stdout);

impl OutputPort for Printer {
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError> {
        writeln!(self.0, "{value}")?;
        self.0.flush()?;
        Ok(())
    }
}

impl RunArgs {
    pub(crate) fn run(&self) -> Result<()> {
        let program = load_program(&self.program)?;
        let mut machine = Machine::from_program(&program);
        for &(addr, value) in &self.patches {
            machine
                .poke(addr, value)
                .with_context(|| format!("failed to set address {addr}"))?;
        }

        if self.trace {
            machine.start_trace();
        }

        let mut printer = Printer(io::stdout());
        let outcome = if self.interactive {
            machine.run(&mut Prompt::stdio(), &mut printer)
        } else {
            machine.run(&mut self.inputs.iter().copied().collect::<InputQueue>(), &mut printer)
        };

        if let Some(trace) = machine.end_trace() {
            eprint!("{trace}");
        }

        let state = outcome.with_context(|| {
            format!(
                "machine stopped at pc = {}, rb = {}",
                machine.program_counter(),
                machine.relative_base()
            )
        })?;
        log::debug!("machine stopped in state {state:?}");

        for &addr in &self.peeks {
            let value = machine
                .peek(addr)
                .with_context(|| format!("failed to peek at address {addr}"))?;
            println!("[{addr}] = {value}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches() {
        assert_eq!(parse_patch("1=12").unwrap(), (1, 12));
        assert_eq!(parse_patch(" 2 = -3 ").unwrap(), (2, -3));
        assert!(parse_patch("12").is_err());
        assert!(parse_patch("x=1").is_err());
    }

    #[test]
    fn interactive_conflicts_with_inputs() {
        assert!(RunArgs::try_parse_from(["run", "prog", "-i", "1", "--interactive"]).is_err());
        let args = RunArgs::try_parse_from(["run", "prog", "-i", "-5", "-s", "1=2", "-p", "0"])
            .unwrap();
        assert_eq!(args.inputs, [-5]);
        assert_eq!(args.patches, [(1, 2)]);
        assert_eq!(args.peeks, [0]);
    }
}
