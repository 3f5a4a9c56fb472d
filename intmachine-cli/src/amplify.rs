// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use anyhow::{Result, bail};
use clap::{ArgAction, Parser, ValueHint};
use intmachine::host::{self, ChainMode};
use itertools::Itertools;
use std::path::PathBuf;

use crate::load_program;

#[derive(Debug, Parser)]
pub(crate) struct AmplifyArgs {
    /// File containing the amplifier program, or "-" to read it from stdin
    #[arg(value_name = "PROGRAM", value_hint = ValueHint::FilePath)]
    program: PathBuf,
    /// Connect the last amplifier back to the first, running each on its own thread
    #[arg(short, long, action = ArgAction::SetTrue)]
    feedback: bool,
    /// Phase settings to try, in every order
    ///
    /// Defaults to 0,1,2,3,4, or 5,6,7,8,9 with --feedback
    #[arg(
        short,
        long,
        value_name = "PHASES",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    phases: Option<Vec<i64>>,
    /// Use PHASES in the order given, rather than trying every order
    #[arg(short, long, action = ArgAction::SetTrue, requires = "phases")]
    exact: bool,
    /// Signal sent to the first amplifier
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    signal: i64,
}

impl AmplifyArgs {
    fn mode(&self) -> ChainMode {
        if self.feedback {
            ChainMode::Feedback
        } else {
            ChainMode::Single
        }
    }

    fn phases(&self) -> Vec<i64> {
        match (&self.phases, self.mode()) {
            (Some(phases), _) => phases.clone(),
            (None, ChainMode::Single) => (0..5).collect(),
            (None, ChainMode::Feedback) => (5..10).collect(),
        }
    }

    pub(crate) fn run(&self) -> Result<()> {
        let program = load_program(&self.program)?;
        let phases = self.phases();

        let (phases, signal) = if self.exact {
            let signal = match self.mode() {
                ChainMode::Single => host::amplifier_chain(&program, &phases, self.signal)?,
                ChainMode::Feedback => host::feedback_loop(&program, &phases, self.signal)?,
            };
            (phases, signal)
        } else {
            let Some(best) =
                host::best_phase_setting(&program, &phases, self.signal, self.mode())?
            else {
                bail!("no phases to try");
            };
            best
        };

        println!("{}: {signal}", phases.iter().format(","));
        Ok(())
    }
}
