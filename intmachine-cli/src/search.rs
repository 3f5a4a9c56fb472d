// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use anyhow::{Result, bail};
use clap::{Parser, ValueHint};
use intmachine::host;
use std::path::PathBuf;

use crate::load_program;

#[derive(Debug, Parser)]
pub(crate) struct SearchArgs {
    /// File containing the program to patch, or "-" to read it from stdin
    #[arg(value_name = "PROGRAM", value_hint = ValueHint::FilePath)]
    program: PathBuf,
    /// The value address 0 should hold once the program halts
    #[arg(short, long, allow_negative_numbers = true)]
    target: i64,
    /// The largest value to try at each address
    #[arg(short, long, default_value_t = 99, value_parser = clap::value_parser!(i64).range(0..))]
    max: i64,
}

impl SearchArgs {
    pub(crate) fn run(&self) -> Result<()> {
        let program = load_program(&self.program)?;
        let Some((noun, verb)) = host::search_patch(&program, self.target, 0..=self.max) else {
            bail!(
                "no values in 0..={} leave {} at address 0",
                self.max,
                self.target
            );
        };
        log::info!("found noun = {noun}, verb = {verb}");
        println!("{noun},{verb}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_must_not_be_negative() {
        assert!(SearchArgs::try_parse_from(["search", "-", "-t", "5", "-m", "-1"]).is_err());
        let args = SearchArgs::try_parse_from(["search", "-", "-t", "-5"]).unwrap();
        assert_eq!((args.target, args.max), (-5, 99));
    }
}
