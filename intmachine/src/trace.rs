// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Records of executed instructions
//!
//! See [`Machine::start_trace`](crate::Machine::start_trace).

use intmachine_core::Instruction;
use itertools::Itertools;
use std::fmt::{self, Display};

/// A single executed instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// The address of the instruction word
    pub pc: i64,
    /// The decoded instruction word
    pub instruction: Instruction,
    /// The relative base when the instruction started executing
    pub relative_base: i64,
    /// The raw parameters, as stored in memory
    pub params: Vec<i64>,
    /// The resolved parameters: values for parameters that are read, and addresses for the
    /// parameter that is written to
    pub resolved: Vec<i64>,
}

impl Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pc, self.instruction.opcode)?;
        if !self.params.is_empty() {
            write!(
                f,
                " {}",
                self.params
                    .iter()
                    .zip(self.instruction.modes)
                    .format_with(", ", |(param, mode), f| f(&format_args!("{mode}{param}")))
            )?;
        }
        write!(f, " (rb = {})", self.relative_base)
    }
}

/// A sequence of executed instructions, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trace(pub Vec<TraceEntry>);

impl Trace {
    pub(crate) fn push(&mut self, entry: TraceEntry) {
        self.0.push(entry);
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.0 {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
