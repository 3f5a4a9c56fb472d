// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD
#![warn(missing_docs)]

//! An Intcode virtual machine, with pluggable I/O and ways to compose several machines
//!
//! # Machines
//!
//! A [`Machine`] owns its [`Memory`], program counter, and relative base. It runs until it halts,
//! until it needs input that isn't available yet, or until something goes wrong.
//!
//! ```rust
//! use intmachine::prelude::*;
//! let mut machine = Machine::new(vec![104, 1024, 99]);
//!
//! assert_eq!(
//!     machine.run_through_inputs(empty()).unwrap(),
//!     (vec![1024], State::Halted)
//! );
//! ```
//!
//! # I/O
//!
//! Input and output go through the [`io::InputPort`] and [`io::OutputPort`] traits, so the same
//! machine can read from a queue, a channel fed by another machine, or a terminal.
//!
//! # Composition
//!
//! The [`host`] module wires machines together: amplifier chains, feedback loops where each
//! machine runs on its own thread, and single-threaded controllers that compute each input from
//! the outputs before it.
//!
//! ```rust
//! use intmachine::Program;
//! use intmachine::host::amplifier_chain;
//! let program = Program::parse("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0").unwrap();
//! assert_eq!(amplifier_chain(&program, &[4, 3, 2, 1, 0], 0).unwrap(), 43210);
//! ```

pub use intmachine_core::{DecodeError, Instruction, OpCode, ParamMode, UnknownMode};

pub mod host;
pub mod io;
pub mod memory;
pub mod program;
pub mod trace;

pub use memory::{Address, Memory, NegativeAddress};
pub use program::Program;

use io::{InputPort, InputQueue, OutputPort, PortError, Suspending};
use std::error::Error;
use std::fmt::{self, Debug, Display};
use trace::{Trace, TraceEntry};

/// A small module that re-exports items useful when working with machines
pub mod prelude {
    pub use crate::io::{InputPort, InputQueue, OutputPort};
    pub use crate::{Machine, Program, State, StepOutcome};
    pub use std::iter::empty;
}

/// The state of a machine, returned whenever it has stopped.
///
/// [Awaiting](State::Awaiting) means that there are more instructions to execute, but the next
/// instruction requires input and none is available yet.
///
/// [Halted](State::Halted) means that a `HALT` instruction has been executed. Once it's been
/// returned, no more instructions will be executed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// Execution is awaiting input
    Awaiting,
    /// Execution has halted
    Halted,
}

/// The outcome when a [Machine] tries to execute a single instruction
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepOutcome {
    /// step ran successfully
    Running,
    /// Step could not run, with the [State] representing why
    Stopped(State),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// An error occured when executing an instruction
///
/// Every variant except [`Poisoned`](MachineError::Poisoned) carries the program counter of the
/// instruction that failed.
pub enum MachineError {
    /// An instruction word with an unrecognized opcode was encountered
    InvalidOpcode {
        /// the whole instruction word
        opcode: i64,
        /// program counter
        pc: i64,
    },
    /// An instruction word with an unknown parameter mode digit was encountered
    InvalidMode {
        /// the mode digit
        digit: i8,
        /// program counter
        pc: i64,
    },
    /// An address resolved to a negative value
    Address {
        /// the resolved address
        address: i64,
        /// program counter
        pc: i64,
    },
    /// An instruction tried to write to a parameter in immediate mode
    InvalidOperand {
        /// index of the offending parameter, starting from `0`
        param: usize,
        /// program counter
        pc: i64,
    },
    /// Input was requested from a finite source that had run out
    InputExhausted {
        /// program counter
        pc: i64,
    },
    /// An I/O port failed
    Port {
        /// the underlying failure
        error: PortError,
        /// program counter
        pc: i64,
    },
    /// Arithmetic overflowed a 64-bit signed integer
    Overflow {
        /// program counter
        pc: i64,
    },
    /// A machine was used after previously erroring out
    Poisoned,
}

impl Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineError::InvalidOpcode { opcode, pc } => {
                write!(f, "encountered unrecognized opcode {opcode} at {pc}")
            }
            MachineError::InvalidMode { digit, pc } => {
                write!(f, "encountered unknown parameter mode {digit} at {pc}")
            }
            MachineError::Address { address, pc } => {
                write!(f, "instruction at {pc} accessed negative address {address}")
            }
            MachineError::InvalidOperand { param, pc } => write!(
                f,
                "instruction at {pc} attempted to write to immediate parameter {}",
                param + 1
            ),
            MachineError::InputExhausted { pc } => {
                write!(f, "instruction at {pc} requested input, but none remained")
            }
            MachineError::Port { error, pc } => write!(f, "I/O failed at {pc}: {error}"),
            MachineError::Overflow { pc } => write!(f, "arithmetic overflow at {pc}"),
            MachineError::Poisoned => {
                write!(f, "tried to reuse a machine after a fatal error")
            }
        }
    }
}

impl Error for MachineError {}

/// The raw parameters of the instruction at the program counter
struct Operands {
    instruction: Instruction,
    params: [i64; 3],
    resolved: [i64; 3],
}

#[derive(Clone)]
/// An Intcode machine, which provides optional tracing of executed instructions.
pub struct Machine {
    pc: i64,
    relative_base: i64,
    memory: Memory,
    poisoned: bool,
    halted: bool,
    trace: Option<Trace>,
}

// ignore the trace field
impl PartialEq for Machine {
    fn eq(&self, other: &Self) -> bool {
        self.pc == other.pc
            && self.relative_base == other.relative_base
            && self.memory == other.memory
            && self.halted == other.halted
            && self.poisoned == other.poisoned
    }
}

impl Debug for Machine {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Machine")
            .field("memory", &self.memory)
            .field("rb", &self.relative_base)
            .field("pc", &self.pc)
            .field("poisoned", &self.poisoned)
            .field("halted", &self.halted)
            .field("tracing", &self.trace.is_some())
            .finish()
    }
}

impl Machine {
    /// Create a new machine. Collects `code` into the starting memory state.
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self {
            pc: 0,
            relative_base: 0,
            poisoned: false,
            halted: false,
            trace: None,
            memory: code.into_iter().collect(),
        }
    }

    /// Create a new machine with its own copy of `program`
    #[must_use]
    pub fn from_program(program: &Program) -> Self {
        Self::new(program.iter().copied())
    }

    /// Manually set a memory location to a provided value
    ///
    /// # Errors
    ///
    /// if `address` is negative, returns a [`NegativeAddress`] error
    #[doc(alias("mem_override", "write"))]
    #[inline]
    pub fn poke(&mut self, address: i64, value: i64) -> Result<(), NegativeAddress> {
        self.memory.write(address, value)
    }

    /// Get the memory at `address`.
    ///
    /// # Errors
    ///
    /// if `address` is negative, returns a [`NegativeAddress`] error
    #[doc(alias("mem_get", "read"))]
    #[inline]
    pub fn peek(&self, address: i64) -> Result<i64, NegativeAddress> {
        self.memory.read(address)
    }

    /// The machine's memory
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The address of the next instruction to execute
    #[must_use]
    pub fn program_counter(&self) -> i64 {
        self.pc
    }

    /// The current relative base
    #[must_use]
    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    /// Whether or not a `HALT` instruction has been executed
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Start recording executed instructions, returning anything recorded since the last call
    pub fn start_trace(&mut self) -> Option<Trace> {
        self.trace.replace(Trace::default())
    }

    /// Stop recording executed instructions, returning what was recorded
    pub fn end_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// Run a single instruction
    ///
    /// On an error, returns an [Err] containing the appropriate [`MachineError`]
    /// Otherwise, returns an [Ok] containing the [`StepOutcome`]
    ///
    /// # Example
    ///
    /// ```
    /// use intmachine::prelude::*;
    /// use intmachine::io::Suspending;
    /// let mut machine = Machine::new([1101, 90, 9, 8, 3, 7, 4, -1]);
    /// let mut out = Vec::new();
    ///
    /// // the first instruction is `ADD #90, #9, 8`
    /// assert_eq!(machine.step(&mut Suspending::new(empty()), &mut out), Ok(StepOutcome::Running));
    /// // the second instruction is `IN 7`, but no input was provided.
    /// assert_eq!(
    ///     machine.step(&mut Suspending::new(empty()), &mut out),
    ///     Ok(StepOutcome::Stopped(State::Awaiting)),
    /// );
    ///
    /// // now try again, but with input available
    /// assert_eq!(machine.step(&mut InputQueue::from(vec![8]), &mut out), Ok(StepOutcome::Running));
    ///
    /// // the third instruction was originally OUT -1, but the address was overwritten by the
    /// // previous instruction, so it will now read from address 8, where the 1st instruction
    /// // inserted 99.
    /// assert!(out.is_empty());
    /// assert_eq!(machine.step(&mut InputQueue::new(), &mut out), Ok(StepOutcome::Running));
    /// assert_eq!(out, [99]);
    ///
    /// // finally, the halt instruction
    /// assert_eq!(
    ///     machine.step(&mut InputQueue::new(), &mut out),
    ///     Ok(StepOutcome::Stopped(State::Halted))
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// If the machine has previously marked itself as poisoned, returns
    /// [`MachineError::Poisoned`] before attempting to do anything.
    ///
    /// Otherwise, if any of the following conditions occur, it marks itself as poisoned and
    /// returns the listed [`MachineError`] variant:
    ///
    /// | Condition                                           | Error type           |
    /// |-----------------------------------------------------|----------------------|
    /// | Opcode is unrecognized                              | [`InvalidOpcode`]    |
    /// | Mode digit is unrecognized                          | [`InvalidMode`]      |
    /// | Instruction accesses a negative address             | [`Address`]          |
    /// | Add, Mul, In, Lt, or Eq output is in immediate mode | [`InvalidOperand`]   |
    /// | Input port has run out of values                    | [`InputExhausted`]   |
    /// | Input or output port failed otherwise               | [`Port`]             |
    /// | Arithmetic overflowed                               | [`Overflow`]         |
    ///
    /// [`InvalidOpcode`]: MachineError::InvalidOpcode
    /// [`InvalidMode`]: MachineError::InvalidMode
    /// [`Address`]: MachineError::Address
    /// [`InvalidOperand`]: MachineError::InvalidOperand
    /// [`InputExhausted`]: MachineError::InputExhausted
    /// [`Port`]: MachineError::Port
    /// [`Overflow`]: MachineError::Overflow
    #[doc(alias("exec_instruction", "run"))]
    pub fn step(
        &mut self,
        input: &mut impl InputPort,
        output: &mut impl OutputPort,
    ) -> Result<StepOutcome, MachineError> {
        if self.poisoned {
            return Err(MachineError::Poisoned);
        }

        if self.halted {
            return Ok(StepOutcome::Stopped(State::Halted));
        }

        let outcome = self.exec(input, output);
        if let Err(e) = &outcome {
            log::debug!("machine poisoned: {e}");
            self.poisoned = true;
        }
        outcome
    }

    fn exec(
        &mut self,
        input: &mut impl InputPort,
        output: &mut impl OutputPort,
    ) -> Result<StepOutcome, MachineError> {
        let pc = self.pc;
        let mut ops = self.fetch()?;
        let mut next_pc = pc
            .checked_add(ops.instruction.width())
            .ok_or(MachineError::Overflow { pc })?;
        let relative_base = self.relative_base;

        match ops.instruction.opcode {
            OpCode::Add => {
                let (a, b) = (self.read(&mut ops, 0)?, self.read(&mut ops, 1)?);
                let sum = a.checked_add(b).ok_or(MachineError::Overflow { pc })?;
                self.write(&mut ops, 2, sum)?;
            }
            OpCode::Mul => {
                let (a, b) = (self.read(&mut ops, 0)?, self.read(&mut ops, 1)?);
                let product = a.checked_mul(b).ok_or(MachineError::Overflow { pc })?;
                self.write(&mut ops, 2, product)?;
            }
            OpCode::In => {
                // validate the destination before consuming any input
                let dest = self.dest(&mut ops, 0)?;
                let value = match input.request_input() {
                    Ok(Some(value)) => value,
                    Ok(None) => {
                        log::debug!("machine awaiting input at {pc}");
                        return Ok(StepOutcome::Stopped(State::Awaiting));
                    }
                    Err(PortError::Exhausted) => return Err(MachineError::InputExhausted { pc }),
                    Err(error) => return Err(MachineError::Port { error, pc }),
                };
                self.memory.set(dest, value);
            }
            OpCode::Out => {
                let value = self.read(&mut ops, 0)?;
                output
                    .deliver_output(value)
                    .map_err(|error| MachineError::Port { error, pc })?;
            }
            OpCode::Jnz => {
                let (cond, target) = (self.read(&mut ops, 0)?, self.read(&mut ops, 1)?);
                if cond != 0 {
                    next_pc = self.jump_target(target)?;
                }
            }
            OpCode::Jz => {
                let (cond, target) = (self.read(&mut ops, 0)?, self.read(&mut ops, 1)?);
                if cond == 0 {
                    next_pc = self.jump_target(target)?;
                }
            }
            OpCode::Lt => {
                let (a, b) = (self.read(&mut ops, 0)?, self.read(&mut ops, 1)?);
                self.write(&mut ops, 2, i64::from(a < b))?;
            }
            OpCode::Eq => {
                let (a, b) = (self.read(&mut ops, 0)?, self.read(&mut ops, 1)?);
                self.write(&mut ops, 2, i64::from(a == b))?;
            }
            OpCode::Rbo => {
                let offset = self.read(&mut ops, 0)?;
                self.relative_base = relative_base
                    .checked_add(offset)
                    .ok_or(MachineError::Overflow { pc })?;
            }
            OpCode::Nop => (),
            OpCode::Halt => {
                log::debug!("machine halted at {pc}");
                self.halted = true;
            }
        }

        self.record(pc, relative_base, &ops);
        if !self.halted {
            self.pc = next_pc;
        }

        Ok(if self.halted {
            StepOutcome::Stopped(State::Halted)
        } else {
            StepOutcome::Running
        })
    }

    fn fetch(&self) -> Result<Operands, MachineError> {
        let pc = self.pc;
        let word = self.memory.read(pc).map_err(|e| self.address_error(e))?;
        let instruction = Instruction::decode(word).map_err(|e| match e {
            DecodeError::UnknownOpcode(opcode) => MachineError::InvalidOpcode { opcode, pc },
            DecodeError::UnknownMode(mode) => MachineError::InvalidMode {
                digit: mode.digit(),
                pc,
            },
        })?;
        let mut params = [0; 3];
        for (offset, param) in (1..).zip(params.iter_mut().take(instruction.param_count())) {
            let addr = pc.checked_add(offset).ok_or(MachineError::Overflow { pc })?;
            *param = self.memory.read(addr).map_err(|e| self.address_error(e))?;
        }
        Ok(Operands {
            instruction,
            params,
            resolved: [0; 3],
        })
    }

    fn address_error(&self, NegativeAddress(address): NegativeAddress) -> MachineError {
        MachineError::Address {
            address,
            pc: self.pc,
        }
    }

    /// A jump target must be a valid address, checked before the program counter moves
    fn jump_target(&self, target: i64) -> Result<i64, MachineError> {
        Address::try_from(target)
            .map(|addr| addr.get())
            .map_err(|e| self.address_error(e))
    }

    /// Resolve the address a positional or relative parameter refers to
    fn resolve_address(&self, ops: &Operands, i: usize) -> Result<i64, MachineError> {
        let raw = ops.params[i];
        match ops.instruction.modes[i] {
            ParamMode::Relative => raw
                .checked_add(self.relative_base)
                .ok_or(MachineError::Overflow { pc: self.pc }),
            _ => Ok(raw),
        }
    }

    /// Resolve parameter `i` as a value to read
    fn read(&self, ops: &mut Operands, i: usize) -> Result<i64, MachineError> {
        let value = if ops.instruction.modes[i] == ParamMode::Immediate {
            ops.params[i]
        } else {
            let addr = self.resolve_address(ops, i)?;
            self.memory.read(addr).map_err(|e| self.address_error(e))?
        };
        ops.resolved[i] = value;
        Ok(value)
    }

    /// Resolve parameter `i` as a destination to write to
    fn dest(&self, ops: &mut Operands, i: usize) -> Result<Address, MachineError> {
        if ops.instruction.modes[i] == ParamMode::Immediate {
            return Err(MachineError::InvalidOperand { param: i, pc: self.pc });
        }
        let addr = self.resolve_address(ops, i)?;
        ops.resolved[i] = addr;
        Address::try_from(addr).map_err(|e| self.address_error(e))
    }

    fn write(&mut self, ops: &mut Operands, i: usize, value: i64) -> Result<(), MachineError> {
        let dest = self.dest(ops, i)?;
        self.memory.set(dest, value);
        Ok(())
    }

    fn record(&mut self, pc: i64, relative_base: i64, ops: &Operands) {
        if self.trace.is_none() && !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let count = ops.instruction.param_count();
        let entry = TraceEntry {
            pc,
            instruction: ops.instruction,
            relative_base,
            params: ops.params[..count].to_vec(),
            resolved: ops.resolved[..count].to_vec(),
        };
        log::trace!("{entry}");
        if let Some(trace) = self.trace.as_mut() {
            trace.push(entry);
        }
    }

    /// Execute until the program halts, or until it needs input that `input` can't provide yet
    ///
    /// # Errors
    ///
    /// If an internal call to [`self.step`][Machine::step] fails, returns the resulting
    /// [`MachineError`] unchanged.
    pub fn run(
        &mut self,
        input: &mut impl InputPort,
        output: &mut impl OutputPort,
    ) -> Result<State, MachineError> {
        loop {
            if let StepOutcome::Stopped(state) = self.step(input, output)? {
                break Ok(state);
            }
        }
    }

    /// Execute to completion with a fixed set of inputs, returning every output.
    ///
    /// ```
    /// use intmachine::prelude::*;
    /// use intmachine::MachineError;
    /// // outputs 1 if the input is 8, otherwise 0
    /// let program = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
    /// assert_eq!(Machine::new(program).run_with_inputs([8]), Ok(vec![1]));
    /// assert_eq!(Machine::new(program).run_with_inputs([7]), Ok(vec![0]));
    /// assert_eq!(
    ///     Machine::new(program).run_with_inputs([]),
    ///     Err(MachineError::InputExhausted { pc: 0 })
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// If the program asks for more input than was provided, returns
    /// [`MachineError::InputExhausted`]. Any other error from [`self.step`][Machine::step] is
    /// returned unchanged.
    pub fn run_with_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<Vec<i64>, MachineError> {
        let mut inputs: InputQueue = inputs.into_iter().collect();
        let mut outputs = Vec::new();
        let state = self.run(&mut inputs, &mut outputs)?;
        debug_assert_eq!(state, State::Halted, "an InputQueue can't suspend a machine");
        Ok(outputs)
    }

    /// Execute until either the program halts, or it tries to read nonexistent input.
    /// Returns `Ok((v, s))`, where `v` is a [`Vec<i64>`] containing all outputs that it found,
    /// and `s` is the [`State`] at the time it stopped.
    ///
    /// If it stopped because it was [awaiting](State::Awaiting) input, it can be resumed with
    /// another call.
    ///
    /// # Errors
    ///
    /// If an internal call to [`self.step`][Machine::step] fails, returns the resulting
    /// [`MachineError`] unchanged.
    pub fn run_through_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<(Vec<i64>, State), MachineError> {
        let mut outputs = Vec::new();
        let state = self.run(&mut Suspending::new(inputs), &mut outputs)?;
        Ok((outputs, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::empty;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn add_mul() {
        let mut machine = Machine::new([1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        assert_eq!(machine.run_with_inputs(empty()), Ok(vec![]));
        assert_eq!(
            machine.memory().primary(),
            &[3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]
        );
        assert!(machine.is_halted());
        assert_eq!(machine.program_counter(), 8);
    }

    #[test]
    fn halted_machine_stays_halted() {
        let mut machine = Machine::new([99]);
        assert_eq!(machine.run_through_inputs(empty()), Ok((vec![], State::Halted)));
        assert_eq!(machine.run_through_inputs([1, 2]), Ok((vec![], State::Halted)));
    }

    #[test]
    fn nop_advances_by_one() {
        let mut machine = Machine::new([98, 98, 104, 5, 99]);
        assert_eq!(machine.run_with_inputs(empty()), Ok(vec![5]));
    }

    #[test]
    fn jumps_taken_and_not_taken() {
        // JZ #0, #5; HALT; ... OUT #7, HALT
        let mut machine = Machine::new([1106, 0, 5, 99, 99, 104, 7, 99]);
        assert_eq!(machine.run_with_inputs(empty()), Ok(vec![7]));
        // JNZ #0, #5 falls through to the first HALT
        let mut machine = Machine::new([1105, 0, 5, 99, 99, 104, 7, 99]);
        assert_eq!(machine.run_with_inputs(empty()), Ok(vec![]));
        assert_eq!(machine.program_counter(), 3);
    }

    #[test]
    fn relative_base_adjustment() {
        // RBO #10, RBO #-3, OUT @0 reads address 7
        let mut machine = Machine::new([109, 10, 109, -3, 204, 0, 99, 1234]);
        assert_eq!(machine.run_with_inputs(empty()), Ok(vec![1234]));
        assert_eq!(machine.relative_base(), 7);
    }

    #[test]
    fn relative_write_target() {
        // RBO #100, IN @5, OUT 105
        let mut machine = Machine::new([109, 100, 203, 5, 4, 105, 99]);
        assert_eq!(machine.run_with_inputs([-42]), Ok(vec![-42]));
        assert_eq!(machine.peek(105), Ok(-42));
        assert_eq!(machine.memory().len_primary(), 7);
    }

    #[test]
    fn invalid_opcode() {
        let mut machine = Machine::new([1101, 1, 1, 5, 42]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::InvalidOpcode { opcode: 42, pc: 4 })
        );
        assert_eq!(machine.run_with_inputs(empty()), Err(MachineError::Poisoned));
    }

    #[test]
    fn invalid_mode() {
        let mut machine = Machine::new([301, 0, 0, 0, 99]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::InvalidMode { digit: 3, pc: 0 })
        );
    }

    #[test]
    fn write_to_immediate() {
        let mut machine = Machine::new([11101, 1, 1, 5, 99]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::InvalidOperand { param: 2, pc: 0 })
        );
        let mut machine = Machine::new([103, 5, 99]);
        assert_eq!(
            machine.run_with_inputs([1]),
            Err(MachineError::InvalidOperand { param: 0, pc: 0 })
        );
    }

    #[test]
    fn negative_addresses() {
        let mut machine = Machine::new([4, -1, 99]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::Address { address: -1, pc: 0 })
        );
        // RBO #-5, OUT @2
        let mut machine = Machine::new([109, -5, 204, 2, 99]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::Address { address: -3, pc: 2 })
        );
    }

    #[test]
    fn jump_to_negative_address() {
        // JNZ #1, #-4
        let mut machine = Machine::new([1105, 1, -4, 99]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::Address { address: -4, pc: 0 })
        );
        assert_eq!(machine.program_counter(), 0);
        // JZ #0, #-7 after an output, so the failing jump isn't at address 0
        let mut machine = Machine::new([104, 3, 1106, 0, -7, 99]);
        let mut outputs = Vec::new();
        assert_eq!(
            machine.run(&mut InputQueue::new(), &mut outputs),
            Err(MachineError::Address { address: -7, pc: 2 })
        );
        assert_eq!((outputs, machine.program_counter()), (vec![3], 2));
        // a jump that isn't taken never checks its target
        let mut machine = Machine::new([1106, 1, -4, 104, 7, 99]);
        assert_eq!(machine.run_with_inputs(empty()), Ok(vec![7]));
    }

    #[test]
    fn overflow_is_an_error() {
        let mut machine = Machine::new([1102, i64::MAX, 2, 0, 99]);
        assert_eq!(
            machine.run_with_inputs(empty()),
            Err(MachineError::Overflow { pc: 0 })
        );
    }

    #[test]
    fn suspension_leaves_machine_unchanged() {
        let mut machine = Machine::new([3, 10, 4, 10, 99]);
        let before = machine.clone();
        assert_eq!(machine.run_through_inputs(empty()), Ok((vec![], State::Awaiting)));
        assert_eq!(machine, before);
        assert_eq!(machine.run_through_inputs([5]), Ok((vec![5], State::Halted)));
    }

    #[test]
    fn trace_records_each_instruction() {
        log_init();
        let mut machine = Machine::new([1101, 90, 9, 7, 104, 1, 99, 0]);
        assert!(machine.start_trace().is_none());
        machine.run_with_inputs(empty()).unwrap();
        let trace = machine.end_trace().unwrap();
        assert_eq!(
            trace.to_string(),
            "0: ADD #90, #9, 7 (rb = 0)\n4: OUT #1 (rb = 0)\n6: HALT (rb = 0)\n"
        );
        assert_eq!(trace.0[0].resolved, [90, 9, 7]);
        assert!(machine.end_trace().is_none());
    }
}
