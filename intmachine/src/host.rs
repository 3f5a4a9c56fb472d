// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Ways of composing machines
//!
//! * [`amplifier_chain`] runs machines one after another, feeding each one's output to the next.
//! * [`feedback_loop`] runs every machine on its own thread, connected in a ring by channels.
//! * [`spawn`] runs a single machine on its own thread, for a host that wants to talk to it
//!   through channels.
//! * [`drive`] runs a single machine on the current thread, asking a [`Controller`] for each
//!   input.
//! * [`search_patch`] looks for startup parameters that make a program produce a given result.

use crate::io::{self, OutputPort, PortError, Tee};
use crate::{Machine, MachineError, Program, State};
use crossbeam::channel::{Receiver, Sender};
use itertools::Itertools;
use std::error::Error;
use std::fmt::{self, Display};
use std::iter::empty;
use std::ops::RangeInclusive;
use std::thread::{self, JoinHandle};

/// Something went wrong in one of the machines a host was running
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HostError {
    /// A machine failed
    Machine {
        /// position of the machine within the composition
        index: usize,
        /// what went wrong
        error: MachineError,
    },
    /// A machine halted without producing the output the host needed
    NoOutput {
        /// position of the machine within the composition
        index: usize,
    },
    /// The thread running a machine panicked
    Panicked {
        /// position of the machine within the composition
        index: usize,
    },
}

impl Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Machine { index, error } => write!(f, "machine {index} failed: {error}"),
            HostError::NoOutput { index } => write!(f, "machine {index} produced no output"),
            HostError::Panicked { index } => write!(f, "thread for machine {index} panicked"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HostError::Machine { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// How the amplifiers in a chain are connected
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ChainMode {
    /// Each amplifier runs to completion before the next starts. See [`amplifier_chain`].
    Single,
    /// The last amplifier feeds back into the first. See [`feedback_loop`].
    Feedback,
}

/// Run a fresh copy of `program` for each phase, one after another
///
/// Each machine gets its phase followed by the previous machine's last output (or `signal`, for
/// the first machine). Returns the last machine's last output.
///
/// # Errors
///
/// If any machine fails, returns [`HostError::Machine`] with that machine's index. If a machine
/// halts without producing output, returns [`HostError::NoOutput`].
pub fn amplifier_chain(program: &Program, phases: &[i64], signal: i64) -> Result<i64, HostError> {
    phases
        .iter()
        .enumerate()
        .try_fold(signal, |signal, (index, &phase)| {
            let outputs = Machine::from_program(program)
                .run_with_inputs([phase, signal])
                .map_err(|error| HostError::Machine { index, error })?;
            outputs.last().copied().ok_or(HostError::NoOutput { index })
        })
}

/// Run a fresh copy of `program` for each phase, each on its own thread, connected in a ring
///
/// Machine `i` reads from a channel seeded with `phases[i]`, and writes to machine `i + 1`'s
/// channel, with the last machine writing back to the first machine's channel. The first
/// machine's channel is also seeded with `signal`. Once every machine has halted, returns the
/// last value the final machine produced.
///
/// The channels are unbounded, so a machine never blocks on output, only on input.
///
/// ```
/// use intmachine::Program;
/// use intmachine::host::feedback_loop;
/// let program = Program::parse(
///     "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5"
/// ).unwrap();
/// assert_eq!(feedback_loop(&program, &[9, 8, 7, 6, 5], 0), Ok(139_629_729));
/// ```
///
/// # Errors
///
/// If any machine fails, returns [`HostError::Machine`] for the machine that failed first. A
/// failing machine disconnects its channel, so the machines after it fail too, but those
/// follow-on disconnections are not what gets reported. If the final machine never produced
/// output, returns [`HostError::NoOutput`].
pub fn feedback_loop(program: &Program, phases: &[i64], signal: i64) -> Result<i64, HostError> {
    let Some(last_index) = phases.len().checked_sub(1) else {
        return Ok(signal);
    };

    let (mut senders, receivers): (Vec<Sender<i64>>, Vec<Receiver<i64>>) =
        phases.iter().map(|_| io::channel(None)).unzip();

    // every receiver is still held and the channels are unbounded, so seeding can't fail
    for (sender, &phase) in senders.iter_mut().zip(phases) {
        let seeded = sender.deliver_output(phase);
        debug_assert!(seeded.is_ok(), "failed to seed channel with phase {phase}");
    }
    let seeded = senders[0].deliver_output(signal);
    debug_assert!(seeded.is_ok(), "failed to seed the first channel with {signal}");

    // machine i sends to channel i + 1
    senders.rotate_left(1);

    let results = thread::scope(|scope| {
        let handles = receivers
            .iter()
            .cloned()
            .zip(senders)
            .map(|(mut input, output)| {
                scope.spawn(move || {
                    let mut output = Tee::new(output);
                    let mut machine = Machine::from_program(program);
                    machine.run(&mut input, &mut output).map(|_| output.last())
                })
            })
            .collect_vec();

        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| -> Result<Option<i64>, HostError> {
                handle
                    .join()
                    .map_err(|_| HostError::Panicked { index })?
                    .map_err(|error| HostError::Machine { index, error })
            })
            .collect_vec()
    });
    // receivers are held until every machine is done, so the final send around the ring succeeds
    drop(receivers);

    let is_disconnect = |result: &Result<Option<i64>, HostError>| {
        matches!(
            result,
            Err(HostError::Machine {
                error: MachineError::Port {
                    error: PortError::Disconnected,
                    ..
                },
                ..
            })
        )
    };

    if let Some(Err(e)) = results
        .iter()
        .find(|r| r.is_err() && !is_disconnect(*r))
        .or_else(|| results.iter().find(|r| r.is_err()))
    {
        log::debug!("feedback loop failed: {e}");
        return Err(*e);
    }

    match results[last_index] {
        Ok(Some(value)) => Ok(value),
        _ => Err(HostError::NoOutput { index: last_index }),
    }
}

/// Try every ordering of `candidates` as the phases of an amplifier chain
///
/// Returns the ordering that produced the highest signal, along with that signal, or `None` if
/// `candidates` is empty.
///
/// ```
/// use intmachine::Program;
/// use intmachine::host::{ChainMode, best_phase_setting};
/// let program = Program::parse("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0").unwrap();
/// assert_eq!(
///     best_phase_setting(&program, &[0, 1, 2, 3, 4], 0, ChainMode::Single),
///     Ok(Some((vec![4, 3, 2, 1, 0], 43210)))
/// );
/// ```
///
/// # Errors
///
/// If running any ordering fails, returns the resulting [`HostError`].
pub fn best_phase_setting(
    program: &Program,
    candidates: &[i64],
    signal: i64,
    mode: ChainMode,
) -> Result<Option<(Vec<i64>, i64)>, HostError> {
    if candidates.is_empty() {
        return Ok(None);
    }
    let mut best: Option<(Vec<i64>, i64)> = None;
    for phases in candidates.iter().copied().permutations(candidates.len()) {
        let output = match mode {
            ChainMode::Single => amplifier_chain(program, &phases, signal)?,
            ChainMode::Feedback => feedback_loop(program, &phases, signal)?,
        };
        log::debug!("phases {} produced {output}", phases.iter().format(","));
        if best.as_ref().is_none_or(|&(_, current)| output > current) {
            best = Some((phases, output));
        }
    }
    if let Some((phases, output)) = &best {
        log::info!("best phase setting {} produced {output}", phases.iter().format(","));
    }
    Ok(best)
}

/// A machine running on its own thread. See [`spawn`].
#[derive(Debug)]
pub struct MachineHandle {
    /// unbounded, drained in order by `forwarder`
    input: Sender<i64>,
    output: Receiver<i64>,
    thread: JoinHandle<Result<Machine, MachineError>>,
    forwarder: JoinHandle<()>,
}

/// Run `machine` on a new thread, connected to the returned handle by a pair of channels
///
/// `capacity` is passed to [`io::channel`] for both of the machine's channels. Values given to
/// [`MachineHandle::feed`] are queued without limit and handed to the machine's input channel
/// in order by a forwarding thread.
///
/// ```
/// use intmachine::prelude::*;
/// use intmachine::host::spawn;
/// // read two inputs and output the first minus the second, then halt
/// let machine = Machine::new([3, 20, 3, 21, 1002, 21, -1, 21, 1, 20, 21, 22, 4, 22, 99]);
/// let handle = spawn(machine, Some(0));
/// handle.feed(44).unwrap();
/// handle.feed(2).unwrap();
/// assert_eq!(handle.recv(), Some(42));
/// assert_eq!(handle.recv(), None);
/// let machine = handle.finish().unwrap();
/// assert!(machine.is_halted());
/// ```
#[must_use]
pub fn spawn(mut machine: Machine, capacity: Option<usize>) -> MachineHandle {
    let (input, staged) = io::channel(None);
    let (to_machine, mut machine_input) = io::channel(capacity);
    let (mut machine_output, output) = io::channel(capacity);
    let thread = thread::spawn(move || -> Result<Machine, MachineError> {
        machine.run(&mut machine_input, &mut machine_output)?;
        Ok(machine)
    });
    // ends once the handle stops feeding or the machine drops its input
    let forwarder = thread::spawn(move || {
        for value in staged {
            if to_machine.send(value).is_err() {
                log::debug!("machine stopped before accepting {value}");
                break;
            }
        }
    });
    MachineHandle {
        input,
        output,
        thread,
        forwarder,
    }
}

impl MachineHandle {
    /// Queue `value` as the machine's next input without blocking the calling thread
    ///
    /// Values reach the machine in the order they were fed, however full its input channel is.
    ///
    /// # Errors
    ///
    /// If the machine has already stopped, returns [`PortError::Disconnected`]. A value fed while
    /// the machine is stopping may be queued and then dropped.
    pub fn feed(&self, value: i64) -> Result<(), PortError> {
        if self.is_finished() {
            return Err(PortError::Disconnected);
        }
        self.input.send(value).map_err(|_| PortError::Disconnected)
    }

    /// Whether the machine's thread has stopped, either halting or failing
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the machine's next output
    ///
    /// Returns `None` once the machine has stopped and every output has been received.
    #[must_use]
    pub fn recv(&self) -> Option<i64> {
        self.output.recv().ok()
    }

    /// Iterate over the machine's outputs until it stops
    pub fn outputs(&self) -> impl Iterator<Item = i64> + '_ {
        self.output.iter()
    }

    /// Close the machine's input and wait for its thread to finish
    ///
    /// # Errors
    ///
    /// If the machine failed, returns [`HostError::Machine`]. A machine still waiting for input
    /// fails with [`PortError::Disconnected`] when its input is closed. If the thread panicked,
    /// returns [`HostError::Panicked`].
    pub fn finish(self) -> Result<Machine, HostError> {
        drop(self.input);
        drop(self.output);
        let outcome = self
            .thread
            .join()
            .map_err(|_| HostError::Panicked { index: 0 })?
            .map_err(|error| HostError::Machine { index: 0, error });
        if self.forwarder.join().is_err() {
            log::warn!("input forwarding thread panicked");
        }
        outcome
    }
}

/// Computes a machine's next input from what it has output since the last input
pub trait Controller {
    /// Called whenever the machine needs input, with every output it produced since the previous
    /// call. Returning `None` stops [`drive`], leaving the machine awaiting input.
    fn next_input(&mut self, outputs: &[i64]) -> Option<i64>;
}

impl<F: FnMut(&[i64]) -> Option<i64>> Controller for F {
    fn next_input(&mut self, outputs: &[i64]) -> Option<i64> {
        self(outputs)
    }
}

/// Run `machine` on the current thread, asking `controller` for every input
///
/// Returns the outputs produced after the last input, along with the machine's [`State`], which
/// is only [`State::Awaiting`] if the controller stopped it.
///
/// ```
/// use intmachine::prelude::*;
/// use intmachine::host::drive;
/// // repeatedly read a value and output its double, until reading 0
/// let mut machine = Machine::new([3, 20, 1006, 20, 14, 1002, 20, 2, 21, 4, 21, 1105, 1, 0, 99]);
/// let mut inputs = vec![0, 3, 5];
/// let mut seen = Vec::new();
/// let outcome = drive(&mut machine, &mut |outputs: &[i64]| {
///     seen.extend_from_slice(outputs);
///     inputs.pop()
/// });
/// assert_eq!(outcome, Ok((vec![], State::Halted)));
/// assert_eq!(seen, [10, 6]);
/// ```
///
/// # Errors
///
/// If the machine fails, returns [`HostError::Machine`].
pub fn drive(
    machine: &mut Machine,
    controller: &mut impl Controller,
) -> Result<(Vec<i64>, State), HostError> {
    let mut pending = None;
    loop {
        let (outputs, state) = machine
            .run_through_inputs(pending.take())
            .map_err(|error| HostError::Machine { index: 0, error })?;
        if state == State::Halted {
            return Ok((outputs, state));
        }
        match controller.next_input(&outputs) {
            Some(value) => pending = Some(value),
            None => return Ok((outputs, state)),
        }
    }
}

/// Search for values to write to addresses `1` and `2` so that `program` halts with `target` at
/// address `0`
///
/// Every pair from `values` is tried, first value varying slowest. Pairs that make the program
/// fail are skipped.
///
/// ```
/// use intmachine::Program;
/// use intmachine::host::search_patch;
/// // address 0 ends up as the sum of the values at the patched addresses
/// let program = Program::parse("1,0,0,0,99,7,9").unwrap();
/// assert_eq!(search_patch(&program, 16, 0..=6), Some((5, 6)));
/// assert_eq!(search_patch(&program, 1000, 0..=6), None);
/// ```
#[must_use]
pub fn search_patch(
    program: &Program,
    target: i64,
    values: RangeInclusive<i64>,
) -> Option<(i64, i64)> {
    values
        .clone()
        .cartesian_product(values)
        .find(|&(noun, verb)| {
            let mut machine = Machine::from_program(program);
            machine
                .poke(1, noun)
                .and_then(|()| machine.poke(2, verb))
                .is_ok()
                && machine
                    .run_with_inputs(empty())
                    .inspect_err(|e| log::debug!("skipping {noun}, {verb}: {e}"))
                    .is_ok()
                && machine.peek(0) == Ok(target)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chains_pass_the_signal_through() {
        let program = Program::from(vec![99]);
        assert_eq!(amplifier_chain(&program, &[], 7), Ok(7));
        assert_eq!(feedback_loop(&program, &[], 7), Ok(7));
        assert_eq!(
            best_phase_setting(&program, &[], 0, ChainMode::Feedback),
            Ok(None)
        );
    }

    #[test]
    fn silent_amplifiers() {
        let program = Program::from(vec![3, 0, 3, 0, 99]);
        assert_eq!(
            amplifier_chain(&program, &[1, 2], 0),
            Err(HostError::NoOutput { index: 0 })
        );
        // reads only its phase
        let program = Program::from(vec![3, 0, 99]);
        assert_eq!(
            feedback_loop(&program, &[1, 2], 0),
            Err(HostError::NoOutput { index: 1 })
        );
    }

    #[test]
    fn feedback_failure_reports_root_cause() {
        // with a nonzero phase, outputs the signal and halts. With phase 0, hits an invalid
        // opcode, which leaves the machine after it waiting on a disconnected channel
        let program = Program::parse("3,20,3,21,1005,20,9,42,99,4,21,99").unwrap();
        assert_eq!(
            feedback_loop(&program, &[1, 0, 1], 5),
            Err(HostError::Machine {
                index: 1,
                error: MachineError::InvalidOpcode { opcode: 42, pc: 7 },
            })
        );
    }

    #[test]
    fn finish_while_awaiting_input() {
        let handle = spawn(Machine::new([3, 0, 99]), None);
        assert_eq!(
            handle.finish(),
            Err(HostError::Machine {
                index: 0,
                error: MachineError::Port {
                    error: PortError::Disconnected,
                    pc: 0
                }
            })
        );
    }

    #[test]
    fn feed_after_halt() {
        let handle = spawn(Machine::new([104, 1, 99]), Some(0));
        assert_eq!(handle.outputs().collect_vec(), [1]);
        while !handle.is_finished() {
            thread::yield_now();
        }
        assert_eq!(handle.feed(1), Err(PortError::Disconnected));
        assert!(handle.finish().is_ok());
    }

    #[test]
    fn fed_values_keep_their_order() {
        // IN [20], IN [21], OUT [20], OUT [21]
        let program = Program::from(vec![3, 20, 3, 21, 4, 20, 4, 21, 99]);
        for _ in 0..200 {
            let handle = spawn(Machine::from_program(&program), Some(0));
            for value in 1..=2 {
                handle.feed(value).unwrap();
            }
            assert_eq!(handle.outputs().collect_vec(), [1, 2]);
            assert!(handle.finish().unwrap().is_halted());
        }
    }

    #[test]
    fn controller_can_stop_driving() {
        let mut machine = Machine::new([104, 3, 3, 0, 99]);
        let mut stop = |_: &[i64]| -> Option<i64> { None };
        assert_eq!(drive(&mut machine, &mut stop), Ok((vec![3], State::Awaiting)));
        assert_eq!(machine.program_counter(), 2);
    }
}
