// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Input and output ports
//!
//! A [`Machine`](crate::Machine) never talks to the outside world directly. The `IN` instruction
//! calls [`InputPort::request_input`] and the `OUT` instruction calls
//! [`OutputPort::deliver_output`], so the same machine can be driven by a pre-supplied queue, by
//! another machine through a channel, or by a person at a terminal.
//!
//! | backend                 | input                                | output                |
//! |-------------------------|--------------------------------------|-----------------------|
//! | [`InputQueue`]          | pops values, fails once empty        |                       |
//! | [`Suspending`]          | pulls from an iterator, suspends once drained |              |
//! | [`Vec<i64>`]            |                                      | appends               |
//! | [`Receiver`]/[`Sender`] | blocks until a value arrives         | blocks while full     |
//! | [`Prompt`]              | reads a line from a reader           | writes a line         |
//! | [`Tee`]                 |                                      | records and forwards  |
//! | [`FromFn`]              | calls a closure                      |                       |

use crossbeam::channel::{self, Receiver, Sender};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display};
use std::io::{self, BufRead, Stdout, Write};

/// A port failed to deliver or accept a value
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PortError {
    /// A finite input source has no more values, and never will
    Exhausted,
    /// The other end of a channel has been dropped
    Disconnected,
    /// An I/O error occured while reading or writing a stream
    Io(io::ErrorKind),
}

impl Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortError::Exhausted => write!(f, "input exhausted"),
            PortError::Disconnected => write!(f, "channel disconnected"),
            PortError::Io(kind) => write!(f, "an I/O error occured: {kind}"),
        }
    }
}

impl Error for PortError {}

impl From<io::Error> for PortError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

/// Somewhere a machine can get input from
pub trait InputPort {
    /// Get the next input value
    ///
    /// Returns `Ok(None)` if no value is available *yet*, in which case the machine suspends
    /// without changing state, and the `IN` instruction is retried the next time it runs.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if no value will ever be available.
    fn request_input(&mut self) -> Result<Option<i64>, PortError>;
}

/// Somewhere a machine can send output to
pub trait OutputPort {
    /// Deliver a single output value, blocking if the port requires it
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the value can't be delivered.
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError>;
}

impl<P: InputPort + ?Sized> InputPort for &mut P {
    fn request_input(&mut self) -> Result<Option<i64>, PortError> {
        (**self).request_input()
    }
}

impl<P: OutputPort + ?Sized> OutputPort for &mut P {
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError> {
        (**self).deliver_output(value)
    }
}

impl OutputPort for Vec<i64> {
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError> {
        self.push(value);
        Ok(())
    }
}

/// A finite queue of pre-supplied inputs
///
/// Requesting input from an empty queue is an error, as nothing could ever refill it while the
/// machine is running.
///
/// ```
/// use intmachine::io::{InputPort, InputQueue, PortError};
/// let mut queue = InputQueue::from(vec![5, 6]);
/// assert_eq!(queue.request_input(), Ok(Some(5)));
/// assert_eq!(queue.request_input(), Ok(Some(6)));
/// assert_eq!(queue.request_input(), Err(PortError::Exhausted));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputQueue(VecDeque<i64>);

impl InputQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the back of the queue
    pub fn push(&mut self, value: i64) {
        self.0.push_back(value);
    }

    /// The number of values remaining
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether or not the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for InputQueue {
    fn from(v: Vec<i64>) -> Self {
        Self(v.into())
    }
}

impl FromIterator<i64> for InputQueue {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<i64> for InputQueue {
    fn extend<T: IntoIterator<Item = i64>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl InputPort for InputQueue {
    fn request_input(&mut self) -> Result<Option<i64>, PortError> {
        self.0.pop_front().map(Some).ok_or(PortError::Exhausted)
    }
}

/// Input pulled from an iterator, suspending the machine once the iterator is drained
///
/// This is the backend to use when a single thread alternates between running a machine and
/// deciding what to feed it next.
#[derive(Debug, Clone)]
pub struct Suspending<I>(pub I);

impl<I: Iterator<Item = i64>> Suspending<I> {
    /// Wrap anything that can be turned into an iterator of inputs
    pub fn new(inputs: impl IntoIterator<IntoIter = I>) -> Self {
        Self(inputs.into_iter())
    }
}

impl<I: Iterator<Item = i64>> InputPort for Suspending<I> {
    fn request_input(&mut self) -> Result<Option<i64>, PortError> {
        Ok(self.0.next())
    }
}

/// Input computed by a closure, with `None` suspending the machine
#[derive(Debug, Clone)]
pub struct FromFn<F>(F);

/// Create an [`InputPort`] that calls `f` whenever input is requested
///
/// ```
/// use intmachine::prelude::*;
/// use intmachine::io::from_fn;
/// // IN 5, OUT 5, HALT
/// let mut machine = Machine::new([3, 5, 4, 5, 99, 0]);
/// let mut out = Vec::new();
/// let state = machine.run(&mut from_fn(|| Some(42)), &mut out).unwrap();
/// assert_eq!((out, state), (vec![42], State::Halted));
/// ```
pub fn from_fn<F: FnMut() -> Option<i64>>(f: F) -> FromFn<F> {
    FromFn(f)
}

impl<F: FnMut() -> Option<i64>> InputPort for FromFn<F> {
    fn request_input(&mut self) -> Result<Option<i64>, PortError> {
        Ok((self.0)())
    }
}

/// Create a channel for connecting machines
///
/// With `None`, the channel is unbounded and sending never blocks. With `Some(0)`, every send
/// waits for a matching receive. Otherwise, sends block while `capacity` values are in flight.
#[must_use]
pub fn channel(capacity: Option<usize>) -> (Sender<i64>, Receiver<i64>) {
    match capacity {
        Some(cap) => channel::bounded(cap),
        None => channel::unbounded(),
    }
}

impl InputPort for Receiver<i64> {
    fn request_input(&mut self) -> Result<Option<i64>, PortError> {
        self.recv().map(Some).map_err(|_| PortError::Disconnected)
    }
}

impl OutputPort for Sender<i64> {
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError> {
        self.send(value).map_err(|_| PortError::Disconnected)
    }
}

/// An output port that records everything it forwards to `inner`
#[derive(Debug, Clone)]
pub struct Tee<P> {
    inner: P,
    values: Vec<i64>,
}

impl<P: OutputPort> Tee<P> {
    /// Wrap `inner`
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            values: Vec::new(),
        }
    }

    /// Every value delivered so far
    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// The most recently delivered value
    #[must_use]
    pub fn last(&self) -> Option<i64> {
        self.values.last().copied()
    }

    /// Unwrap into the inner port and the recorded values
    pub fn into_parts(self) -> (P, Vec<i64>) {
        (self.inner, self.values)
    }
}

impl<P: OutputPort> OutputPort for Tee<P> {
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError> {
        self.inner.deliver_output(value)?;
        self.values.push(value);
        Ok(())
    }
}

/// An interactive port, prompting for each input on a writer and reading it from a reader
///
/// Lines that don't parse as an integer are rejected and the prompt is repeated. Reaching the end
/// of the reader exhausts the port. Outputs are written one per line.
///
/// ```
/// use intmachine::io::{InputPort, OutputPort, PortError, Prompt};
/// let mut written = Vec::new();
/// let mut prompt = Prompt::new(&b"left\n-1\n"[..], &mut written);
/// assert_eq!(prompt.request_input(), Ok(Some(-1)));
/// assert_eq!(prompt.request_input(), Err(PortError::Exhausted));
/// prompt.deliver_output(7).unwrap();
/// drop(prompt);
/// assert_eq!(
///     String::from_utf8(written).unwrap(),
///     "input: \"left\" is not an integer\ninput: input: 7\n"
/// );
/// ```
#[derive(Debug)]
pub struct Prompt<R, W> {
    reader: R,
    writer: W,
    message: String,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Create a prompt with the default message
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_message(reader, writer, "input: ")
    }

    /// Create a prompt that writes `message` before reading each input
    pub fn with_message(reader: R, writer: W, message: impl Into<String>) -> Self {
        Self {
            reader,
            writer,
            message: message.into(),
        }
    }
}

impl Prompt<io::StdinLock<'static>, Stdout> {
    /// A prompt on the process's standard input and output
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InputPort for Prompt<R, W> {
    fn request_input(&mut self) -> Result<Option<i64>, PortError> {
        let mut line = String::new();
        loop {
            write!(self.writer, "{}", self.message)?;
            self.writer.flush()?;
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(PortError::Exhausted);
            }
            let text = line.trim();
            match text.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.writer, "{text:?} is not an integer")?,
            }
        }
    }
}

impl<R, W: Write> OutputPort for Prompt<R, W> {
    fn deliver_output(&mut self, value: i64) -> Result<(), PortError> {
        writeln!(self.writer, "{value}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspending_port_resumes_after_refill() {
        let mut port = Suspending::new(vec![1]);
        assert_eq!(port.request_input(), Ok(Some(1)));
        assert_eq!(port.request_input(), Ok(None));
    }

    #[test]
    fn rendezvous_channel_round_trip() {
        let (mut tx, mut rx) = channel(Some(0));
        let sender = std::thread::spawn(move || tx.deliver_output(12));
        assert_eq!(rx.request_input(), Ok(Some(12)));
        assert_eq!(sender.join().unwrap(), Ok(()));
        // the sender was dropped when the thread finished
        assert_eq!(rx.request_input(), Err(PortError::Disconnected));
    }

    #[test]
    fn tee_records_forwarded_values() {
        let mut tee = Tee::new(Vec::<i64>::new());
        tee.deliver_output(1).unwrap();
        tee.deliver_output(2).unwrap();
        assert_eq!(tee.last(), Some(2));
        let (inner, recorded) = tee.into_parts();
        assert_eq!(inner, recorded);
    }

    #[test]
    fn tee_does_not_record_failed_sends() {
        let (tx, rx) = channel(None);
        drop(rx);
        let mut tee = Tee::new(tx);
        assert_eq!(tee.deliver_output(1), Err(PortError::Disconnected));
        assert!(tee.values().is_empty());
    }
}
