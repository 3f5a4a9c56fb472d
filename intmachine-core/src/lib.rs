// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Instruction decoding types used throughout the intmachine workspace
#![warn(missing_docs)]

use std::error::Error;
use std::fmt::{self, Display};

/// Parameter mode for an Intcode instruction
///
/// Intcode instruction parameters each have a mode:  [positional], [immediate], or [relative].
///
/// When executing an intcode instruction, the instruction's parameters are interpreted in
/// accordance with their associated modes.
///
/// [positional]: ParamMode::Positional
/// [immediate]: ParamMode::Immediate
/// [relative]: ParamMode::Relative
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum ParamMode {
    /// Positional Mode
    ///
    /// A parameter in positional mode evaluates to the value at the address specified by the
    /// parameter.
    Positional = 0,
    /// Immediate Mode
    ///
    /// A parameter in immediate mode evaluates directly to the value specified. Instructions which
    /// write to memory may not use immediate mode for their destinations.
    #[doc(alias = "#")]
    Immediate = 1,
    /// Relative Mode
    ///
    /// A parameter in relative mode evaluates to the value at the address specified by the
    /// parameter, added to the relative base, which starts out as `0` and is only changed by the
    /// [`Rbo`](OpCode::Rbo) instruction.
    #[doc(alias = "@")]
    Relative = 2,
}

impl ParamMode {
    /// Extract the parameter modes from the provided instruction word
    ///
    /// Digits are read from the absolute value of `word`. Digits above the ten thousands' place
    /// are ignored.
    ///
    /// # Examples
    ///
    /// ```
    ///# use intmachine_core::ParamMode;
    /// assert_eq!(
    ///     ParamMode::extract(21001).unwrap(),
    ///     [
    ///         ParamMode::Positional,
    ///         ParamMode::Immediate,
    ///         ParamMode::Relative,
    ///     ],
    /// );
    /// assert_eq!(ParamMode::extract(99).unwrap(), [ParamMode::Positional; 3]);
    /// assert!(ParamMode::extract(31001).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// If any of the hundreds', thousands', or ten thousands' digits are not `0`, `1`, or `2`,
    /// returns an [`UnknownMode`] containing the mode digit.
    pub fn extract(word: i64) -> Result<[Self; 3], UnknownMode> {
        let word = word.abs();
        Ok([
            ((word / 100) % 10).try_into()?,
            ((word / 1000) % 10).try_into()?,
            ((word / 10000) % 10).try_into()?,
        ])
    }
}

impl Display for ParamMode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamMode::Positional => Ok(()),
            ParamMode::Immediate => write!(fmt, "#"),
            ParamMode::Relative => write!(fmt, "@"),
        }
    }
}

impl TryFrom<i64> for ParamMode {
    type Error = UnknownMode;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            0 => Ok(ParamMode::Positional),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(Self::Error {
                #[allow(clippy::cast_possible_truncation, reason = "single decimal digit")]
                mode_digit: (i % 10) as i8,
            }),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// An unknown mode was specified in an instruction
pub struct UnknownMode {
    mode_digit: i8,
}

impl Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encountered unknown parameter mode {}", self.digit())
    }
}

impl UnknownMode {
    /// Get the digit of the mode as an [`i8`]
    #[must_use]
    pub fn digit(&self) -> i8 {
        self.mode_digit
    }
}

impl Error for UnknownMode {}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
/// An Intcode opcode
///
/// The discriminant of each variant is the two-digit value it is encoded as.
pub enum OpCode {
    /// `dest = a + b`
    Add = 1,
    /// `dest = a * b`
    Mul = 2,
    /// `dest = <next input>`
    In = 3,
    /// deliver `a` as output
    Out = 4,
    /// jump to `b` if `a` is non-zero
    Jnz = 5,
    /// jump to `b` if `a` is zero
    Jz = 6,
    /// `dest = 1` if `a < b`, otherwise `dest = 0`
    Lt = 7,
    /// `dest = 1` if `a == b`, otherwise `dest = 0`
    Eq = 8,
    /// add `a` to the relative base
    Rbo = 9,
    /// do nothing
    Nop = 98,
    /// stop execution
    Halt = 99,
}

impl OpCode {
    /// The number of parameters following the opcode in memory
    ///
    /// ```
    ///# use intmachine_core::OpCode;
    /// assert_eq!(OpCode::Add.param_count(), 3);
    /// assert_eq!(OpCode::Jz.param_count(), 2);
    /// assert_eq!(OpCode::Halt.param_count(), 0);
    /// ```
    #[must_use]
    pub const fn param_count(self) -> usize {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => 3,
            Self::Jnz | Self::Jz => 2,
            Self::In | Self::Out | Self::Rbo => 1,
            Self::Nop | Self::Halt => 0,
        }
    }

    /// The index of the parameter this opcode writes to, if it writes to memory at all
    #[must_use]
    pub const fn writes_to(self) -> Option<usize> {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => Some(2),
            Self::In => Some(0),
            Self::Out | Self::Jnz | Self::Jz | Self::Rbo | Self::Nop | Self::Halt => None,
        }
    }
}

impl TryFrom<i64> for OpCode {
    type Error = i64;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            1 => Ok(Self::Add),
            2 => Ok(Self::Mul),
            3 => Ok(Self::In),
            4 => Ok(Self::Out),
            5 => Ok(Self::Jnz),
            6 => Ok(Self::Jz),
            7 => Ok(Self::Lt),
            8 => Ok(Self::Eq),
            9 => Ok(Self::Rbo),
            98 => Ok(Self::Nop),
            99 => Ok(Self::Halt),
            _ => Err(i),
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Mul => write!(f, "MUL"),
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Jnz => write!(f, "JNZ"),
            Self::Jz => write!(f, "JZ"),
            Self::Lt => write!(f, "LT"),
            Self::Eq => write!(f, "EQ"),
            Self::Rbo => write!(f, "RBO"),
            Self::Nop => write!(f, "NOP"),
            Self::Halt => write!(f, "HALT"),
        }
    }
}

/// A decoded instruction word: an [`OpCode`] and the [`ParamMode`]s of up to 3 parameters
///
/// Modes are kept for all three parameter slots, even those the opcode doesn't use, so that
/// [`encode`](Instruction::encode) reproduces the word that was decoded.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Instruction {
    /// The operation to perform
    pub opcode: OpCode,
    /// The mode of each parameter, with index `0` being the first parameter
    pub modes: [ParamMode; 3],
}

/// An instruction word could not be decoded
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DecodeError {
    /// The word's low two digits are not a known opcode, or the word is negative.
    ///
    /// Contains the entire word.
    UnknownOpcode(i64),
    /// One of the mode digits is not a known mode
    UnknownMode(UnknownMode),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownOpcode(word) => write!(f, "unrecognized opcode in word {word}"),
            DecodeError::UnknownMode(mode) => Display::fmt(mode, f),
        }
    }
}

impl Error for DecodeError {}

impl From<UnknownMode> for DecodeError {
    fn from(mode: UnknownMode) -> Self {
        Self::UnknownMode(mode)
    }
}

impl Instruction {
    /// Decode an instruction word
    ///
    /// The two least significant decimal digits select the opcode, the hundreds' digit is the mode
    /// of the first parameter, the thousands' digit the mode of the second, and the ten thousands'
    /// digit the mode of the third. Missing digits are `0`.
    ///
    /// ```
    /// use intmachine_core::{Instruction, OpCode, ParamMode};
    /// let instr = Instruction::decode(1002).unwrap();
    /// assert_eq!(instr.opcode, OpCode::Mul);
    /// assert_eq!(
    ///     instr.modes,
    ///     [ParamMode::Positional, ParamMode::Immediate, ParamMode::Positional]
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// * If `word` is negative, or its low two digits aren't a known opcode, returns
    ///   [`DecodeError::UnknownOpcode`].
    /// * If a mode digit is unknown, returns [`DecodeError::UnknownMode`].
    pub fn decode(word: i64) -> Result<Self, DecodeError> {
        if word < 0 {
            return Err(DecodeError::UnknownOpcode(word));
        }
        let opcode = OpCode::try_from(word % 100).map_err(|_| DecodeError::UnknownOpcode(word))?;
        let modes = ParamMode::extract(word)?;
        Ok(Self { opcode, modes })
    }

    /// Rebuild the instruction word
    ///
    /// ```
    ///# use intmachine_core::Instruction;
    /// assert_eq!(Instruction::decode(21101).unwrap().encode(), 21101);
    /// ```
    #[must_use]
    pub fn encode(&self) -> i64 {
        self.opcode as i64
            + self.modes[0] as i64 * 100
            + self.modes[1] as i64 * 1000
            + self.modes[2] as i64 * 10000
    }

    /// The instruction word, zero-padded to 5 digits
    ///
    /// ```
    ///# use intmachine_core::Instruction;
    /// assert_eq!(Instruction::decode(99).unwrap().padded(), "00099");
    /// ```
    #[must_use]
    pub fn padded(&self) -> String {
        format!("{:05}", self.encode())
    }

    /// The number of parameters following the instruction word
    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.opcode.param_count()
    }

    /// The distance from this instruction's word to the next instruction's word
    #[must_use]
    pub const fn width(&self) -> i64 {
        1 + self.opcode.param_count() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_five_digit_words() {
        let mut decoded = 0;
        for word in 0..100_000 {
            if let Ok(instr) = Instruction::decode(word) {
                decoded += 1;
                assert_eq!(instr.encode(), word);
                assert_eq!(instr.padded(), format!("{word:05}"));
            }
        }
        // 11 opcodes, each with 3^3 mode combinations
        assert_eq!(decoded, 11 * 27);
    }

    #[test]
    fn high_digits_ignored() {
        let instr = Instruction::decode(1_001_101).unwrap();
        assert_eq!(instr.opcode, OpCode::Add);
        assert_eq!(
            instr.modes,
            [ParamMode::Immediate, ParamMode::Immediate, ParamMode::Positional]
        );
    }

    #[test]
    fn rejects_bad_words() {
        assert_eq!(Instruction::decode(0), Err(DecodeError::UnknownOpcode(0)));
        assert_eq!(Instruction::decode(10), Err(DecodeError::UnknownOpcode(10)));
        assert_eq!(Instruction::decode(-1), Err(DecodeError::UnknownOpcode(-1)));
        match Instruction::decode(301) {
            Err(DecodeError::UnknownMode(m)) => assert_eq!(m.digit(), 3),
            other => panic!("expected unknown mode, got {other:?}"),
        }
    }

    #[test]
    fn write_params_are_within_param_count() {
        for op in [
            OpCode::Add,
            OpCode::Mul,
            OpCode::In,
            OpCode::Out,
            OpCode::Jnz,
            OpCode::Jz,
            OpCode::Lt,
            OpCode::Eq,
            OpCode::Rbo,
            OpCode::Nop,
            OpCode::Halt,
        ] {
            assert_eq!(OpCode::try_from(op as i64), Ok(op));
            if let Some(i) = op.writes_to() {
                assert!(i < op.param_count(), "{op} writes past its parameters");
            }
        }
    }
}
