// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Programs, and parsing them from their comma-separated text form

use chumsky::prelude::*;
use itertools::Itertools;
use std::error::Error;
use std::fmt::{self, Display};
use std::ops::Deref;

/// An immutable Intcode program
///
/// Every [`Machine`](crate::Machine) created from a program gets its own copy of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program(Vec<i64>);

/// Parser for comma-separated, optionally signed, base-10 integers
fn program_parser<'a>() -> impl Parser<'a, &'a str, Vec<i64>, extra::Err<Rich<'a, char>>> {
    let int = one_of("+-")
        .or_not()
        .then(text::digits(10))
        .to_slice()
        .try_map(|digits: &str, span| {
            digits
                .parse::<i64>()
                .map_err(|e| Rich::custom(span, format!("{digits:?}: {e}")))
        })
        .labelled("integer");

    int.padded_by(text::inline_whitespace())
        .separated_by(just(','))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(text::whitespace())
        .then_ignore(end())
}

impl Program {
    /// Parse a program from its text form
    ///
    /// ```
    /// use intmachine::Program;
    /// let program = Program::parse("1101,100,-1,4,0\n").unwrap();
    /// assert_eq!(program.as_slice(), &[1101, 100, -1, 4, 0]);
    /// assert!(Program::parse("1,2,three").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// If the text isn't a comma-separated list of integers that each fit in an [`i64`], returns
    /// a [`ProgramParseError`] with the location of each problem.
    pub fn parse(text: &str) -> Result<Self, ProgramParseError<'_>> {
        program_parser()
            .parse(text)
            .into_result()
            .map(Self)
            .map_err(ProgramParseError)
    }

    /// The program's integers
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl Deref for Program {
    type Target = [i64];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<i64>> for Program {
    fn from(v: Vec<i64>) -> Self {
        Self(v)
    }
}

impl FromIterator<i64> for Program {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().format(","))
    }
}

#[derive(Debug)]
/// One or more problems found by [`Program::parse`]
pub struct ProgramParseError<'a>(Vec<Rich<'a, char>>);

impl<'a> ProgramParseError<'a> {
    /// Get the underlying [`chumsky::error::Rich<'_, char>`]s in a slice
    #[must_use]
    pub fn inner(&self) -> &[Rich<'a, char>] {
        self.0.as_slice()
    }

    /// Convert the [`ProgramParseError`] into the underlying [`Vec`] of
    /// [`chumsky::error::Rich<'_, char>`]
    #[must_use]
    pub fn into_inner(self) -> Vec<Rich<'a, char>> {
        self.0
    }

    /// Convert into an error that doesn't borrow from the source text
    #[must_use]
    pub fn into_owned(self) -> ProgramParseError<'static> {
        ProgramParseError(self.0.into_iter().map(Rich::into_owned).collect())
    }
}

impl Display for ProgramParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().format("\n"))
    }
}

impl Error for ProgramParseError<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_and_whitespace() {
        let program = Program::parse("+1, -2 ,3\n").unwrap();
        assert_eq!(program.as_slice(), &[1, -2, 3]);
        assert_eq!(program.to_string(), "1,-2,3");
    }

    #[test]
    fn rejects_bad_text() {
        for text in ["", "1,,2", "1,2,", "1;2", "0x10", "1,2\n3"] {
            assert!(Program::parse(text).is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn out_of_range() {
        let err = Program::parse("1,99999999999999999999").unwrap_err();
        assert_eq!(err.inner().len(), 1);
        assert_eq!(err.inner()[0].span().into_range(), 2..22);
    }

    #[test]
    fn extreme_values() {
        let text = format!("{},{}", i64::MIN, i64::MAX);
        assert_eq!(
            Program::parse(&text).unwrap().as_slice(),
            &[i64::MIN, i64::MAX]
        );
    }
}
