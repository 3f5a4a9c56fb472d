// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! The memory of a single machine: the loaded program, plus a sparse overflow store for every
//! address past its end.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display};
use std::ops::Range;

#[repr(transparent)]
/// Attempted to access the contained negative memory address
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NegativeAddress(pub i64);

impl Display for NegativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not access negative address {}", self.0)
    }
}

impl Error for NegativeAddress {}

// kept in its own module so that visibility rules prevent accidentally creating an Address with a
// negative value
mod address {
    #[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
    /// A non-negative i64, usable as an index into machine memory
    pub struct Address(i64);
    impl Address {
        /// Create a new [`Address`]. If `n` is negative, returns [None]
        #[inline]
        #[must_use]
        pub const fn new(n: i64) -> Option<Self> {
            if n < 0 { None } else { Some(Self(n)) }
        }

        /// get the inner [i64]
        #[inline]
        #[must_use]
        pub const fn get(&self) -> i64 {
            self.0
        }
    }
}

pub use address::Address;

impl TryFrom<i64> for Address {
    type Error = NegativeAddress;
    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Address::new(n).ok_or(NegativeAddress(n))
    }
}

/// Machine memory
///
/// Addresses below [`len_primary`](Memory::len_primary) are stored contiguously; everything else
/// lives in a hash map, and reads as `0` until it's written.
///
/// ```
/// use intmachine::Memory;
/// let mut mem = Memory::new(vec![1, 2, 3]);
/// assert_eq!(mem.read(1), Ok(2));
/// assert_eq!(mem.read(1_000_000), Ok(0));
/// mem.write(1_000_000, 5).unwrap();
/// assert_eq!(mem.read(1_000_000), Ok(5));
/// assert!(mem.read(-1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memory {
    primary: Vec<i64>,
    overflow: HashMap<Address, i64>,
}

impl Memory {
    /// Create memory with `primary` as its contiguous segment
    #[must_use]
    pub fn new(primary: Vec<i64>) -> Self {
        Self {
            primary,
            overflow: HashMap::new(),
        }
    }

    fn primary_index(&self, addr: Address) -> Option<usize> {
        usize::try_from(addr.get())
            .ok()
            .filter(|&i| i < self.primary.len())
    }

    /// Read the value at `addr`
    ///
    /// # Errors
    ///
    /// If `addr` is negative, returns a [`NegativeAddress`] error
    pub fn read(&self, addr: i64) -> Result<i64, NegativeAddress> {
        let addr = Address::try_from(addr)?;
        Ok(self.get(addr))
    }

    /// Read the value at an already-validated address
    #[must_use]
    pub fn get(&self, addr: Address) -> i64 {
        match self.primary_index(addr) {
            Some(i) => self.primary[i],
            None => self.overflow.get(&addr).copied().unwrap_or_default(),
        }
    }

    /// Write `value` to `addr`
    ///
    /// # Errors
    ///
    /// If `addr` is negative, returns a [`NegativeAddress`] error and leaves memory unchanged
    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), NegativeAddress> {
        let addr = Address::try_from(addr)?;
        self.set(addr, value);
        Ok(())
    }

    /// Write `value` to an already-validated address
    pub fn set(&mut self, addr: Address, value: i64) {
        match self.primary_index(addr) {
            Some(i) => self.primary[i] = value,
            None => {
                self.overflow.insert(addr, value);
            }
        }
    }

    /// The length of the contiguous segment, which is the length of the loaded program
    #[must_use]
    pub fn len_primary(&self) -> usize {
        self.primary.len()
    }

    /// The contiguous segment
    #[must_use]
    pub fn primary(&self) -> &[i64] {
        &self.primary
    }

    /// The number of cells written past the end of the contiguous segment
    #[must_use]
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Copy out a range of memory, with unset cells as `0`
    ///
    /// ```
    /// use intmachine::Memory;
    /// let mut mem = Memory::new(vec![7, 8]);
    /// mem.write(3, 9).unwrap();
    /// assert_eq!(mem.get_range(1..5), Ok(vec![8, 0, 9, 0]));
    /// ```
    ///
    /// # Errors
    ///
    /// If the range starts at a negative address, returns [`NegativeAddress`] containing that
    /// address.
    pub fn get_range(&self, range: Range<i64>) -> Result<Vec<i64>, NegativeAddress> {
        Address::try_from(range.start)?;
        Ok(range
            .filter_map(Address::new)
            .map(|addr| self.get(addr))
            .collect())
    }
}

impl From<Vec<i64>> for Memory {
    fn from(primary: Vec<i64>) -> Self {
        Self::new(primary)
    }
}

impl FromIterator<i64> for Memory {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_writes_stay_primary() {
        let mut mem = Memory::new(vec![0; 4]);
        mem.write(3, 42).unwrap();
        assert_eq!(mem.primary(), &[0, 0, 0, 42]);
        assert_eq!(mem.overflow_len(), 0);
    }

    #[test]
    fn sparse_reads_and_writes() {
        let mut mem = Memory::new(vec![1, 2]);
        assert_eq!(mem.read(2), Ok(0));
        assert_eq!(mem.read(i64::MAX), Ok(0));
        mem.write(2, -7).unwrap();
        mem.write(i64::MAX, 11).unwrap();
        assert_eq!(mem.read(2), Ok(-7));
        assert_eq!(mem.read(i64::MAX), Ok(11));
        assert_eq!(mem.primary(), &[1, 2]);
        assert_eq!(mem.overflow_len(), 2);
    }

    #[test]
    fn negative_addresses_rejected() {
        let mut mem = Memory::new(vec![1]);
        assert_eq!(mem.read(-1), Err(NegativeAddress(-1)));
        assert_eq!(mem.write(-5, 1), Err(NegativeAddress(-5)));
        assert_eq!(mem.get_range(-1..1), Err(NegativeAddress(-1)));
        assert_eq!(mem, Memory::new(vec![1]));
    }
}
