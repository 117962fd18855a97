//! Width-agnostic count/displacement arrays.
//!
//! Legacy callers hand over 32-bit arrays, large-count callers 64-bit ones.
//! Everything downstream reads through [`TransferDescriptor::count`] and
//! [`TransferDescriptor::displ`] and never looks at the storage width.

use crate::error::{Result, StrataError};

/// Per-destination element counts.
#[derive(Debug, Clone, Copy)]
pub enum CountArray<'a> {
    Narrow(&'a [i32]),
    Wide(&'a [usize]),
}

impl CountArray<'_> {
    pub fn len(&self) -> usize {
        match self {
            CountArray::Narrow(a) => a.len(),
            CountArray::Wide(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count at index `i`. Narrow arrays are validated non-negative at
    /// descriptor construction.
    pub fn get(&self, i: usize) -> usize {
        match self {
            CountArray::Narrow(a) => a[i].max(0) as usize,
            CountArray::Wide(a) => a[i],
        }
    }
}

/// Per-destination displacements, in units of the datatype extent.
#[derive(Debug, Clone, Copy)]
pub enum DispArray<'a> {
    Narrow(&'a [i32]),
    Wide(&'a [isize]),
}

impl DispArray<'_> {
    pub fn len(&self) -> usize {
        match self {
            DispArray::Narrow(a) => a.len(),
            DispArray::Wide(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> isize {
        match self {
            DispArray::Narrow(a) => a[i] as isize,
            DispArray::Wide(a) => a[i],
        }
    }
}

/// A (counts, displacements) pair describing one buffer's per-rank layout.
#[derive(Debug, Clone, Copy)]
pub struct TransferDescriptor<'a> {
    counts: CountArray<'a>,
    displs: DispArray<'a>,
}

impl<'a> TransferDescriptor<'a> {
    /// Descriptor over 32-bit arrays.
    pub fn narrow(counts: &'a [i32], displs: &'a [i32]) -> Result<Self> {
        if let Some((index, &value)) = counts.iter().enumerate().find(|(_, c)| **c < 0) {
            return Err(StrataError::InvalidCount {
                index,
                value: value as i64,
            });
        }
        Self::build(CountArray::Narrow(counts), DispArray::Narrow(displs))
    }

    /// Descriptor over 64-bit arrays.
    pub fn wide(counts: &'a [usize], displs: &'a [isize]) -> Result<Self> {
        Self::build(CountArray::Wide(counts), DispArray::Wide(displs))
    }

    /// Placeholder for ranks where the descriptor is not significant.
    pub fn empty() -> Self {
        Self {
            counts: CountArray::Wide(&[]),
            displs: DispArray::Wide(&[]),
        }
    }

    fn build(counts: CountArray<'a>, displs: DispArray<'a>) -> Result<Self> {
        if counts.len() != displs.len() {
            return Err(StrataError::DescriptorLength {
                expected: counts.len(),
                actual: displs.len(),
            });
        }
        Ok(Self { counts, displs })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, i: usize) -> usize {
        self.counts.get(i)
    }

    pub fn displ(&self, i: usize) -> isize {
        self.displs.get(i)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        (0..self.len()).map(|i| self.count(i)).sum()
    }

    /// Fails unless the descriptor has one entry per communicator rank.
    pub(crate) fn expect_len(&self, expected: usize) -> Result<()> {
        if self.len() != expected {
            return Err(StrataError::DescriptorLength {
                expected,
                actual: self.len(),
            });
        }
        Ok(())
    }
}
