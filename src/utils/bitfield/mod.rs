// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Run-length encoded set of `u64` indices, serialized with the RLE+ format.

mod rleplus;

pub use self::rleplus::{BitReader, BitWriter, RlePlusError};

use itertools::Itertools;
use std::ops::Range;

/// A set of bits stored as sorted, disjoint, non-adjacent ranges of set bits.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BitField {
    ranges: Vec<Range<u64>>,
}

impl BitField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bit field from ranges of set bits, in any order, possibly overlapping.
    pub fn from_ranges(ranges: impl IntoIterator<Item = Range<u64>>) -> Self {
        let ranges = ranges
            .into_iter()
            .filter(|r| !r.is_empty())
            .sorted_by_key(|r| r.start)
            .coalesce(|a, b| {
                if b.start <= a.end {
                    Ok(a.start..a.end.max(b.end))
                } else {
                    Err((a, b))
                }
            })
            .collect();
        Self { ranges }
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.ranges.iter().cloned()
    }

    /// Iterates over the set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    pub fn get(&self, index: u64) -> bool {
        match self.ranges.binary_search_by(|r| {
            if r.end <= index {
                std::cmp::Ordering::Less
            } else if r.start > index {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        }) {
            Ok(_) => true,
            Err(_) => false,
        }
    }

    pub fn set(&mut self, index: u64) {
        if self.get(index) {
            return;
        }
        let ranges = std::mem::take(&mut self.ranges);
        *self = Self::from_ranges(ranges.into_iter().chain(std::iter::once(index..index + 1)));
    }

    pub fn unset(&mut self, index: u64) {
        self.ranges = std::mem::take(&mut self.ranges)
            .into_iter()
            .flat_map(|r| {
                if r.contains(&index) {
                    vec![r.start..index, index + 1..r.end]
                } else {
                    vec![r]
                }
            })
            .filter(|r| !r.is_empty())
            .collect();
    }

    /// Number of set bits.
    pub fn len(&self) -> u64 {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Index of the highest set bit.
    pub fn last(&self) -> Option<u64> {
        self.ranges.last().map(|r| r.end - 1)
    }
}

impl FromIterator<u64> for BitField {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self::from_ranges(iter.into_iter().map(|i| i..i + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_unset() {
        let mut bf: BitField = [1, 2, 3, 7].into_iter().collect();
        assert_eq!(bf.ranges().collect::<Vec<_>>(), vec![1..4, 7..8]);
        bf.set(4);
        bf.set(6);
        assert_eq!(bf.ranges().collect::<Vec<_>>(), vec![1..5, 6..8]);
        bf.unset(2);
        assert_eq!(bf.iter().collect::<Vec<_>>(), vec![1, 3, 4, 6, 7]);
        assert!(bf.get(6));
        assert!(!bf.get(5));
        assert_eq!(bf.len(), 5);
        assert_eq!(bf.last(), Some(7));
    }
}
