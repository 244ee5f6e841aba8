use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use alnbench_seq::constants::is_gap_byte;
use alnbench_seq::ClosedRange;

use crate::Msa;

/// Per-column character counts of an alignment.
///
/// Each column maps characters to the number of rows displaying them there; gap
/// characters contribute to no entry, so a column's counts sum to at most the row
/// count. `divisor` records the number of rows the counts were drawn from.
/// Characters whose count drops to zero are removed outright, which makes two
/// distributions comparable with `==` regardless of their editing history.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use alnbench_seq::{BioString, Grammar, ParentSeq, Subseq};
/// use alnbench_msa::{CharCountDistribution, Msa};
///
/// let parent = Arc::new(ParentSeq::new(BioString::new("AC", Grammar::Amino)));
/// let mut msa = Msa::new(1, Grammar::Amino);
/// msa.append(Subseq::new(parent.clone())).unwrap();
/// msa.append(Subseq::new(parent)).unwrap();
///
/// let dist = CharCountDistribution::from_msa(&msa);
/// assert_eq!(dist.count_of(1, b'A'), 2);
/// assert_eq!(dist.count_of(2, b'C'), 2);
/// assert_eq!(dist.divisor(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharCountDistribution {
    counts: Vec<HashMap<u8, usize>>,
    divisor: usize,
}

impl CharCountDistribution {
    pub fn new() -> CharCountDistribution {
        CharCountDistribution::default()
    }

    /// Builds the distribution by a full column-wise scan of `msa`.
    pub fn from_msa(msa: &Msa) -> CharCountDistribution {
        let mut dist = CharCountDistribution {
            counts: vec![HashMap::new(); msa.length()],
            divisor: msa.row_count(),
        };
        for row in msa.subseqs() {
            for (column, &byte) in row.gapped().as_bytes().iter().enumerate() {
                dist.add_byte(column + 1, byte);
            }
        }
        dist
    }

    /// The number of columns tracked.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The number of rows the counts were drawn from.
    pub fn divisor(&self) -> usize {
        self.divisor
    }

    pub fn set_divisor(&mut self, divisor: usize) {
        self.divisor = divisor;
    }

    /// The count of `byte` at a 1-based column; zero when absent.
    pub fn count_of(&self, column: usize, byte: u8) -> usize {
        debug_assert!(column >= 1 && column <= self.counts.len(), "column out of range");
        self.counts[column - 1].get(&byte).copied().unwrap_or(0)
    }

    /// The full character mapping of a 1-based column.
    pub fn column(&self, column: usize) -> &HashMap<u8, usize> {
        debug_assert!(column >= 1 && column <= self.counts.len(), "column out of range");
        &self.counts[column - 1]
    }

    /// Increments the count of `byte` at `column`; gap characters are ignored.
    pub fn add_byte(&mut self, column: usize, byte: u8) {
        debug_assert!(column >= 1 && column <= self.counts.len(), "column out of range");
        if is_gap_byte(byte) {
            return;
        }
        *self.counts[column - 1].entry(byte).or_insert(0) += 1;
    }

    /// Decrements the count of `byte` at `column`, dropping the entry at zero;
    /// gap characters are ignored.
    pub fn subtract_byte(&mut self, column: usize, byte: u8) {
        debug_assert!(column >= 1 && column <= self.counts.len(), "column out of range");
        if is_gap_byte(byte) {
            return;
        }
        let mapping = &mut self.counts[column - 1];
        match mapping.get_mut(&byte) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                mapping.remove(&byte);
            }
            None => debug_assert!(false, "subtracting a character that was never counted"),
        }
    }

    /// Adds the non-gap characters of `slice` at consecutive columns starting at
    /// `column`.
    pub fn add_slice(&mut self, column: usize, slice: &[u8]) {
        for (offset, &byte) in slice.iter().enumerate() {
            self.add_byte(column + offset, byte);
        }
    }

    /// Subtracts the non-gap characters of `slice` at consecutive columns starting
    /// at `column`.
    pub fn subtract_slice(&mut self, column: usize, slice: &[u8]) {
        for (offset, &byte) in slice.iter().enumerate() {
            self.subtract_byte(column + offset, byte);
        }
    }

    /// Inserts `count` empty column mappings at the 1-based `column`.
    pub fn insert_columns(&mut self, column: usize, count: usize) {
        debug_assert!(column >= 1 && column <= self.counts.len() + 1, "column out of range");
        self.counts
            .splice(column - 1..column - 1, std::iter::repeat(HashMap::new()).take(count));
    }

    /// Removes the column mappings covered by `range`.
    pub fn remove_columns(&mut self, range: ClosedRange) {
        debug_assert!(range.end <= self.counts.len(), "range out of range");
        self.counts.drain(range.begin - 1..range.end);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.divisor = 0;
    }
}

impl Display for CharCountDistribution {
    /// Prints the distribution as one line per column, characters in ascending
    /// byte order.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, mapping) in self.counts.iter().enumerate() {
            write!(f, "{:4} ", i + 1)?;
            let mut entries: Vec<(&u8, &usize)> = mapping.iter().collect();
            entries.sort_by_key(|(byte, _)| **byte);
            for (byte, count) in entries {
                write!(f, "{}:{} ", *byte as char, count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
