use std::fmt;

use log::warn;

use crate::constants::{is_gap_byte, DEFAULT_GAP_CHARACTER};
use crate::{ClosedRange, Grammar};

const MIN_ASCII_VAL: u8 = 32;
const MAX_ASCII_VAL: u8 = 126;

const COMPLEMENT_QUERY: &[u8] = b"ABCDGHKMTVabcdghkmtv";
const COMPLEMENT_REPLACEMENT: &[u8] = b"TVGHCDMKABtvghcdmkab";

/// A gapped biological sequence: printable 8-bit characters tagged with a [`Grammar`].
///
/// Whitespace is stripped on construction; every stored byte lies in the printable
/// ASCII range `32..=126`. The two gap characters, `-` and `.`, are equivalent for
/// all gap-aware queries but are stored verbatim, so editing operations never lose
/// which gap style a column was written with.
///
/// All positions are 1-based and all ranges are closed (see [`ClosedRange`]).
///
/// # Example
/// ```rust
/// use alnbench_seq::{BioString, Grammar};
///
/// let bs = BioString::new("AB --C.D", Grammar::Amino);
/// assert_eq!(bs.len(), 7);
/// assert_eq!(bs.ungapped_length(), 4);
/// assert_eq!(bs.ungapped(), BioString::new("ABCD", Grammar::Amino));
/// ```
#[derive(Clone, Debug, Eq)]
pub struct BioString {
    bytes: Vec<u8>,
    grammar: Grammar,
}

impl BioString {
    /// Constructs a `BioString` from raw characters, stripping all whitespace.
    pub fn new(seq: impl AsRef<[u8]>, grammar: Grammar) -> BioString {
        let bytes: Vec<u8> = seq
            .as_ref()
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        debug_assert!(
            bytes.iter().all(|&b| (MIN_ASCII_VAL..=MAX_ASCII_VAL).contains(&b)),
            "BioString characters must be printable ASCII"
        );
        BioString { bytes, grammar }
    }

    /// An empty sequence with the given grammar.
    pub fn empty(grammar: Grammar) -> BioString {
        BioString { bytes: Vec::new(), grammar }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn set_grammar(&mut self, grammar: Grammar) {
        self.grammar = grammar;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The byte at a 1-based position.
    pub fn byte_at(&self, position: usize) -> u8 {
        debug_assert!(self.is_valid_position(position), "position out of range");
        self.bytes[position - 1]
    }

    /// Overwrites the byte at a 1-based position.
    pub fn set_byte(&mut self, position: usize, byte: u8) {
        debug_assert!(self.is_valid_position(position), "position out of range");
        debug_assert!((MIN_ASCII_VAL..=MAX_ASCII_VAL).contains(&byte), "byte out of range");
        self.bytes[position - 1] = byte;
    }

    pub fn is_valid_position(&self, position: usize) -> bool {
        position >= 1 && position <= self.bytes.len()
    }

    pub fn is_valid_range(&self, range: ClosedRange) -> bool {
        self.is_valid_position(range.begin) && self.is_valid_position(range.end)
    }

    // ---------------------------------------------------------------------------
    // Editing

    pub fn push(&mut self, byte: u8) {
        debug_assert!((MIN_ASCII_VAL..=MAX_ASCII_VAL).contains(&byte), "byte out of range");
        self.bytes.push(byte);
    }

    pub fn append(&mut self, other: &BioString) {
        debug_assert!(self.grammar == other.grammar, "incompatible grammar");
        self.bytes.extend_from_slice(&other.bytes);
    }

    pub fn prepend(&mut self, other: &BioString) {
        debug_assert!(self.grammar == other.grammar, "incompatible grammar");
        self.bytes.splice(0..0, other.bytes.iter().copied());
    }

    /// Inserts `other` at a 1-based position in `1..=len + 1`. Insertion happens at
    /// the given index, not after the character at that index.
    ///
    /// # Example
    /// ```rust
    /// use alnbench_seq::{BioString, Grammar};
    ///
    /// let mut bs = BioString::new("ABCDEF", Grammar::Amino);
    /// bs.insert(6, &BioString::new("---", Grammar::Amino));
    /// assert_eq!(bs, "ABCDE---F");
    /// ```
    pub fn insert(&mut self, position: usize, other: &BioString) {
        debug_assert!(position >= 1 && position <= self.bytes.len() + 1, "position out of range");
        self.bytes.splice(position - 1..position - 1, other.bytes.iter().copied());
    }

    /// Inserts `count` copies of `gap_char` at a 1-based position in `1..=len + 1`.
    pub fn insert_gaps(&mut self, position: usize, count: usize, gap_char: u8) {
        debug_assert!(position >= 1 && position <= self.bytes.len() + 1, "position out of range");
        debug_assert!(
            (MIN_ASCII_VAL..=MAX_ASCII_VAL).contains(&gap_char),
            "gap_char out of range"
        );
        if count == 0 {
            return;
        }
        self.bytes
            .splice(position - 1..position - 1, std::iter::repeat(gap_char).take(count));
    }

    /// Removes `count` characters starting at a 1-based position.
    pub fn remove(&mut self, position: usize, count: usize) {
        debug_assert!(self.is_valid_position(position), "position out of range");
        debug_assert!(position + count - 1 <= self.bytes.len(), "count out of range");
        self.bytes.drain(position - 1..position - 1 + count);
    }

    pub fn remove_range(&mut self, range: ClosedRange) {
        debug_assert!(self.is_valid_range(range), "invalid range");
        self.remove(range.begin, range.len());
    }

    /// Strips every gap character.
    pub fn remove_gaps(&mut self) {
        self.bytes.retain(|&b| !is_gap_byte(b));
    }

    /// Removes `count` contiguous gaps starting at `position`. Every removed
    /// character must be a gap.
    pub fn remove_gaps_at(&mut self, position: usize, count: usize) {
        debug_assert!(self.is_valid_position(position), "position out of range");
        if count == 0 {
            return;
        }
        debug_assert_eq!(
            count,
            self.gaps_between(ClosedRange::new(position, position + count - 1)),
            "positions to remove must all be gaps"
        );
        self.bytes.drain(position - 1..position - 1 + count);
    }

    /// Replaces `count` characters starting at `position` with `replacement`. A
    /// count of zero behaves identically to an insert.
    pub fn replace(&mut self, position: usize, count: usize, replacement: &BioString) {
        debug_assert!(position >= 1 && position <= self.bytes.len() + 1, "position out of range");
        debug_assert!(position + count - 1 <= self.bytes.len(), "count out of range");
        self.bytes
            .splice(position - 1..position - 1 + count, replacement.bytes.iter().copied());
    }

    pub fn replace_range(&mut self, range: ClosedRange, replacement: &BioString) {
        debug_assert!(self.is_valid_range(range), "invalid range");
        self.replace(range.begin, range.len(), replacement);
    }

    /// The substring covered by `range`, carrying the same grammar.
    pub fn mid(&self, range: ClosedRange) -> BioString {
        debug_assert!(self.is_valid_range(range), "invalid range");
        BioString {
            bytes: self.bytes[range.begin - 1..range.end].to_vec(),
            grammar: self.grammar,
        }
    }

    /// A copy with every gap character removed.
    pub fn ungapped(&self) -> BioString {
        BioString {
            bytes: self.bytes.iter().copied().filter(|&b| !is_gap_byte(b)).collect(),
            grammar: self.grammar,
        }
    }

    /// The number of non-gap characters.
    pub fn ungapped_length(&self) -> usize {
        self.bytes.iter().filter(|&&b| !is_gap_byte(b)).count()
    }

    // ---------------------------------------------------------------------------
    // Gap queries

    /// The number of leading gap characters.
    pub fn head_gaps(&self) -> usize {
        self.bytes.iter().take_while(|&&b| is_gap_byte(b)).count()
    }

    /// The number of trailing gap characters.
    pub fn tail_gaps(&self) -> usize {
        self.bytes.iter().rev().take_while(|&&b| is_gap_byte(b)).count()
    }

    pub fn gaps_between(&self, range: ClosedRange) -> usize {
        debug_assert!(self.is_valid_range(range), "invalid range");
        self.bytes[range.begin - 1..range.end]
            .iter()
            .filter(|&&b| is_gap_byte(b))
            .count()
    }

    pub fn non_gaps_between(&self, range: ClosedRange) -> usize {
        range.len() - self.gaps_between(range)
    }

    /// The number of contiguous gaps immediately left of `position`; the character
    /// at `position` itself is not considered.
    ///
    /// # Example
    /// ```rust
    /// use alnbench_seq::{BioString, Grammar};
    ///
    /// let bs = BioString::new("AB----CD", Grammar::Dna);
    /// assert_eq!(bs.gaps_left_of(3), 0);
    /// assert_eq!(bs.gaps_left_of(7), 4);
    /// assert_eq!(bs.gaps_left_of(8), 0);
    /// ```
    pub fn gaps_left_of(&self, position: usize) -> usize {
        debug_assert!(self.is_valid_position(position), "position out of range");
        self.bytes[..position - 1]
            .iter()
            .rev()
            .take_while(|&&b| is_gap_byte(b))
            .count()
    }

    /// The number of contiguous gaps immediately right of `position`; the character
    /// at `position` itself is not considered.
    pub fn gaps_right_of(&self, position: usize) -> usize {
        debug_assert!(self.is_valid_position(position), "position out of range");
        self.bytes[position..].iter().take_while(|&&b| is_gap_byte(b)).count()
    }

    pub fn has_gaps(&self) -> bool {
        self.bytes.iter().any(|&b| is_gap_byte(b))
    }

    pub fn has_non_gaps(&self) -> bool {
        self.bytes.iter().any(|&b| !is_gap_byte(b))
    }

    pub fn has_gap_at(&self, position: usize) -> bool {
        debug_assert!(self.is_valid_position(position), "position out of range");
        is_gap_byte(self.bytes[position - 1])
    }

    // ---------------------------------------------------------------------------
    // Slide algebra

    /// How far the characters within `range` may slide to the left.
    ///
    /// A segment containing non-gap characters may only displace the gap characters
    /// immediately adjacent on its left side; a segment of pure gaps may travel all
    /// the way to the sequence start.
    ///
    /// # Example
    /// ```rust
    /// use alnbench_seq::{BioString, ClosedRange, Grammar};
    ///
    /// let bs = BioString::new("AB--C-D-E", Grammar::Amino);
    /// assert_eq!(bs.left_slidable_positions(ClosedRange::new(5, 7)), 2);
    /// assert_eq!(bs.left_slidable_positions(ClosedRange::new(6, 6)), 5);
    /// assert_eq!(bs.left_slidable_positions(ClosedRange::new(3, 5)), 0);
    /// ```
    pub fn left_slidable_positions(&self, range: ClosedRange) -> usize {
        debug_assert!(self.is_valid_range(range), "invalid range");
        if self.non_gaps_between(range) > 0 {
            self.gaps_left_of(range.begin)
        } else {
            range.begin - 1
        }
    }

    /// How far the characters within `range` may slide to the right.
    pub fn right_slidable_positions(&self, range: ClosedRange) -> usize {
        debug_assert!(self.is_valid_range(range), "invalid range");
        if self.non_gaps_between(range) > 0 {
            self.gaps_right_of(range.end)
        } else {
            self.bytes.len() - range.end
        }
    }

    /// Horizontally slides the characters in `range` by up to `delta` positions
    /// (negative values slide left), exchanging places with the displaced
    /// characters. The displaced bytes are preserved verbatim, so sliding right and
    /// then back left restores the sequence byte for byte.
    ///
    /// Returns the signed distance actually moved.
    ///
    /// # Example
    /// ```rust
    /// use alnbench_seq::{BioString, ClosedRange, Grammar};
    ///
    /// let mut bs = BioString::new("ABC--D-EF--GH", Grammar::Amino);
    /// assert_eq!(bs.slide(ClosedRange::new(6, 9), -1), -1);
    /// assert_eq!(bs, "ABC-D-EF---GH");
    /// ```
    pub fn slide(&mut self, range: ClosedRange, delta: isize) -> isize {
        debug_assert!(self.is_valid_range(range), "invalid range");

        if delta < 0 {
            let distance = delta.unsigned_abs().min(self.left_slidable_positions(range));
            if distance == 0 {
                return 0;
            }
            let begin = range.begin - 1;
            let end = range.end;
            // Keep the exact gap representation left of the range, move the range,
            // then restore the displaced characters on the right.
            let displaced = self.bytes[begin - distance..begin].to_vec();
            self.bytes.copy_within(begin..end, begin - distance);
            self.bytes[end - distance..end].copy_from_slice(&displaced);
            -(distance as isize)
        } else if delta > 0 {
            let distance = (delta as usize).min(self.right_slidable_positions(range));
            if distance == 0 {
                return 0;
            }
            let begin = range.begin - 1;
            let end = range.end;
            let displaced = self.bytes[end..end + distance].to_vec();
            self.bytes.copy_within(begin..end, begin + distance);
            self.bytes[begin..begin + distance].copy_from_slice(&displaced);
            distance as isize
        } else {
            0
        }
    }

    // ---------------------------------------------------------------------------
    // Collapse algebra

    /// Maximally packs the non-gap characters of `range` against its left edge.
    /// Characters exchange places with the gaps they displace, so gap identity is
    /// preserved.
    ///
    /// Returns the smallest subrange whose bytes actually changed, or `None` if the
    /// range was already packed.
    pub fn collapse_left(&mut self, range: ClosedRange) -> Option<ClosedRange> {
        debug_assert!(self.is_valid_range(range), "invalid range");

        let begin = range.begin - 1;
        let end = range.end;

        let first_gap = (begin..end).find(|&i| is_gap_byte(self.bytes[i]))?;

        let mut gap = first_gap;
        let mut affected: Option<(usize, usize)> = None;
        for i in first_gap + 1..end {
            if !is_gap_byte(self.bytes[i]) {
                self.bytes.swap(gap, i);
                if affected.is_none() {
                    affected = Some((gap, i));
                } else if let Some(a) = affected.as_mut() {
                    a.1 = i;
                }
                gap += 1;
            }
        }

        affected.map(|(first, last)| ClosedRange::new(first + 1, last + 1))
    }

    /// Maximally packs the non-gap characters of `range` against its right edge.
    pub fn collapse_right(&mut self, range: ClosedRange) -> Option<ClosedRange> {
        debug_assert!(self.is_valid_range(range), "invalid range");

        let begin = range.begin - 1;
        let end = range.end;

        let first_gap = (begin..end).rev().find(|&i| is_gap_byte(self.bytes[i]))?;

        let mut gap = first_gap;
        let mut affected: Option<(usize, usize)> = None;
        for i in (begin..first_gap).rev() {
            if !is_gap_byte(self.bytes[i]) {
                self.bytes.swap(gap, i);
                if affected.is_none() {
                    affected = Some((i, gap));
                } else if let Some(a) = affected.as_mut() {
                    a.0 = i;
                }
                gap -= 1;
            }
        }

        affected.map(|(first, last)| ClosedRange::new(first + 1, last + 1))
    }

    // ---------------------------------------------------------------------------
    // Search and equivalence

    /// The 1-based position of the first occurrence of `needle`, comparing bytes
    /// only. Empty needles never match.
    pub fn find(&self, needle: &BioString) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.bytes.len() {
            return None;
        }
        self.bytes
            .windows(needle.len())
            .position(|window| window == needle.as_bytes())
            .map(|i| i + 1)
    }

    /// True iff both sequences share a grammar, a length, and, position by
    /// position, either identical characters or two gap characters.
    ///
    /// # Example
    /// ```rust
    /// use alnbench_seq::{BioString, Grammar};
    ///
    /// let x = BioString::new("ABC...DEF", Grammar::Amino);
    /// assert!(x.is_equivalent_to(&BioString::new("ABC---DEF", Grammar::Amino)));
    /// assert!(!x.is_equivalent_to(&BioString::new("AB----DEF", Grammar::Amino)));
    /// ```
    pub fn is_equivalent_to(&self, other: &BioString) -> bool {
        if self.grammar != other.grammar || self.bytes.len() != other.bytes.len() {
            return false;
        }
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .all(|(&a, &b)| a == b || (is_gap_byte(a) && is_gap_byte(b)))
    }

    // ---------------------------------------------------------------------------
    // Grammar operations

    /// The DNA complement, using the IUPAC pairing
    /// `ABCDGHKMTV <-> TVGHCDMKAB` (plus lower case). `N`, `S` and `W` are their
    /// own complements.
    pub fn complement(&self) -> BioString {
        let mut dna = BioString { bytes: self.bytes.clone(), grammar: Grammar::Dna };
        dna.tr_map(COMPLEMENT_QUERY, COMPLEMENT_REPLACEMENT);
        dna
    }

    /// Reverses the sequence in place.
    pub fn reverse(&mut self) {
        self.bytes.reverse();
    }

    pub fn reverse_complement(&self) -> BioString {
        let mut dna = self.complement();
        dna.reverse();
        dna
    }

    /// The RNA transcript: `T -> U`, grammar retagged to [`Grammar::Rna`].
    pub fn transcribe(&self) -> BioString {
        if self.grammar != Grammar::Dna {
            warn!("transcribe(): unexpected grammar {:?}", self.grammar);
        }
        let mut rna = BioString { bytes: self.bytes.clone(), grammar: Grammar::Rna };
        rna.tr_map(b"Tt", b"Uu");
        rna
    }

    /// The DNA template: `U -> T`, grammar retagged to [`Grammar::Dna`].
    pub fn back_transcribe(&self) -> BioString {
        if self.grammar != Grammar::Rna {
            warn!("back_transcribe(): unexpected grammar {:?}", self.grammar);
        }
        let mut dna = BioString { bytes: self.bytes.clone(), grammar: Grammar::Dna };
        dna.tr_map(b"Uu", b"Tt");
        dna
    }

    /// True iff this is a gapless, non-empty, even-length DNA sequence equal to its
    /// reverse complement.
    pub fn is_palindrome(&self) -> bool {
        self.grammar == Grammar::Dna
            && !self.is_empty()
            && self.bytes.len() % 2 == 0
            && !self.has_gaps()
            && *self == self.reverse_complement()
    }

    // ---------------------------------------------------------------------------
    // Character translation

    /// Rewrites every gap character, whichever of the two styles it is, to `gap_char`.
    pub fn translate_gaps(&mut self, gap_char: u8) {
        debug_assert!(
            (MIN_ASCII_VAL..=MAX_ASCII_VAL).contains(&gap_char),
            "gap_char out of range"
        );
        for byte in self.bytes.iter_mut() {
            if is_gap_byte(*byte) {
                *byte = gap_char;
            }
        }
    }

    /// Replaces every occurrence of `before` with `after`.
    pub fn tr(&mut self, before: u8, after: u8) {
        for byte in self.bytes.iter_mut() {
            if *byte == before {
                *byte = after;
            }
        }
    }

    /// Parallel character translation: the character at index `i` of `query` is
    /// rewritten to index `i` of `replacement`. When a letter appears several times
    /// in `query`, the lowest index wins.
    pub fn tr_map(&mut self, query: &[u8], replacement: &[u8]) {
        debug_assert_eq!(query.len(), replacement.len(), "unequal query and replacement");
        for byte in self.bytes.iter_mut() {
            if let Some(i) = query.iter().position(|q| q == byte) {
                *byte = replacement[i];
            }
        }
    }

    /// The MD5 digest of the raw byte content, used for content addressing.
    pub fn digest(&self) -> [u8; 16] {
        md5::compute(&self.bytes).0
    }
}

impl PartialEq for BioString {
    fn eq(&self, other: &BioString) -> bool {
        self.grammar == other.grammar && self.bytes == other.bytes
    }
}

impl PartialEq<&str> for BioString {
    /// Byte-wise comparison against a raw string, ignoring the grammar.
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl fmt::Display for BioString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

// Gap-placement helper shared with the default gap character
impl BioString {
    /// Rewrites the character at `position` to the default gap character.
    pub(crate) fn gap_out(&mut self, position: usize) {
        self.set_byte(position, DEFAULT_GAP_CHARACTER);
    }
}
