use std::sync::Arc;

use crate::constants::{is_gap_byte, DEFAULT_GAP_CHARACTER};
use crate::{BioString, ClosedRange, Grammar, ParentSeq};

/// An editable, gapped window over a [`ParentSeq`].
///
/// A `Subseq` owns its gapped [`BioString`] and tracks the 1-based, inclusive
/// window `[start, stop]` of parent residues it displays. The defining invariant,
/// maintained by every operation, is that the non-gap characters of the gapped
/// string equal exactly `parent[start..=stop]`; consequently a `Subseq` always
/// contains at least one non-gap character.
///
/// Gap-only edits (insert/remove gaps, slide, collapse) never touch `start` or
/// `stop`. Moving a boundary trims residues into gaps or consumes adjacent parent
/// residues, growing the gapped string when the window no longer fits.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use alnbench_seq::{BioString, Grammar, ParentSeq, Subseq};
///
/// let parent = Arc::new(ParentSeq::new(BioString::new("ABCDEF", Grammar::Amino)));
/// let mut subseq = Subseq::new(parent);
/// assert!(subseq.set_gapped(BioString::new("-C---DE--", Grammar::Amino)));
/// assert_eq!(subseq.start(), 3);
/// assert_eq!(subseq.stop(), 5);
/// assert_eq!(subseq.ungapped_length(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct Subseq {
    parent: Arc<ParentSeq>,
    gapped: BioString,
    start: usize,
    stop: usize,
    label: String,
    modified: bool,
}

impl Subseq {
    /// Constructs a `Subseq` spanning the entire parent sequence.
    pub fn new(parent: Arc<ParentSeq>) -> Subseq {
        assert!(!parent.is_empty(), "cannot attach a Subseq to an empty parent");
        let gapped = parent.seq().clone();
        let stop = gapped.len();
        Subseq { parent, gapped, start: 1, stop, label: String::new(), modified: false }
    }

    pub fn parent(&self) -> &Arc<ParentSeq> {
        &self.parent
    }

    pub fn gapped(&self) -> &BioString {
        &self.gapped
    }

    pub fn grammar(&self) -> Grammar {
        self.gapped.grammar()
    }

    /// The gapped length, i.e. the number of alignment columns this row occupies.
    pub fn len(&self) -> usize {
        self.gapped.len()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn stop(&self) -> usize {
        self.stop
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// The character at a 1-based column.
    pub fn at(&self, position: usize) -> u8 {
        self.gapped.byte_at(position)
    }

    pub fn head_gaps(&self) -> usize {
        self.gapped.head_gaps()
    }

    pub fn tail_gaps(&self) -> usize {
        self.gapped.tail_gaps()
    }

    pub fn ungapped_length(&self) -> usize {
        self.stop - self.start + 1
    }

    /// The 1-based column of the first non-gap character.
    pub fn first_non_gap_column(&self) -> usize {
        self.head_gaps() + 1
    }

    /// The 1-based column of the last non-gap character.
    pub fn last_non_gap_column(&self) -> usize {
        self.gapped.len() - self.tail_gaps()
    }

    /// Adopts `gapped` as the new window content iff its ungapped form occurs as a
    /// contiguous substring of the parent; `start` and `stop` snap to the first
    /// occurrence.
    pub fn set_gapped(&mut self, gapped: BioString) -> bool {
        let ungapped = gapped.ungapped();
        if ungapped.is_empty() {
            return false;
        }
        match self.parent.seq().find(&ungapped) {
            Some(start) => {
                self.stop = start + ungapped.len() - 1;
                self.start = start;
                self.gapped = gapped;
                self.modified = true;
                true
            }
            None => false,
        }
    }

    /// Commits a precomputed gap-only rearrangement of the current content. The
    /// replacement must have the same length, grammar and residue sequence; `start`
    /// and `stop` are untouched.
    pub fn rearrange_gaps(&mut self, gapped: BioString) -> bool {
        if gapped.len() != self.gapped.len()
            || gapped.grammar() != self.gapped.grammar()
            || gapped.ungapped() != self.gapped.ungapped()
        {
            return false;
        }
        self.gapped = gapped;
        self.modified = true;
        true
    }

    // ---------------------------------------------------------------------------
    // Gap-only edits; none of these move start or stop

    pub fn insert_gaps(&mut self, position: usize, count: usize, gap_char: u8) {
        self.gapped.insert_gaps(position, count, gap_char);
        self.modified = true;
    }

    pub fn remove_gaps(&mut self, position: usize, count: usize) {
        self.gapped.remove_gaps_at(position, count);
        self.modified = true;
    }

    pub fn slide(&mut self, range: ClosedRange, delta: isize) -> isize {
        let moved = self.gapped.slide(range, delta);
        if moved != 0 {
            self.modified = true;
        }
        moved
    }

    pub fn collapse_left(&mut self, range: ClosedRange) -> Option<ClosedRange> {
        let affected = self.gapped.collapse_left(range);
        if affected.is_some() {
            self.modified = true;
        }
        affected
    }

    pub fn collapse_right(&mut self, range: ClosedRange) -> Option<ClosedRange> {
        let affected = self.gapped.collapse_right(range);
        if affected.is_some() {
            self.modified = true;
        }
        affected
    }

    // ---------------------------------------------------------------------------
    // Boundary movement

    /// Moves the left window boundary to the parent position `new_start`.
    ///
    /// * `new_start < start`: the intervening parent residues replace leading gaps;
    ///   whatever does not fit is prepended, growing the string.
    /// * `start < new_start <= stop`: the first `new_start - start` residues are
    ///   rewritten to gaps.
    /// * `new_start > stop`: the whole window is rewritten to gaps and the residue
    ///   at `new_start` placed (or appended) beyond it; `stop` follows.
    ///
    /// Returns false when `new_start` lies outside the parent sequence.
    ///
    /// # Example
    /// ```rust
    /// use std::sync::Arc;
    /// use alnbench_seq::{BioString, Grammar, ParentSeq, Subseq};
    ///
    /// let parent = Arc::new(ParentSeq::new(BioString::new("ABCDEF", Grammar::Amino)));
    /// let mut subseq = Subseq::new(parent);
    /// assert!(subseq.set_gapped(BioString::new("-C---DE--", Grammar::Amino)));
    /// assert!(subseq.set_start(1));
    /// assert_eq!(subseq.gapped(), &"ABC---DE--");
    /// ```
    pub fn set_start(&mut self, new_start: usize) -> bool {
        if new_start == self.start {
            return true;
        }
        if new_start < 1 || new_start > self.parent.len() {
            return false;
        }

        let head_gaps = self.gapped.head_gaps();
        let parent = self.parent.clone();

        if new_start < self.start {
            let n_new = self.start - new_start;
            if n_new <= head_gaps {
                // Replace the tail of the leading gap run with the new residues
                let residues = parent.seq().mid(ClosedRange::new(new_start, self.start - 1));
                self.gapped.replace(head_gaps - n_new + 1, n_new, &residues);
            } else {
                if head_gaps > 0 {
                    let fitting = parent
                        .seq()
                        .mid(ClosedRange::new(self.start - head_gaps, self.start - 1));
                    self.gapped.replace(1, head_gaps, &fitting);
                }
                let remainder = parent
                    .seq()
                    .mid(ClosedRange::new(new_start, self.start - head_gaps - 1));
                self.gapped.prepend(&remainder);
            }
        } else if new_start <= self.stop {
            self.gap_out_from_left(new_start - self.start, head_gaps);
        } else {
            // The start crosses the old stop: every window residue becomes a gap
            // and the window shrinks to the single residue at new_start
            let tail_gaps = self.gapped.tail_gaps();
            let last_non_gap_column = self.gapped.len() - tail_gaps;
            self.gap_out_from_left(self.stop - self.start + 1, head_gaps);

            let intermediate_gaps = new_start - self.stop - 1;
            let target_column = last_non_gap_column + intermediate_gaps + 1;
            if target_column <= self.gapped.len() {
                self.gapped.set_byte(target_column, parent.seq().byte_at(new_start));
            } else {
                let gap_count = intermediate_gaps - tail_gaps;
                let end = self.gapped.len() + 1;
                self.gapped.insert_gaps(end, gap_count, DEFAULT_GAP_CHARACTER);
                self.gapped.push(parent.seq().byte_at(new_start));
            }
            self.stop = new_start;
        }

        self.start = new_start;
        self.modified = true;
        true
    }

    /// Moves the right window boundary to the parent position `new_stop`; the
    /// mirror image of [`set_start()`](Subseq::set_start).
    pub fn set_stop(&mut self, new_stop: usize) -> bool {
        if new_stop == self.stop {
            return true;
        }
        if new_stop < 1 || new_stop > self.parent.len() {
            return false;
        }

        let tail_gaps = self.gapped.tail_gaps();
        let parent = self.parent.clone();

        if new_stop > self.stop {
            let n_new = new_stop - self.stop;
            let first_tail_column = self.gapped.len() - tail_gaps + 1;
            if n_new <= tail_gaps {
                let residues = parent.seq().mid(ClosedRange::new(self.stop + 1, new_stop));
                self.gapped.replace(first_tail_column, n_new, &residues);
            } else {
                if tail_gaps > 0 {
                    let fitting = parent
                        .seq()
                        .mid(ClosedRange::new(self.stop + 1, self.stop + tail_gaps));
                    self.gapped.replace(first_tail_column, tail_gaps, &fitting);
                }
                let remainder = parent
                    .seq()
                    .mid(ClosedRange::new(self.stop + tail_gaps + 1, new_stop));
                self.gapped.append(&remainder);
            }
        } else if new_stop >= self.start {
            self.gap_out_from_right(self.stop - new_stop, tail_gaps);
        } else {
            // The stop crosses the old start
            let head_gaps = self.gapped.head_gaps();
            let first_non_gap_column = head_gaps + 1;
            self.gap_out_from_right(self.stop - self.start + 1, tail_gaps);

            let intermediate_gaps = self.start - new_stop - 1;
            if head_gaps >= intermediate_gaps + 1 {
                let target_column = first_non_gap_column - intermediate_gaps - 1;
                self.gapped.set_byte(target_column, parent.seq().byte_at(new_stop));
            } else {
                let gap_count = intermediate_gaps - head_gaps;
                self.gapped.insert_gaps(1, gap_count, DEFAULT_GAP_CHARACTER);
                let residue = BioString::new([parent.seq().byte_at(new_stop)], self.gapped.grammar());
                self.gapped.insert(1, &residue);
            }
            self.start = new_stop;
        }

        self.stop = new_stop;
        self.modified = true;
        true
    }

    /// Moves the start by up to `delta` positions, clamped to the parent bounds.
    /// Returns the number of positions actually moved.
    pub fn move_start(&mut self, delta: isize) -> usize {
        let old_start = self.start;
        let new_start = clamp_to_parent(self.start, delta, self.parent.len());
        self.set_start(new_start);
        self.start.abs_diff(old_start)
    }

    /// Moves the stop by up to `delta` positions, clamped to the parent bounds.
    /// Returns the number of positions actually moved.
    pub fn move_stop(&mut self, delta: isize) -> usize {
        let old_stop = self.stop;
        let new_stop = clamp_to_parent(self.stop, delta, self.parent.len());
        self.set_stop(new_stop);
        self.stop.abs_diff(old_stop)
    }

    // Rewrites the first `count` non-gap characters to gaps, scanning rightwards
    // from the end of the leading gap run.
    fn gap_out_from_left(&mut self, count: usize, head_gaps: usize) {
        let mut remaining = count;
        let mut column = head_gaps + 1;
        while remaining > 0 {
            if !is_gap_byte(self.gapped.byte_at(column)) {
                self.gapped.gap_out(column);
                remaining -= 1;
            }
            column += 1;
        }
    }

    // Rewrites the last `count` non-gap characters to gaps, scanning leftwards
    // from the start of the trailing gap run.
    fn gap_out_from_right(&mut self, count: usize, tail_gaps: usize) {
        let mut remaining = count;
        let mut column = self.gapped.len() - tail_gaps;
        while remaining > 0 {
            if !is_gap_byte(self.gapped.byte_at(column)) {
                self.gapped.gap_out(column);
                remaining -= 1;
            }
            column -= 1;
        }
    }
}

fn clamp_to_parent(position: usize, delta: isize, parent_length: usize) -> usize {
    let target = position as isize + delta;
    if target < 1 {
        1
    } else if target as usize > parent_length {
        parent_length
    } else {
        target as usize
    }
}
