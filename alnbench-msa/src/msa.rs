use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use log::debug;

use alnbench_seq::constants::{is_gap_byte, DEFAULT_GAP_CHARACTER};
use alnbench_seq::{BioString, ClosedRange, Grammar, Subseq};

use crate::{MsaError, MsaEvent, MsaObserver, MsaRect};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    Stop,
}

impl Side {
    fn opposite(self) -> Side {
        match self {
            Side::Start => Side::Stop,
            Side::Stop => Side::Start,
        }
    }
}

/// An ordered collection of equal-length [`Subseq`] rows forming an alignment.
///
/// Invariants, enforced on every mutation:
///  - all rows have identical gapped length (the alignment `length`);
///  - all rows carry the alignment's [`Grammar`];
///  - no row is ever empty of non-gap characters.
///
/// Rows are addressed with 1-based indices; negative indices count from the tail,
/// so `msa.row(-1)` is the last row. Observers subscribed through
/// [`subscribe()`](Msa::subscribe) receive an
/// [`about_to_change`](MsaObserver::about_to_change)/[`changed`](MsaObserver::changed)
/// pair for every mutation.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use alnbench_seq::{BioString, Grammar, ParentSeq, Subseq};
/// use alnbench_msa::Msa;
///
/// let parent = Arc::new(ParentSeq::new(BioString::new("ABCDEF", Grammar::Amino)));
/// let mut msa = Msa::new(1, Grammar::Amino);
/// msa.append(Subseq::new(parent.clone())).unwrap();
/// msa.append(Subseq::new(parent)).unwrap();
/// assert_eq!(msa.row_count(), 2);
/// assert_eq!(msa.length(), 6);
/// assert_eq!(msa.row(-1).gapped(), &"ABCDEF");
/// ```
pub struct Msa {
    id: u64,
    grammar: Grammar,
    name: String,
    description: String,
    rows: Vec<Subseq>,
    observers: Vec<Rc<RefCell<dyn MsaObserver>>>,
}

impl Msa {
    pub fn new(id: u64, grammar: Grammar) -> Msa {
        Msa {
            id,
            grammar,
            name: String::new(),
            description: String::new(),
            rows: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The common gapped length of all rows; zero for an empty alignment.
    pub fn length(&self) -> usize {
        self.rows.first().map_or(0, |row| row.len())
    }

    /// The row at a 1-based index; negative indices address from the tail.
    pub fn row(&self, index: i32) -> &Subseq {
        &self.rows[self.row_index(index)]
    }

    /// Bounds-checked row access.
    pub fn at(&self, index: i32) -> Option<&Subseq> {
        if index == 0 {
            return None;
        }
        let count = self.rows.len() as i32;
        let normalized = if index > 0 { index - 1 } else { count + index };
        if normalized < 0 || normalized >= count {
            None
        } else {
            Some(&self.rows[normalized as usize])
        }
    }

    pub fn subseqs(&self) -> &[Subseq] {
        &self.rows
    }

    // ---------------------------------------------------------------------------
    // Observer plumbing

    pub fn subscribe(&mut self, observer: Rc<RefCell<dyn MsaObserver>>) {
        self.observers.push(observer);
    }

    pub fn unsubscribe(&mut self, observer: &Rc<RefCell<dyn MsaObserver>>) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    fn emit_about(&self, event: &MsaEvent) {
        let observers = self.observers.clone();
        for observer in observers {
            observer.borrow_mut().about_to_change(self, event);
        }
    }

    fn emit_changed(&self, event: &MsaEvent) {
        let observers = self.observers.clone();
        for observer in observers {
            observer.borrow_mut().changed(self, event);
        }
    }

    fn emit_pair(&self, event: &MsaEvent) {
        self.emit_about(event);
        self.emit_changed(event);
    }

    // ---------------------------------------------------------------------------
    // Row membership

    pub fn append(&mut self, subseq: Subseq) -> Result<(), MsaError> {
        let position = self.rows.len() + 1;
        self.insert(position, subseq)
    }

    pub fn prepend(&mut self, subseq: Subseq) -> Result<(), MsaError> {
        self.insert(1, subseq)
    }

    /// Inserts a row at a 1-based position in `1..=row_count + 1`. The row must
    /// match the alignment grammar and, unless the alignment is empty, its length.
    pub fn insert(&mut self, position: usize, subseq: Subseq) -> Result<(), MsaError> {
        debug_assert!(position >= 1 && position <= self.rows.len() + 1, "position out of range");
        if subseq.grammar() != self.grammar {
            return Err(MsaError::GrammarMismatch);
        }
        if !self.rows.is_empty() && subseq.len() != self.length() {
            return Err(MsaError::RowLengthMismatch {
                expected: self.length(),
                found: subseq.len(),
            });
        }

        let event = MsaEvent::SubseqsInserted { first: position, last: position };
        self.emit_about(&event);
        self.rows.insert(position - 1, subseq);
        self.emit_changed(&event);
        Ok(())
    }

    pub fn remove_first(&mut self) -> Subseq {
        self.remove_at(1)
    }

    pub fn remove_last(&mut self) -> Subseq {
        self.remove_at(-1)
    }

    pub fn remove_at(&mut self, index: i32) -> Subseq {
        let row0 = self.row_index(index);
        let event = MsaEvent::SubseqsRemoved { first: row0 + 1, last: row0 + 1 };
        self.emit_about(&event);
        let subseq = self.rows.remove(row0);
        self.emit_changed(&event);
        subseq
    }

    /// Removes every row. The reset pair is emitted even when the alignment was
    /// already empty.
    pub fn clear(&mut self) {
        let event = MsaEvent::MsaReset;
        self.emit_about(&event);
        self.rows.clear();
        self.emit_changed(&event);
    }

    // ---------------------------------------------------------------------------
    // Row reordering

    pub fn swap(&mut self, first: i32, second: i32) {
        let a = self.row_index(first);
        let b = self.row_index(second);
        if a == b {
            return;
        }
        let event = MsaEvent::SubseqsSwapped { first: a + 1, second: b + 1 };
        self.emit_about(&event);
        self.rows.swap(a, b);
        self.emit_changed(&event);
    }

    pub fn move_row(&mut self, from: i32, to: i32) {
        let from0 = self.row_index(from);
        let to0 = self.row_index(to);
        if from0 == to0 {
            return;
        }
        let event = MsaEvent::SubseqsMoved { first: from0 + 1, last: from0 + 1, destination: to0 + 1 };
        self.emit_about(&event);
        let subseq = self.rows.remove(from0);
        self.rows.insert(to0, subseq);
        self.emit_changed(&event);
    }

    /// Moves the block of rows `from..=to` so that it begins at row `destination`
    /// in the final arrangement.
    pub fn move_row_range(&mut self, from: i32, to: i32, destination: i32) {
        let (from0, to0) = self.normalize_row_span(from, to);
        let dest0 = self.row_index(destination);
        let block_len = to0 - from0 + 1;
        debug_assert!(dest0 + block_len <= self.rows.len(), "destination out of range");
        if dest0 == from0 {
            return;
        }
        let event = MsaEvent::SubseqsMoved {
            first: from0 + 1,
            last: to0 + 1,
            destination: dest0 + 1,
        };
        self.emit_about(&event);
        let block: Vec<Subseq> = self.rows.drain(from0..=to0).collect();
        for (offset, subseq) in block.into_iter().enumerate() {
            self.rows.insert(dest0 + offset, subseq);
        }
        self.emit_changed(&event);
    }

    /// Moves a single row by up to `delta` positions; returns the signed distance
    /// actually moved.
    pub fn move_row_relative(&mut self, index: i32, delta: isize) -> isize {
        let from0 = self.row_index(index);
        let target = (from0 as isize + delta).clamp(0, self.rows.len() as isize - 1) as usize;
        let actual = target as isize - from0 as isize;
        if actual != 0 {
            self.move_row(from0 as i32 + 1, target as i32 + 1);
        }
        actual
    }

    /// Moves a block of rows by up to `delta` positions; returns the signed
    /// distance actually moved.
    pub fn move_row_range_relative(&mut self, from: i32, to: i32, delta: isize) -> isize {
        let (from0, to0) = self.normalize_row_span(from, to);
        let block_len = to0 - from0 + 1;
        let max_dest = self.rows.len() - block_len;
        let target = (from0 as isize + delta).clamp(0, max_dest as isize) as usize;
        let actual = target as isize - from0 as isize;
        if actual != 0 {
            self.move_row_range(from0 as i32 + 1, to0 as i32 + 1, target as i32 + 1);
        }
        actual
    }

    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&Subseq, &Subseq) -> Ordering,
    {
        let event = MsaEvent::SubseqsSorted;
        self.emit_about(&event);
        self.rows.sort_by(|a, b| compare(a, b));
        self.emit_changed(&event);
    }

    // ---------------------------------------------------------------------------
    // Gap column surgery

    pub fn insert_gap_columns(&mut self, column: usize, count: usize) {
        self.insert_gap_columns_with(column, count, DEFAULT_GAP_CHARACTER);
    }

    /// Inserts `count` identical gap columns at the 1-based `column` across every
    /// row.
    pub fn insert_gap_columns_with(&mut self, column: usize, count: usize, gap_char: u8) {
        debug_assert!(column >= 1 && column <= self.length() + 1, "column out of range");
        if count == 0 || self.rows.is_empty() {
            return;
        }
        let event = MsaEvent::GapColumnsInserted { column, count };
        self.emit_about(&event);
        for row in self.rows.iter_mut() {
            row.insert_gaps(column, count, gap_char);
        }
        self.emit_changed(&event);
    }

    /// Removes every column in which all rows carry a gap; returns the number of
    /// columns removed.
    pub fn remove_gap_columns(&mut self) -> usize {
        let runs = self.gap_column_runs();
        let count: usize = runs.iter().map(|run| run.len()).sum();
        if count == 0 {
            return 0;
        }
        debug!("removing {} all-gap columns in {} runs", count, runs.len());

        let event = MsaEvent::GapColumnsRemoved { count };
        self.emit_about(&event);
        for run in runs.iter().rev() {
            for row in self.rows.iter_mut() {
                row.remove_gaps(run.begin, run.len());
            }
        }
        self.emit_changed(&event);
        count
    }

    /// The maximal runs of columns consisting purely of gaps, in ascending column
    /// order.
    pub fn gap_column_runs(&self) -> Vec<ClosedRange> {
        let mut runs: Vec<ClosedRange> = Vec::new();
        let mut run_start: Option<usize> = None;
        for column in 1..=self.length() {
            let all_gaps = self.rows.iter().all(|row| is_gap_byte(row.at(column)));
            match (all_gaps, run_start) {
                (true, None) => run_start = Some(column),
                (false, Some(start)) => {
                    runs.push(ClosedRange::new(start, column - 1));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            runs.push(ClosedRange::new(start, self.length()));
        }
        runs
    }

    // ---------------------------------------------------------------------------
    // Region editing

    /// Slides the characters of `rect` horizontally by up to `delta` positions,
    /// clamped so the rectangle moves as a block. Returns the signed distance
    /// actually moved.
    pub fn slide_region(&mut self, rect: MsaRect, delta: isize) -> isize {
        let rect = rect.normalized();
        debug_assert!(self.is_valid_rect(rect), "invalid rect");
        if delta == 0 {
            return 0;
        }

        let range = ClosedRange::new(rect.left, rect.right);
        let mut limit = usize::MAX;
        for row0 in rect.top - 1..rect.bottom {
            let gapped = self.rows[row0].gapped();
            let room = if delta < 0 {
                gapped.left_slidable_positions(range)
            } else {
                gapped.right_slidable_positions(range)
            };
            limit = limit.min(room);
        }

        let distance = limit.min(delta.unsigned_abs());
        if distance == 0 {
            return 0;
        }
        let actual = if delta < 0 { -(distance as isize) } else { distance as isize };
        let (final_left, final_right) = if actual < 0 {
            (rect.left - distance, rect.right)
        } else {
            (rect.left, rect.right + distance)
        };

        let event = MsaEvent::RegionSlid { rect, delta: actual, final_left, final_right };
        self.emit_about(&event);
        for row0 in rect.top - 1..rect.bottom {
            self.rows[row0].slide(range, actual);
        }
        self.emit_changed(&event);
        actual
    }

    /// Packs the non-gap characters of every row in `rect` against its left edge.
    pub fn collapse_left(&mut self, rect: MsaRect) {
        self.collapse(rect, true);
    }

    /// Packs the non-gap characters of every row in `rect` against its right edge.
    pub fn collapse_right(&mut self, rect: MsaRect) {
        self.collapse(rect, false);
    }

    fn collapse(&mut self, rect: MsaRect, leftward: bool) {
        let rect = rect.normalized();
        debug_assert!(self.is_valid_rect(rect), "invalid rect");

        let range = ClosedRange::new(rect.left, rect.right);

        // Compute each row's rearrangement up front so that every event, the
        // "about to" halves included, carries the final payload.
        let mut changes: Vec<(usize, ClosedRange, BioString, BioString, BioString)> = Vec::new();
        for row0 in rect.top - 1..rect.bottom {
            let mut rearranged = self.rows[row0].gapped().clone();
            let affected = if leftward {
                rearranged.collapse_left(range)
            } else {
                rearranged.collapse_right(range)
            };
            if let Some(affected) = affected {
                let old_slice = self.rows[row0].gapped().mid(affected);
                let new_slice = rearranged.mid(affected);
                changes.push((row0, affected, rearranged, old_slice, new_slice));
            }
        }
        if changes.is_empty() {
            return;
        }

        let outer = if leftward {
            let affected_column = changes.iter().map(|c| c.1.end).max().unwrap_or(rect.right);
            MsaEvent::CollapsedLeft { rect, affected_column }
        } else {
            let affected_column = changes.iter().map(|c| c.1.begin).min().unwrap_or(rect.left);
            MsaEvent::CollapsedRight { rect, affected_column }
        };

        self.emit_about(&outer);
        for (row0, affected, rearranged, old_slice, new_slice) in changes {
            let event = MsaEvent::SubseqInternallyChanged {
                row: row0 + 1,
                column: affected.begin,
                new_slice,
                old_slice,
            };
            self.emit_about(&event);
            let committed = self.rows[row0].rearrange_gaps(rearranged);
            debug_assert!(committed, "collapse must preserve the residue sequence");
            self.emit_changed(&event);
        }
        self.emit_changed(&outer);
    }

    // ---------------------------------------------------------------------------
    // Window boundary editing

    /// Moves the start of `row`'s window to the parent position `new_start`,
    /// inserting gap columns across the whole alignment first whenever the move
    /// needs more room than the row has. Returns false iff `new_start` lies
    /// outside the row's parent sequence.
    pub fn set_subseq_start(&mut self, row: i32, new_start: usize) -> bool {
        let row0 = self.row_index(row);
        let (start, stop, head_gaps, tail_gaps, parent_length) = {
            let subseq = &self.rows[row0];
            (
                subseq.start(),
                subseq.stop(),
                subseq.head_gaps(),
                subseq.tail_gaps(),
                subseq.parent().len(),
            )
        };
        if new_start < 1 || new_start > parent_length {
            return false;
        }
        if new_start == start {
            return true;
        }

        if new_start < start {
            let needed = (start - new_start).saturating_sub(head_gaps);
            if needed > 0 {
                self.insert_gap_columns(1, needed);
            }
        } else if new_start > stop {
            let needed = (new_start - stop).saturating_sub(tail_gaps);
            if needed > 0 {
                let end = self.length() + 1;
                self.insert_gap_columns(end, needed);
            }
        }

        if let Some(range) = self.move_boundary(row0, Side::Start, new_start) {
            self.emit_pair(&MsaEvent::ExtendOrTrimFinished {
                first_column: range.begin,
                last_column: range.end,
            });
        }
        true
    }

    /// Moves the stop of `row`'s window to the parent position `new_stop`; the
    /// mirror image of [`set_subseq_start()`](Msa::set_subseq_start).
    pub fn set_subseq_stop(&mut self, row: i32, new_stop: usize) -> bool {
        let row0 = self.row_index(row);
        let (start, stop, head_gaps, tail_gaps, parent_length) = {
            let subseq = &self.rows[row0];
            (
                subseq.start(),
                subseq.stop(),
                subseq.head_gaps(),
                subseq.tail_gaps(),
                subseq.parent().len(),
            )
        };
        if new_stop < 1 || new_stop > parent_length {
            return false;
        }
        if new_stop == stop {
            return true;
        }

        if new_stop > stop {
            let needed = (new_stop - stop).saturating_sub(tail_gaps);
            if needed > 0 {
                let end = self.length() + 1;
                self.insert_gap_columns(end, needed);
            }
        } else if new_stop < start {
            let needed = (start - new_stop).saturating_sub(head_gaps);
            if needed > 0 {
                self.insert_gap_columns(1, needed);
            }
        }

        if let Some(range) = self.move_boundary(row0, Side::Stop, new_stop) {
            self.emit_pair(&MsaEvent::ExtendOrTrimFinished {
                first_column: range.begin,
                last_column: range.end,
            });
        }
        true
    }

    /// For every row in `top..=bottom` whose leading gap region covers `column`,
    /// replaces leading gaps with the parent residues N-terminal of the window,
    /// consuming the space between `column` and the row's first non-gap character.
    pub fn extend_subseqs_left(&mut self, top: i32, bottom: i32, column: usize) {
        debug_assert!(column >= 1 && column <= self.length(), "column out of range");
        let (top0, bottom0) = self.normalize_row_span(top, bottom);

        let mut union: Option<ClosedRange> = None;
        for row0 in top0..=bottom0 {
            let (head_gaps, start) = {
                let subseq = &self.rows[row0];
                (subseq.head_gaps(), subseq.start())
            };
            if column > head_gaps || start <= 1 {
                continue;
            }
            let extension = (head_gaps + 1 - column).min(start - 1);
            let changed = self.move_boundary(row0, Side::Start, start - extension);
            union = union_ranges(union, changed);
        }
        self.finish_extend_or_trim(union);
    }

    /// The mirror image of [`extend_subseqs_left()`](Msa::extend_subseqs_left).
    pub fn extend_subseqs_right(&mut self, top: i32, bottom: i32, column: usize) {
        debug_assert!(column >= 1 && column <= self.length(), "column out of range");
        let (top0, bottom0) = self.normalize_row_span(top, bottom);

        let mut union: Option<ClosedRange> = None;
        for row0 in top0..=bottom0 {
            let (last_non_gap, stop, parent_length) = {
                let subseq = &self.rows[row0];
                (subseq.last_non_gap_column(), subseq.stop(), subseq.parent().len())
            };
            if column <= last_non_gap || stop >= parent_length {
                continue;
            }
            let extension = (column - last_non_gap).min(parent_length - stop);
            let changed = self.move_boundary(row0, Side::Stop, stop + extension);
            union = union_ranges(union, changed);
        }
        self.finish_extend_or_trim(union);
    }

    /// For every row in `top..=bottom`, replaces the non-gap characters at columns
    /// `<= column` with gaps, never removing a row's last non-gap character.
    pub fn trim_subseqs_left(&mut self, top: i32, bottom: i32, column: usize) {
        debug_assert!(column >= 1 && column <= self.length(), "column out of range");
        let (top0, bottom0) = self.normalize_row_span(top, bottom);

        let mut union: Option<ClosedRange> = None;
        for row0 in top0..=bottom0 {
            let (trimmable, start) = {
                let subseq = &self.rows[row0];
                let covered = subseq.gapped().non_gaps_between(ClosedRange::new(1, column));
                (covered.min(subseq.ungapped_length() - 1), subseq.start())
            };
            if trimmable == 0 {
                continue;
            }
            let changed = self.move_boundary(row0, Side::Start, start + trimmable);
            union = union_ranges(union, changed);
        }
        self.finish_extend_or_trim(union);
    }

    /// The mirror image of [`trim_subseqs_left()`](Msa::trim_subseqs_left): trims
    /// non-gap characters at columns `>= column`.
    pub fn trim_subseqs_right(&mut self, top: i32, bottom: i32, column: usize) {
        debug_assert!(column >= 1 && column <= self.length(), "column out of range");
        let (top0, bottom0) = self.normalize_row_span(top, bottom);

        let mut union: Option<ClosedRange> = None;
        for row0 in top0..=bottom0 {
            let (trimmable, stop) = {
                let subseq = &self.rows[row0];
                let covered = subseq
                    .gapped()
                    .non_gaps_between(ClosedRange::new(column, self.length()));
                (covered.min(subseq.ungapped_length() - 1), subseq.stop())
            };
            if trimmable == 0 {
                continue;
            }
            let changed = self.move_boundary(row0, Side::Stop, stop - trimmable);
            union = union_ranges(union, changed);
        }
        self.finish_extend_or_trim(union);
    }

    /// Moves every row's left non-gap boundary to exactly `column`: residues at
    /// columns left of `column` are trimmed away first, then the boundary is
    /// extended back out to `column` with parent residues as far as the window
    /// and the one-residue minimum allow. A boundary residue separated from the
    /// rest of the row by gaps therefore packs inwards rather than being lost.
    pub fn level_subseqs_left(&mut self, top: i32, bottom: i32, column: usize) {
        debug_assert!(column >= 1 && column <= self.length(), "column out of range");
        let (top0, bottom0) = self.normalize_row_span(top, bottom);

        let mut union: Option<ClosedRange> = None;
        for row0 in top0..=bottom0 {
            // Trim everything left of the target column
            let (trimmable, start) = {
                let subseq = &self.rows[row0];
                let covered = if column > 1 {
                    subseq
                        .gapped()
                        .non_gaps_between(ClosedRange::new(1, column - 1))
                } else {
                    0
                };
                (covered.min(subseq.ungapped_length() - 1), subseq.start())
            };
            if trimmable > 0 {
                let changed = self.move_boundary(row0, Side::Start, start + trimmable);
                union = union_ranges(union, changed);
            }

            // Extend back out so the first residue lands on the target column
            let (first_non_gap, start) = {
                let subseq = &self.rows[row0];
                (subseq.first_non_gap_column(), subseq.start())
            };
            if column < first_non_gap && start > 1 {
                let extension = (first_non_gap - column).min(start - 1);
                let changed = self.move_boundary(row0, Side::Start, start - extension);
                union = union_ranges(union, changed);
            }
        }
        self.finish_extend_or_trim(union);
    }

    /// Moves every row's right non-gap boundary to exactly `column`; the mirror
    /// image of [`level_subseqs_left()`](Msa::level_subseqs_left).
    pub fn level_subseqs_right(&mut self, top: i32, bottom: i32, column: usize) {
        debug_assert!(column >= 1 && column <= self.length(), "column out of range");
        let (top0, bottom0) = self.normalize_row_span(top, bottom);

        let mut union: Option<ClosedRange> = None;
        for row0 in top0..=bottom0 {
            let (trimmable, stop) = {
                let subseq = &self.rows[row0];
                let covered = if column < self.length() {
                    subseq
                        .gapped()
                        .non_gaps_between(ClosedRange::new(column + 1, self.length()))
                } else {
                    0
                };
                (covered.min(subseq.ungapped_length() - 1), subseq.stop())
            };
            if trimmable > 0 {
                let changed = self.move_boundary(row0, Side::Stop, stop - trimmable);
                union = union_ranges(union, changed);
            }

            let (last_non_gap, stop, parent_length) = {
                let subseq = &self.rows[row0];
                (subseq.last_non_gap_column(), subseq.stop(), subseq.parent().len())
            };
            if column > last_non_gap && stop < parent_length {
                let extension = (column - last_non_gap).min(parent_length - stop);
                let changed = self.move_boundary(row0, Side::Stop, stop + extension);
                union = union_ranges(union, changed);
            }
        }
        self.finish_extend_or_trim(union);
    }

    // ---------------------------------------------------------------------------
    // Internals

    fn finish_extend_or_trim(&self, union: Option<ClosedRange>) {
        if let Some(range) = union {
            self.emit_pair(&MsaEvent::ExtendOrTrimFinished {
                first_column: range.begin,
                last_column: range.end,
            });
        }
    }

    // Applies one boundary move to a row, emitting the boundary-change and
    // extend/trim event pairs, and returns the union of changed columns. A move
    // that crosses the opposite boundary is decomposed into two phases: first the
    // far boundary extends to the target, then the near boundary trims to it,
    // which matches the event stream an editor expects. The caller must have
    // grown the alignment beforehand so the move fits in place.
    fn move_boundary(&mut self, row0: usize, side: Side, target: usize) -> Option<ClosedRange> {
        let old = self.rows[row0].clone();
        let row = row0 + 1;

        let crossing = match side {
            Side::Start => target > old.stop(),
            Side::Stop => target < old.start(),
        };

        let mut events: Vec<MsaEvent> = Vec::new();
        let mut union: Option<ClosedRange> = None;
        let final_row;

        if crossing {
            let mut middle = old.clone();
            let extended = match side {
                Side::Start => middle.set_stop(target),
                Side::Stop => middle.set_start(target),
            };
            debug_assert!(extended);
            let mut finished = middle.clone();
            let trimmed = match side {
                Side::Start => finished.set_start(target),
                Side::Stop => finished.set_stop(target),
            };
            debug_assert!(trimmed);

            let (phase_events, phase_range) = boundary_phase(&old, &middle, row, side.opposite());
            events.extend(phase_events);
            union = union_ranges(union, phase_range);
            let (phase_events, phase_range) = boundary_phase(&middle, &finished, row, side);
            events.extend(phase_events);
            union = union_ranges(union, phase_range);
            final_row = finished;
        } else {
            let mut finished = old.clone();
            let moved = match side {
                Side::Start => finished.set_start(target),
                Side::Stop => finished.set_stop(target),
            };
            debug_assert!(moved);
            let (phase_events, phase_range) = boundary_phase(&old, &finished, row, side);
            events.extend(phase_events);
            union = union_ranges(union, phase_range);
            final_row = finished;
        }

        debug_assert_eq!(final_row.len(), old.len(), "boundary move must fit in place");

        for event in &events {
            self.emit_about(event);
        }
        self.rows[row0] = final_row;
        for event in &events {
            self.emit_changed(event);
        }
        union
    }

    fn row_index(&self, index: i32) -> usize {
        debug_assert!(index != 0, "row indices are 1-based; 0 is invalid");
        let count = self.rows.len() as i32;
        let normalized = if index > 0 { index - 1 } else { count + index };
        debug_assert!(normalized >= 0 && normalized < count, "row index out of range");
        normalized as usize
    }

    fn normalize_row_span(&self, top: i32, bottom: i32) -> (usize, usize) {
        let a = self.row_index(top);
        let b = self.row_index(bottom);
        (a.min(b), a.max(b))
    }

    fn is_valid_rect(&self, rect: MsaRect) -> bool {
        rect.left >= 1
            && rect.right <= self.length()
            && rect.top >= 1
            && rect.bottom <= self.rows.len()
    }
}

// Computes the events describing one boundary-move phase by comparing a row
// before and after. A phase either extends (gaps became residues) or trims
// (residues became gaps); the emitted slice spans first to last changed column.
fn boundary_phase(
    old: &Subseq,
    new: &Subseq,
    row: usize,
    side: Side,
) -> (Vec<MsaEvent>, Option<ClosedRange>) {
    debug_assert_eq!(old.len(), new.len());

    let old_bytes = old.gapped().as_bytes();
    let new_bytes = new.gapped().as_bytes();

    let mut extended: Option<(usize, usize)> = None;
    let mut trimmed: Option<(usize, usize)> = None;
    for position in 0..old_bytes.len() {
        let was_gap = is_gap_byte(old_bytes[position]);
        let now_gap = is_gap_byte(new_bytes[position]);
        if was_gap && !now_gap {
            grow_span(&mut extended, position);
        } else if !was_gap && now_gap {
            grow_span(&mut trimmed, position);
        }
    }

    let mut events = Vec::new();
    match side {
        Side::Start => {
            if new.start() != old.start() {
                events.push(MsaEvent::SubseqStartChanged {
                    row,
                    new_start: new.start(),
                    old_start: old.start(),
                });
            }
        }
        Side::Stop => {
            if new.stop() != old.stop() {
                events.push(MsaEvent::SubseqStopChanged {
                    row,
                    new_stop: new.stop(),
                    old_stop: old.stop(),
                });
            }
        }
    }
    if let Some((first, last)) = extended {
        events.push(MsaEvent::SubseqExtended {
            row,
            column: first + 1,
            slice: new.gapped().mid(ClosedRange::new(first + 1, last + 1)),
        });
    }
    if let Some((first, last)) = trimmed {
        events.push(MsaEvent::SubseqTrimmed {
            row,
            column: first + 1,
            slice: old.gapped().mid(ClosedRange::new(first + 1, last + 1)),
        });
    }

    let changed = union_ranges(
        extended.map(|(a, b)| ClosedRange::new(a + 1, b + 1)),
        trimmed.map(|(a, b)| ClosedRange::new(a + 1, b + 1)),
    );
    (events, changed)
}

fn grow_span(span: &mut Option<(usize, usize)>, position: usize) {
    match span {
        None => *span = Some((position, position)),
        Some((_, last)) => *last = position,
    }
}

fn union_ranges(a: Option<ClosedRange>, b: Option<ClosedRange>) -> Option<ClosedRange> {
    match (a, b) {
        (None, other) => other,
        (other, None) => other,
        (Some(a), Some(b)) => Some(ClosedRange::new(a.begin.min(b.begin), a.end.max(b.end))),
    }
}
