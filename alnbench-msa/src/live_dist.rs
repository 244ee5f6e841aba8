use std::collections::VecDeque;

use alnbench_seq::ClosedRange;

use crate::{CharCountDistribution, Msa, MsaEvent, MsaObserver};

/// A change notification emitted by [`LiveMsaCharCountDistribution`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistEvent {
    ColumnsInserted { first: usize, last: usize },
    ColumnsRemoved { first: usize, last: usize },
    DataChanged { first: usize, last: usize },
}

/// A [`CharCountDistribution`] kept synchronized with an [`Msa`] through its
/// event stream.
///
/// Construct it from the alignment's current state, wrap it in
/// `Rc<RefCell<...>>` and subscribe it to the alignment; every subsequent
/// mutation updates the distribution incrementally, without rescanning, and
/// queues the corresponding [`DistEvent`]s for downstream consumers (symbol
/// string builders, colour providers) to drain.
///
/// # Example
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::sync::Arc;
/// use alnbench_seq::{BioString, Grammar, ParentSeq, Subseq};
/// use alnbench_msa::{CharCountDistribution, LiveMsaCharCountDistribution, Msa};
///
/// let parent = Arc::new(ParentSeq::new(BioString::new("ACD", Grammar::Amino)));
/// let mut msa = Msa::new(1, Grammar::Amino);
/// let live = Rc::new(RefCell::new(LiveMsaCharCountDistribution::new(&msa)));
/// msa.subscribe(live.clone());
///
/// msa.append(Subseq::new(parent)).unwrap();
/// assert_eq!(live.borrow().distribution().count_of(2, b'C'), 1);
/// assert_eq!(live.borrow().divisor(), 1);
/// ```
pub struct LiveMsaCharCountDistribution {
    dist: CharCountDistribution,
    events: VecDeque<DistEvent>,
    // all-gap column runs captured in the about-to half of a gap-column removal
    pending_removals: Vec<ClosedRange>,
}

impl LiveMsaCharCountDistribution {
    /// Builds the distribution from the alignment's current state; attach the
    /// result with [`Msa::subscribe`] to keep it live.
    pub fn new(msa: &Msa) -> LiveMsaCharCountDistribution {
        LiveMsaCharCountDistribution {
            dist: CharCountDistribution::from_msa(msa),
            events: VecDeque::new(),
            pending_removals: Vec::new(),
        }
    }

    pub fn distribution(&self) -> &CharCountDistribution {
        &self.dist
    }

    /// The number of alignment rows the counts are drawn from.
    pub fn divisor(&self) -> usize {
        self.dist.divisor()
    }

    /// Drains the queued change notifications in emission order.
    pub fn take_events(&mut self) -> Vec<DistEvent> {
        self.events.drain(..).collect()
    }

    fn push(&mut self, event: DistEvent) {
        self.events.push_back(event);
    }
}

impl MsaObserver for LiveMsaCharCountDistribution {
    fn about_to_change(&mut self, msa: &Msa, event: &MsaEvent) {
        match event {
            MsaEvent::SubseqsRemoved { first, last } => {
                // Subtract the doomed rows while they are still present
                for row in *first..=*last {
                    let bytes = msa.row(row as i32).gapped().as_bytes().to_vec();
                    self.dist.subtract_slice(1, &bytes);
                }
            }
            MsaEvent::GapColumnsRemoved { .. } => {
                self.pending_removals = msa.gap_column_runs();
            }
            MsaEvent::RegionSlid { rect, final_left, final_right, .. } => {
                // Remove the region's old contribution; the changed half adds the
                // new arrangement back
                for row in rect.top..=rect.bottom {
                    let gapped = msa.row(row as i32).gapped();
                    for column in *final_left..=*final_right {
                        self.dist.subtract_byte(column, gapped.byte_at(column));
                    }
                }
            }
            _ => {}
        }
    }

    fn changed(&mut self, msa: &Msa, event: &MsaEvent) {
        match event {
            MsaEvent::SubseqsInserted { first, last } => {
                let was_empty = self.dist.is_empty();
                if was_empty {
                    self.dist = CharCountDistribution::from_msa(msa);
                    if !self.dist.is_empty() {
                        self.push(DistEvent::ColumnsInserted { first: 1, last: msa.length() });
                    }
                } else {
                    for row in *first..=*last {
                        let bytes = msa.row(row as i32).gapped().as_bytes().to_vec();
                        self.dist.add_slice(1, &bytes);
                    }
                    self.dist.set_divisor(msa.row_count());
                    self.push(DistEvent::DataChanged { first: 1, last: msa.length() });
                }
            }
            MsaEvent::SubseqsRemoved { .. } => {
                self.dist.set_divisor(msa.row_count());
                if msa.row_count() == 0 {
                    let length = self.dist.len();
                    self.dist.clear();
                    if length > 0 {
                        self.push(DistEvent::ColumnsRemoved { first: 1, last: length });
                    }
                } else {
                    let length = self.dist.len();
                    self.push(DistEvent::DataChanged { first: 1, last: length });
                }
            }
            MsaEvent::GapColumnsInserted { column, count } => {
                self.dist.insert_columns(*column, *count);
                self.push(DistEvent::ColumnsInserted {
                    first: *column,
                    last: *column + *count - 1,
                });
            }
            MsaEvent::GapColumnsRemoved { .. } => {
                let runs = std::mem::take(&mut self.pending_removals);
                for run in runs.iter().rev() {
                    self.dist.remove_columns(*run);
                    self.push(DistEvent::ColumnsRemoved { first: run.begin, last: run.end });
                }
            }
            MsaEvent::SubseqInternallyChanged { column, new_slice, old_slice, .. } => {
                self.dist.subtract_slice(*column, old_slice.as_bytes());
                self.dist.add_slice(*column, new_slice.as_bytes());
                self.push(DistEvent::DataChanged {
                    first: *column,
                    last: *column + new_slice.len() - 1,
                });
            }
            MsaEvent::RegionSlid { rect, final_left, final_right, .. } => {
                for row in rect.top..=rect.bottom {
                    let gapped = msa.row(row as i32).gapped();
                    for column in *final_left..=*final_right {
                        self.dist.add_byte(column, gapped.byte_at(column));
                    }
                }
                self.push(DistEvent::DataChanged { first: *final_left, last: *final_right });
            }
            MsaEvent::SubseqExtended { column, slice, .. } => {
                self.dist.add_slice(*column, slice.as_bytes());
                self.push(DistEvent::DataChanged {
                    first: *column,
                    last: *column + slice.len() - 1,
                });
            }
            MsaEvent::SubseqTrimmed { column, slice, .. } => {
                self.dist.subtract_slice(*column, slice.as_bytes());
                self.push(DistEvent::DataChanged {
                    first: *column,
                    last: *column + slice.len() - 1,
                });
            }
            MsaEvent::MsaReset => {
                let length = self.dist.len();
                self.dist.clear();
                if length > 0 {
                    self.push(DistEvent::ColumnsRemoved { first: 1, last: length });
                }
            }
            // Row reordering and boundary bookkeeping do not alter column counts;
            // collapses arrive through their per-row internal-change events
            _ => {}
        }
    }
}
