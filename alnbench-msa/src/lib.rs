//! Observable editing of multiple sequence alignments.
//!
//! The centre of this crate is [`Msa`](crate::Msa): an ordered collection of
//! equal-length [`Subseq`](alnbench_seq::Subseq) rows that exposes the fine-grained
//! mutation primitives an alignment editor needs (slide, collapse, extend, trim,
//! level, gap-column surgery, row reordering) while keeping the alignment
//! invariants intact. Every mutation is announced to subscribed
//! [`MsaObserver`](crate::MsaObserver)s as a pair of structured
//! [`MsaEvent`](crate::MsaEvent)s, one before and one after the change, which is
//! enough for any derived view to reconstruct its state incrementally.
//!
//! [`LiveMsaCharCountDistribution`](crate::LiveMsaCharCountDistribution) is the
//! reference consumer: a per-column character histogram
//! ([`CharCountDistribution`](crate::CharCountDistribution)) kept synchronized with
//! an alignment purely through the event stream.

mod errors;
mod events;
mod msa;
mod char_count;
mod live_dist;

pub use errors::MsaError;
pub use events::*;
pub use msa::*;
pub use char_count::*;
pub use live_dist::*;
