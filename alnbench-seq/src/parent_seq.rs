use crate::{BioString, Grammar};

/// The canonical, ungapped form of a sequence, addressed by its MD5 digest.
///
/// Every alignment row ([`Subseq`](crate::Subseq)) references a `ParentSeq` through
/// an `Arc`, so the backing residues outlive every window cut from them. The digest
/// makes two records with identical residues interchangeable regardless of where
/// they were loaded from.
///
/// # Example
/// ```rust
/// use alnbench_seq::{BioString, Grammar, ParentSeq};
///
/// let parent = ParentSeq::new(BioString::new("AB-CD-EF", Grammar::Amino));
/// assert_eq!(parent.len(), 6);
/// assert_eq!(parent.seq(), &BioString::new("ABCDEF", Grammar::Amino));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentSeq {
    seq: BioString,
    digest: [u8; 16],
}

impl ParentSeq {
    /// Stores the ungapped form of `seq` along with its digest.
    pub fn new(seq: BioString) -> ParentSeq {
        let seq = seq.ungapped();
        let digest = seq.digest();
        ParentSeq { seq, digest }
    }

    pub fn seq(&self) -> &BioString {
        &self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn grammar(&self) -> Grammar {
        self.seq.grammar()
    }

    pub fn digest(&self) -> &[u8; 16] {
        &self.digest
    }
}
