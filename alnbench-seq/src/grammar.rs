/// Identifies the molecular alphabet a [`BioString`](crate::BioString) is written in.
///
/// The grammar is a validation hint rather than a constraint: a `BioString` stores
/// any printable characters regardless of its tag. Grammar-specific operations such
/// as [`complement()`](crate::BioString::complement) and
/// [`transcribe()`](crate::BioString::transcribe) inspect the tag to decide which
/// substitution rules apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Grammar {
    #[default]
    Unknown,
    Amino,
    Dna,
    Rna,
}
