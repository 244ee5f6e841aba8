use displaydoc::Display;
use thiserror::Error;

#[derive(Debug, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
/// Errors raised when an alignment invariant would be violated
pub enum MsaError {
    /// Expected a row of length {expected}, got a row of length {found}
    RowLengthMismatch {
        /// the alignment length
        expected: usize,
        /// the length of the rejected row
        found: usize,
    },
    /// The row grammar does not match the alignment grammar
    GrammarMismatch,
}
