//! Character sets shared across the alnbench crates.

use once_cell::sync::Lazy;

/// Characters interpreted as alignment gaps. Both are treated identically by every
/// gap-aware operation, but each is stored verbatim.
pub const GAP_CHARACTERS: [u8; 2] = [b'-', b'.'];

/// The gap character written by editing operations that synthesize new gaps.
pub const DEFAULT_GAP_CHARACTER: u8 = b'-';

/// The twenty basic amino acid codes in strict alphabetical order.
///
/// The neural-network stage of the prediction pipeline feeds per-residue scores in
/// this exact order.
pub const AMINO_BASIC_CHARACTERS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// The four basic deoxyribonucleotide codes.
pub const DNA_BASIC_CHARACTERS: &[u8; 4] = b"ACGT";

/// The four basic ribonucleotide codes.
pub const RNA_BASIC_CHARACTERS: &[u8; 4] = b"ACGU";

/// Maps an upper-case amino acid letter to its alphabetical index, or -1 for any
/// other byte.
///
/// # Example
/// ```rust
/// use alnbench_seq::constants::AMINO_BASIC_INDEX;
/// assert_eq!(AMINO_BASIC_INDEX[b'A' as usize], 0);
/// assert_eq!(AMINO_BASIC_INDEX[b'Y' as usize], 19);
/// assert_eq!(AMINO_BASIC_INDEX[b'-' as usize], -1);
/// ```
pub static AMINO_BASIC_INDEX: Lazy<[i16; 256]> = Lazy::new(|| {
    let mut table = [-1i16; 256];
    for (i, aa) in AMINO_BASIC_CHARACTERS.iter().enumerate() {
        table[*aa as usize] = i as i16;
    }
    table
});

/// True for the two gap characters, `-` and `.`
#[inline(always)]
pub fn is_gap_byte(byte: u8) -> bool {
    byte == b'-' || byte == b'.'
}
