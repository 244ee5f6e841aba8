use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use alnbench_seq::constants::AMINO_BASIC_INDEX;

use crate::PredictError;

/// The number of scored residue types per PSSM position, one per basic amino acid.
pub const PSSM_WIDTH: usize = 20;

/// One PSSM position: an integer log-odds score per basic amino acid, in the
/// column order recorded by [`Pssm::mapping`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PssmRow {
    pub scores: [i32; PSSM_WIDTH],
}

/// A position-specific scoring matrix as written by PSI-BLAST.
///
/// `mapping` records which amino acid each score column belongs to, in file
/// order; the twenty basic amino acids each appear exactly once, but in whatever
/// order the file presented them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pssm {
    pub posit_scale_factor: f64,
    pub mapping: Vec<u8>,
    pub rows: Vec<PssmRow>,
}

impl Pssm {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parses a PSSM file.
    ///
    /// The expected layout is:
    ///
    /// ```text
    /// # AG-PSSM - ...
    /// # PSI_SCALE_FACTOR:<positive number>
    ///
    ///            A  R  N  D  C  Q  E  G  H  I  L  K  M  F  P  S  T  W  Y  V
    ///    1 M   s1 s2 ... s20
    ///    2 S   ...
    ///
    /// <ignored trailing statistics>
    /// ```
    ///
    /// Rows run until the first blank line or end of file. Any deviation from
    /// the layout is reported as [`PredictError::InvalidPssmFile`] and read
    /// failures as [`PredictError::Io`]; no partial matrix is ever returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Pssm, PredictError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() {
            return Err(PredictError::invalid_pssm(format!(
                "{} is a directory",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(PredictError::invalid_pssm("empty pssm file"));
        }
        let file = File::open(path)?;
        Pssm::from_reader(BufReader::new(file))
    }

    /// Parses a PSSM from any buffered reader; see
    /// [`from_file()`](Pssm::from_file) for the grammar.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Pssm, PredictError> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

        let mut index = 0;
        while index < lines.len() && lines[index].trim().is_empty() {
            index += 1;
        }
        if index >= lines.len() {
            return Err(PredictError::invalid_pssm("empty pssm file"));
        }

        if !lines[index].starts_with("# AG-PSSM") {
            return Err(PredictError::invalid_pssm("missing AG-PSSM header line"));
        }
        index += 1;

        const SCALE_PREFIX: &str = "# PSI_SCALE_FACTOR:";
        let scale_line = lines
            .get(index)
            .ok_or_else(|| PredictError::invalid_pssm("missing PSI_SCALE_FACTOR line"))?;
        let posit_scale_factor = match scale_line.strip_prefix(SCALE_PREFIX) {
            Some(rest) => rest
                .trim()
                .parse::<f64>()
                .map_err(|_| PredictError::invalid_pssm("unparseable PSI_SCALE_FACTOR"))?,
            None => return Err(PredictError::invalid_pssm("missing PSI_SCALE_FACTOR line")),
        };
        if !(posit_scale_factor > 0.0) {
            return Err(PredictError::invalid_pssm("invalid PSI_SCALE_FACTOR (must be > 0)"));
        }
        index += 1;

        while index < lines.len() && lines[index].trim().is_empty() {
            index += 1;
        }
        let header = lines
            .get(index)
            .ok_or_else(|| PredictError::invalid_pssm("missing PSSM table header"))?;
        let mapping = split_pssm_table_header(header)?;
        index += 1;

        if index >= lines.len() || lines[index].trim().is_empty() {
            return Err(PredictError::invalid_pssm("no PSSM rows found"));
        }

        let mut rows: Vec<PssmRow> = Vec::new();
        let mut last_position = 0usize;
        while index < lines.len() && !lines[index].trim().is_empty() {
            let words: Vec<&str> = lines[index].split_whitespace().collect();
            if words.len() != PSSM_WIDTH + 2 {
                return Err(PredictError::invalid_pssm("invalid PSSM score line"));
            }

            // The leading position is only used to verify nothing was skipped
            let position = words[0]
                .parse::<usize>()
                .map_err(|_| PredictError::invalid_pssm("invalid PSSM position"))?;
            if position != last_position + 1 {
                return Err(PredictError::invalid_pssm("invalid PSSM position"));
            }
            last_position = position;

            // words[1] is the query residue at this position; ignored

            let mut row = PssmRow { scores: [0; PSSM_WIDTH] };
            for (i, word) in words[2..2 + PSSM_WIDTH].iter().enumerate() {
                row.scores[i] = word
                    .parse::<i32>()
                    .map_err(|_| PredictError::invalid_pssm("invalid PSSM score"))?;
            }
            rows.push(row);
            index += 1;
        }

        Ok(Pssm { posit_scale_factor, mapping, rows })
    }
}

// The table header must name each of the twenty basic amino acids exactly once,
// in any order.
fn split_pssm_table_header(line: &str) -> Result<Vec<u8>, PredictError> {
    let mut mapping: Vec<u8> = Vec::with_capacity(PSSM_WIDTH);
    for byte in line.bytes() {
        if byte.is_ascii_whitespace() {
            continue;
        }
        if mapping.contains(&byte) {
            return Err(PredictError::invalid_pssm(format!(
                "duplicate residue column label {}",
                byte as char
            )));
        }
        mapping.push(byte);
    }
    // Twenty unique labels drawn from the basic amino alphabet cover it exactly
    if mapping.len() != PSSM_WIDTH
        || !mapping.iter().all(|&aa| AMINO_BASIC_INDEX[aa as usize] >= 0)
    {
        return Err(PredictError::invalid_pssm("invalid PSSM table header"));
    }
    Ok(mapping)
}

/// One normalized PSSM position; every score lies in `(0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPssmRow {
    pub scores: [f32; PSSM_WIDTH],
}

/// A [`Pssm`] with each score logistic-scaled into `(0, 1)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedPssm {
    pub mapping: Vec<u8>,
    pub rows: Vec<NormalizedPssmRow>,
}

impl NormalizedPssm {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Maps each integer score through `1 / (1 + exp(-0.5 * score / scale))`, a
/// logistic curve with slope one half over the scale-corrected score. The result
/// is strictly inside `(0, 1)` and monotone in the underlying score.
pub fn normalize_pssm(pssm: &Pssm) -> NormalizedPssm {
    // Multiplication is cheaper than division inside the double loop
    let factor = 1.0 / pssm.posit_scale_factor;

    let mut normalized = NormalizedPssm {
        mapping: pssm.mapping.clone(),
        rows: Vec::with_capacity(pssm.rows.len()),
    };
    for row in &pssm.rows {
        let mut scores = [0f32; PSSM_WIDTH];
        for (i, &score) in row.scores.iter().enumerate() {
            let scaled = score as f64 * factor;
            scores[i] = (1.0 / (1.0 + (-0.5 * scaled).exp())) as f32;
        }
        normalized.rows.push(NormalizedPssmRow { scores });
    }
    normalized
}
