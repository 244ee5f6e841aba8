use crate::PredictError;

const DECIMAL_PRECISION: usize = 3;

/// A per-residue secondary structure prediction: one of `H` (helix), `E`
/// (strand) or `L` (loop) per position, plus the network's confidence in `[0, 1]`.
/// Both vectors have the query length; an empty prediction means PSI-BLAST found
/// no hits to build a profile from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Q3Prediction {
    pub q3: Vec<u8>,
    pub confidence: Vec<f64>,
}

impl Q3Prediction {
    pub fn is_empty(&self) -> bool {
        self.q3.is_empty()
    }

    pub fn len(&self) -> usize {
        self.q3.len()
    }

    /// The prediction as a plain `H`/`E`/`L` string.
    pub fn q3_string(&self) -> String {
        String::from_utf8_lossy(&self.q3).into_owned()
    }

    /// Encodes the confidence vector as a comma-separated list with three decimal
    /// digits per value, e.g. `0.984,0.851`.
    ///
    /// # Example
    /// ```rust
    /// use alnbench_predict::Q3Prediction;
    ///
    /// let prediction = Q3Prediction { q3: b"HE".to_vec(), confidence: vec![0.9844, 0.851] };
    /// assert_eq!(prediction.encode_confidence(), "0.984,0.851");
    /// ```
    pub fn encode_confidence(&self) -> String {
        self.confidence
            .iter()
            .map(|value| format!("{:.*}", DECIMAL_PRECISION, value))
            .collect::<Vec<String>>()
            .join(",")
    }

    /// Decodes a confidence string produced by
    /// [`encode_confidence()`](Q3Prediction::encode_confidence). Errors on the
    /// first non-numeric token; an empty string decodes to an empty vector.
    pub fn decode_confidence(text: &str) -> Result<Vec<f64>, PredictError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        text.split(',')
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| PredictError::InvalidConfidence { token: token.to_string() })
            })
            .collect()
    }
}
