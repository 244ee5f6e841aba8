use std::fs;
use std::path::Path;

use alnbench_seq::constants::AMINO_BASIC_CHARACTERS;

use crate::{NormalizedPssm, PredictError, Q3Prediction, PSSM_WIDTH};

/// A dense feed-forward neural network with sigmoid activations.
///
/// Networks are loaded from a line-oriented text file:
///
/// ```text
/// # ALN-NN
/// layers: 315 75 3
/// <for each layer transition, one line per output neuron holding
///  n_inputs weights followed by the bias>
/// ```
///
/// Comment lines start with `#`; blank lines are ignored. The stored weights are
/// the sole source of prediction content: running the same network over the same
/// inputs is byte-identical across platforms up to floating point determinism.
#[derive(Clone, Debug)]
pub struct NeuralNet {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
}

#[derive(Clone, Debug)]
struct Layer {
    n_inputs: usize,
    n_outputs: usize,
    // row-major: n_outputs rows of n_inputs weights plus a trailing bias
    weights: Vec<f32>,
}

impl NeuralNet {
    pub fn from_file(path: impl AsRef<Path>) -> Result<NeuralNet, PredictError> {
        let text = fs::read_to_string(path)?;
        NeuralNet::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<NeuralNet, PredictError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        let sizes_line = lines
            .next()
            .ok_or_else(|| PredictError::neural_net("missing layers line"))?;
        let sizes_text = sizes_line
            .strip_prefix("layers:")
            .ok_or_else(|| PredictError::neural_net("missing layers line"))?;
        let layer_sizes: Vec<usize> = sizes_text
            .split_whitespace()
            .map(|word| {
                word.parse::<usize>()
                    .map_err(|_| PredictError::neural_net("unparseable layer size"))
            })
            .collect::<Result<_, _>>()?;
        if layer_sizes.len() < 2 || layer_sizes.iter().any(|&n| n == 0) {
            return Err(PredictError::neural_net("a network needs at least two non-empty layers"));
        }

        let mut layers = Vec::with_capacity(layer_sizes.len() - 1);
        for transition in layer_sizes.windows(2) {
            let (n_inputs, n_outputs) = (transition[0], transition[1]);
            let mut weights = Vec::with_capacity(n_outputs * (n_inputs + 1));
            for _ in 0..n_outputs {
                let line = lines
                    .next()
                    .ok_or_else(|| PredictError::neural_net("missing weight line"))?;
                let row: Vec<f32> = line
                    .split_whitespace()
                    .map(|word| {
                        word.parse::<f32>()
                            .map_err(|_| PredictError::neural_net("unparseable weight"))
                    })
                    .collect::<Result<_, _>>()?;
                if row.len() != n_inputs + 1 {
                    return Err(PredictError::neural_net(format!(
                        "expected {} weights per neuron, got {}",
                        n_inputs + 1,
                        row.len()
                    )));
                }
                weights.extend_from_slice(&row);
            }
            layers.push(Layer { n_inputs, n_outputs, weights });
        }

        Ok(NeuralNet { layer_sizes, layers })
    }

    pub fn n_inputs(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn n_outputs(&self) -> usize {
        *self.layer_sizes.last().unwrap_or(&0)
    }

    /// Feeds `inputs` through every layer; each neuron computes the sigmoid of
    /// its weighted input sum plus bias, so all outputs lie in `(0, 1)`.
    pub fn run(&self, inputs: &[f32]) -> Vec<f32> {
        debug_assert_eq!(inputs.len(), self.n_inputs(), "input dimension mismatch");

        let mut current = inputs.to_vec();
        for layer in &self.layers {
            let mut next = Vec::with_capacity(layer.n_outputs);
            for neuron in 0..layer.n_outputs {
                let row = &layer.weights[neuron * (layer.n_inputs + 1)..];
                let mut sum = row[layer.n_inputs];
                for (i, value) in current.iter().enumerate() {
                    sum += row[i] * value;
                }
                next.push(sigmoid(sum));
            }
            current = next;
        }
        current
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// The inference window is 15 residues wide, centered on the predicted position.
pub const WINDOW_SIZE: usize = 15;
const HALF_WINDOW: usize = WINDOW_SIZE / 2;
const N_OUTPUTS: usize = 3;

// Per window slot: the 20 alphabetically ordered scores plus a boundary flag
const STAGE1_INPUTS_PER_ROW: usize = PSSM_WIDTH + 1;
const STAGE1_TOTAL_INPUTS: usize = STAGE1_INPUTS_PER_ROW * WINDOW_SIZE;
// Per window slot: the three stage-1 outputs plus a boundary flag
const STAGE2_INPUTS_PER_ROW: usize = N_OUTPUTS + 1;
const STAGE2_TOTAL_INPUTS: usize = STAGE2_INPUTS_PER_ROW * WINDOW_SIZE;

/// Two-stage sliding-window inference over a normalized PSSM.
///
/// Stage 1 sees, for each of the 15 window slots, the position's 20 normalized
/// scores in strict alphabetical amino acid order plus a flag marking slots that
/// fall outside the matrix. Stage 2 repeats the slide over stage 1's three-state
/// outputs. The final three-vector is read as `(loop, helix, strand)`; the
/// maximum picks the state and doubles as the confidence.
#[derive(Debug)]
pub struct NnStructureTool {
    stage1: NeuralNet,
    stage2: NeuralNet,
}

impl NnStructureTool {
    /// Loads both stage networks, verifying their dimensions match the window
    /// layout.
    pub fn new(
        stage1_file: impl AsRef<Path>,
        stage2_file: impl AsRef<Path>,
    ) -> Result<NnStructureTool, PredictError> {
        let stage1 = NeuralNet::from_file(stage1_file)?;
        let stage2 = NeuralNet::from_file(stage2_file)?;

        if stage1.n_inputs() != STAGE1_TOTAL_INPUTS || stage1.n_outputs() != N_OUTPUTS {
            return Err(PredictError::neural_net(format!(
                "stage 1 network must map {} inputs to {} outputs",
                STAGE1_TOTAL_INPUTS, N_OUTPUTS
            )));
        }
        if stage2.n_inputs() != STAGE2_TOTAL_INPUTS || stage2.n_outputs() != N_OUTPUTS {
            return Err(PredictError::neural_net(format!(
                "stage 2 network must map {} inputs to {} outputs",
                STAGE2_TOTAL_INPUTS, N_OUTPUTS
            )));
        }
        Ok(NnStructureTool { stage1, stage2 })
    }

    pub fn window_size(&self) -> usize {
        WINDOW_SIZE
    }

    /// Predicts the secondary structure of the query underlying `pssm`. The
    /// result has exactly one state and one confidence per PSSM position; an
    /// empty matrix yields an empty prediction.
    pub fn predict_secondary(&self, pssm: &NormalizedPssm) -> Q3Prediction {
        if pssm.is_empty() {
            return Q3Prediction::default();
        }
        let length = pssm.rows.len();

        // The network expects scores in alphabetical order, but the matrix may
        // store its columns in any order; score_map[i] is the matrix column
        // holding the i-th alphabetical amino acid.
        let mut score_map = [0usize; PSSM_WIDTH];
        for (i, aa) in AMINO_BASIC_CHARACTERS.iter().enumerate() {
            let column = pssm.mapping.iter().position(|c| c == aa);
            debug_assert!(column.is_some(), "parser guarantees a complete mapping");
            score_map[i] = column.unwrap_or(0);
        }

        // ------------------------------------------------------------------
        // Stage 1: prime the window one slot to the right of its steady-state
        // position; the first shift of the loop below centers it on residue 0.
        let mut window = vec![0f32; STAGE1_TOTAL_INPUTS];
        for slot in 0..=HALF_WINDOW {
            window[slot * STAGE1_INPUTS_PER_ROW + PSSM_WIDTH] = 1.0;
        }
        for i in 0..HALF_WINDOW.min(length) {
            let base = (HALF_WINDOW + 1 + i) * STAGE1_INPUTS_PER_ROW;
            let row = &pssm.rows[i];
            for j in 0..PSSM_WIDTH {
                window[base + j] = row.scores[score_map[j]];
            }
        }

        let mut stage1_outputs: Vec<Vec<f32>> = Vec::with_capacity(length);
        let last_slot = STAGE1_TOTAL_INPUTS - STAGE1_INPUTS_PER_ROW;
        for i in 0..length {
            window.copy_within(STAGE1_INPUTS_PER_ROW.., 0);

            let column = i + HALF_WINDOW;
            if column < length {
                let row = &pssm.rows[column];
                for j in 0..PSSM_WIDTH {
                    window[last_slot + j] = row.scores[score_map[j]];
                }
                window[last_slot + PSSM_WIDTH] = 0.0;
            } else {
                // Window extends past the C-terminus
                for value in &mut window[last_slot..] {
                    *value = 0.0;
                }
                window[STAGE1_TOTAL_INPUTS - 1] = 1.0;
            }

            stage1_outputs.push(self.stage1.run(&window));
        }

        // ------------------------------------------------------------------
        // Stage 2: the same slide, fed with stage 1's outputs
        let mut window = vec![0f32; STAGE2_TOTAL_INPUTS];
        for slot in 0..=HALF_WINDOW {
            window[slot * STAGE2_INPUTS_PER_ROW + N_OUTPUTS] = 1.0;
        }
        for i in 0..HALF_WINDOW.min(length) {
            let base = (HALF_WINDOW + 1 + i) * STAGE2_INPUTS_PER_ROW;
            for (j, value) in stage1_outputs[i].iter().enumerate() {
                window[base + j] = *value;
            }
        }

        let mut q3 = Vec::with_capacity(length);
        let mut confidence = Vec::with_capacity(length);
        let last_slot = STAGE2_TOTAL_INPUTS - STAGE2_INPUTS_PER_ROW;
        for i in 0..length {
            window.copy_within(STAGE2_INPUTS_PER_ROW.., 0);

            let column = i + HALF_WINDOW;
            if column < length {
                for (j, value) in stage1_outputs[column].iter().enumerate() {
                    window[last_slot + j] = *value;
                }
                window[last_slot + N_OUTPUTS] = 0.0;
            } else {
                for value in &mut window[last_slot..] {
                    *value = 0.0;
                }
                window[STAGE2_TOTAL_INPUTS - 1] = 1.0;
            }

            let output = self.stage2.run(&window);

            let mut state = b'L';
            let mut max = output[0];
            if output[1] > max {
                state = b'H';
                max = output[1];
            }
            if output[2] > max {
                state = b'E';
                max = output[2];
            }
            q3.push(state);
            confidence.push(max as f64);
        }

        Q3Prediction { q3, confidence }
    }
}
