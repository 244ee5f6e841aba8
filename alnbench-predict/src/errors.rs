use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors raised along the secondary structure prediction pipeline
pub enum PredictError {
    #[error("invalid PSSM: {detail}")]
    /// The PSSM file is missing, empty or malformed
    InvalidPssmFile {
        /// what exactly was wrong with the file
        detail: String,
    },
    #[error("unable to load neural network: {detail}")]
    /// A neural network file could not be loaded
    NeuralNetLoad {
        /// what exactly was wrong with the file
        detail: String,
    },
    #[error("unable to launch PSI-BLAST: {detail}")]
    /// The PSI-BLAST child process could not be spawned
    PsiBlastLaunch {
        /// the underlying launch failure
        detail: String,
    },
    #[error("PSI-BLAST failed: {detail}")]
    /// The PSI-BLAST child process exited abnormally
    PsiBlastRuntime {
        /// exit status or I/O failure description
        detail: String,
    },
    #[error("unable to parse confidence value: {token}")]
    /// A confidence string contained a non-numeric token
    InvalidConfidence {
        /// the offending token
        token: String,
    },
    #[error("IO error: {0}")]
    /// An I/O failure while reading a PSSM or network file
    Io(#[from] std::io::Error),
}

impl PredictError {
    pub(crate) fn invalid_pssm(detail: impl Into<String>) -> PredictError {
        PredictError::InvalidPssmFile { detail: detail.into() }
    }

    pub(crate) fn neural_net(detail: impl Into<String>) -> PredictError {
        PredictError::NeuralNetLoad { detail: detail.into() }
    }
}
