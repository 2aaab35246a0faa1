//! Error types for the brainprint crate.

use std::fmt;
use std::path::PathBuf;

/// Step of the per-structure surface extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    Binarize,
    Pretess,
    MarchingCubes,
    Convert,
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionStage::Binarize => "binarize",
            ExtractionStage::Pretess => "pretess",
            ExtractionStage::MarchingCubes => "marching cubes",
            ExtractionStage::Convert => "convert",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrainprintError {
    /// An external step failed or did not produce its output file.
    #[error("{stage} failed for {structure} (`{command}`): {reason}")]
    Extraction {
        stage: ExtractionStage,
        structure: String,
        command: String,
        reason: String,
    },

    /// A mesh, surface or volume file could not be parsed.
    #[error("Failed to read {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("No eigenvalues supplied for structure '{0}'")]
    MissingSpectrum(String),

    #[error("Unknown distance metric '{0}'")]
    UnknownMetric(String),

    #[error("Unknown eigenvalue normalization '{0}'")]
    UnknownNormalization(String),

    #[error("Subject directory not found: {0}")]
    InvalidSubject(PathBuf),

    #[error("Environment check failed: {0}")]
    Environment(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BrainprintError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BrainprintError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrainprintError>;
