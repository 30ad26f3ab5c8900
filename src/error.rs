use thiserror::Error;

/// Errors surfaced by the analysis and effect engine.
///
/// Numeric degeneracies (zero denominators, silent input) are handled where
/// they occur and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
