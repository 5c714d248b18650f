//! Request-level error kinds
//!
//! Only global preconditions are terminal. Malformed per-contract data is
//! defaulted inside the normalizer and never surfaces here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GexError {
    /// No symbol, or no usable spot price
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Market data provider call failed
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    /// Chain normalized to zero strikes
    #[error("No GEX profile for {0}: option chain has no strikes")]
    EmptyResult(String),

    /// Key-value store failure while reading history
    #[error("Store error: {0}")]
    Store(String),
}

impl GexError {
    /// Whether the failure came from the caller's input rather than a collaborator
    pub fn is_input_error(&self) -> bool {
        matches!(self, GexError::MissingInput(_))
    }
}

pub type GexResult<T> = Result<T, GexError>;
