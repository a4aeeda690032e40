//! Library error type
//!
//! Classification is total over strings; the size guard is the only way a
//! call can fail.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Input exceeded the configured byte ceiling and was not analyzed.
    #[error("input too large: {size} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },
}
