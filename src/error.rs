//! Error types for Crucible
//!
//! Configuration mistakes and candidate mismatches are the only errors the
//! engine raises itself. A control's own error is never represented here:
//! it reaches the caller unchanged.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Crucible error types
#[derive(Error, Debug)]
pub enum Error {
    /// A second control case was registered on the same experiment
    #[error("Configuration error: experiment `{experiment}` already has a control case")]
    DuplicateControl {
        /// Experiment name
        experiment: String,
    },

    /// `conduct()` was called before any control case was registered
    #[error("Configuration error: experiment `{experiment}` must contain a control case")]
    MissingControl {
        /// Experiment name
        experiment: String,
    },

    /// A candidate disagreed with the control and the experiment raises on mismatch
    #[error("Mismatch in experiment `{experiment}`: {detail}")]
    Mismatch {
        /// Experiment name
        experiment: String,
        /// Name of the disagreeing candidate
        candidate: String,
        /// Values compared, or the candidate's failure followed by its
        /// backtrace when one was captured (`RUST_BACKTRACE`, or
        /// `force_backtraces` on the experiment)
        detail: String,
    },

    /// Experiment configuration could not be decoded
    #[error("Configuration error: invalid experiment config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error belongs to the configuration family
    /// (duplicate control, missing control, undecodable config).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateControl { .. } | Self::MissingControl { .. } | Self::Config(_)
        )
    }

    /// Whether this error reports a candidate mismatch.
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_family() {
        let dup = Error::DuplicateControl {
            experiment: "exp".to_string(),
        };
        let missing = Error::MissingControl {
            experiment: "exp".to_string(),
        };
        assert!(dup.is_configuration());
        assert!(missing.is_configuration());
        assert!(!dup.is_mismatch());
    }

    #[test]
    fn test_mismatch_is_not_configuration() {
        let err = Error::Mismatch {
            experiment: "exp".to_string(),
            candidate: "Candidate".to_string(),
            detail: "Candidate does not match control value (42 != 0)".to_string(),
        };
        assert!(err.is_mismatch());
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("42 != 0"));
    }
}
