//! Result publishing hook
//!
//! The engine hands every completed [`ExperimentResult`] to exactly one
//! [`Publisher`]. Publishing is best effort: an error or panic raised by a
//! publisher is logged and discarded, never surfaced to the caller of
//! `conduct()`.

use std::fmt;

use crate::result::ExperimentResult;

/// Receives the result of every conducted experiment.
pub trait Publisher<T, E> {
    /// Publish one result.
    ///
    /// # Errors
    ///
    /// Any error is logged by the experiment and otherwise ignored.
    fn publish(&self, result: &ExperimentResult<T, E>) -> anyhow::Result<()>;
}

impl<T, E, F> Publisher<T, E> for F
where
    F: Fn(&ExperimentResult<T, E>) -> anyhow::Result<()>,
{
    fn publish(&self, result: &ExperimentResult<T, E>) -> anyhow::Result<()> {
        self(result)
    }
}

/// Default publisher: discards results.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl<T, E> Publisher<T, E> for NoopPublisher {
    fn publish(&self, _result: &ExperimentResult<T, E>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Emits one structured `tracing` event per result.
///
/// Matches are logged at `DEBUG`, mismatches at `WARN`. The event carries
/// the experiment name, the verdict, and the JSON-encoded [`ResultSummary`].
///
/// [`ResultSummary`]: crate::result::ResultSummary
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl<T: fmt::Debug, E: fmt::Display> Publisher<T, E> for LogPublisher {
    fn publish(&self, result: &ExperimentResult<T, E>) -> anyhow::Result<()> {
        let summary = serde_json::to_string(&result.summary())?;
        if result.matched() {
            tracing::debug!(
                experiment = result.experiment(),
                matched = true,
                summary = %summary,
                "experiment result"
            );
        } else {
            tracing::warn!(
                experiment = result.experiment(),
                matched = false,
                mismatches = result.mismatches().count(),
                summary = %summary,
                "experiment mismatch"
            );
        }
        Ok(())
    }
}
