//! Experiment Result - the control and candidate observations of one run

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::observation::{Observation, Recorded};

/// Outcome of one `conduct()` call, handed to the publisher.
///
/// Candidates are kept in registration order, whatever order they ran in.
/// `matched()` is the conjunction of every per-candidate verdict, so an
/// experiment without candidates always matches.
#[derive(Debug, Clone)]
pub struct ExperimentResult<T, E> {
    experiment: String,
    context: Context,
    control: Observation<T, E>,
    candidates: Vec<Observation<T, E>>,
    verdicts: Vec<bool>,
}

impl<T, E> ExperimentResult<T, E> {
    pub(crate) fn new(
        experiment: impl Into<String>,
        context: Context,
        control: Observation<T, E>,
        candidates: Vec<Observation<T, E>>,
        verdicts: Vec<bool>,
    ) -> Self {
        debug_assert_eq!(candidates.len(), verdicts.len());
        Self {
            experiment: experiment.into(),
            context,
            control,
            candidates,
            verdicts,
        }
    }

    /// Get the name of the experiment that produced this result.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the experiment-wide context (without any case overlay).
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Get the control observation.
    #[must_use]
    pub const fn control(&self) -> &Observation<T, E> {
        &self.control
    }

    /// Get the candidate observations in registration order.
    #[must_use]
    pub fn candidates(&self) -> &[Observation<T, E>] {
        &self.candidates
    }

    /// Whether every candidate matched the control.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.verdicts.iter().all(|&v| v)
    }

    /// Iterate candidates together with their individual verdicts.
    pub fn verdicts(&self) -> impl Iterator<Item = (&Observation<T, E>, bool)> {
        self.candidates.iter().zip(self.verdicts.iter().copied())
    }

    /// Iterate the candidates that did not match.
    pub fn mismatches(&self) -> impl Iterator<Item = &Observation<T, E>> {
        self.verdicts()
            .filter_map(|(candidate, matched)| (!matched).then_some(candidate))
    }

    pub(crate) fn into_control_value(self) -> Recorded<T> {
        self.control.into_value()
    }
}

impl<T: fmt::Debug, E: fmt::Display> ExperimentResult<T, E> {
    /// Build a serializable snapshot of this result.
    #[must_use]
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            experiment: self.experiment.clone(),
            context: self.context.clone(),
            matched: self.matched(),
            control: ObservationSummary::of(&self.control, None),
            candidates: self
                .verdicts()
                .map(|(candidate, matched)| ObservationSummary::of(candidate, Some(matched)))
                .collect(),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Display> fmt::Display for ExperimentResult<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Result(match={}, control={}, candidates=[", self.matched(), self.control)?;
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{candidate}")?;
        }
        f.write_str("])")
    }
}

/// Serializable snapshot of an [`ExperimentResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSummary {
    /// Experiment name
    pub experiment: String,
    /// Experiment-wide context
    pub context: Context,
    /// Whether every candidate matched
    pub matched: bool,
    /// Control execution
    pub control: ObservationSummary,
    /// Candidate executions in registration order
    pub candidates: Vec<ObservationSummary>,
}

/// Serializable snapshot of one [`Observation`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationSummary {
    /// Case name
    pub name: String,
    /// Context the case ran with
    pub context: Context,
    /// Execution time in microseconds
    pub duration_us: Option<u64>,
    /// Debug rendering of the recorded value, if any
    pub value: Option<String>,
    /// Failure rendering, if the case failed
    pub failure: Option<String>,
    /// Verdict against the control (`None` for the control itself)
    pub matched: Option<bool>,
}

impl ObservationSummary {
    fn of<T: fmt::Debug, E: fmt::Display>(obs: &Observation<T, E>, matched: Option<bool>) -> Self {
        Self {
            name: obs.name().to_string(),
            context: obs.context().clone(),
            duration_us: obs
                .duration()
                .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX)),
            value: obs.value().as_option().map(|v| format!("{v:?}")),
            failure: obs.failure().map(ToString::to_string),
            matched,
        }
    }
}
