//! Experiment - registers a control and candidates, runs them, and reports
//!
//! ## Lifecycle of one run
//!
//! ```text
//! control() + candidate()*  ──>  conduct()
//!                                  │
//!                                  ├─ disabled: run control directly, return its outcome
//!                                  │
//!                                  ├─ arrange order (shuffled, ordered, candidates first)
//!                                  ├─ execute each case into an Observation
//!                                  │     control error or panic ──> propagated unchanged
//!                                  ├─ compare every candidate against the control
//!                                  │     mismatch + raise_on_mismatch ──> Error::Mismatch
//!                                  ├─ publish(&ExperimentResult)    (failures logged, ignored)
//!                                  └─ return the control's value
//! ```
//!
//! Registrations are consumed by `conduct()`: every run starts from an
//! empty case list, while name, context, flags, comparator, and publisher
//! persist on the experiment.
//!
//! ## Usage
//!
//! ```rust
//! use crucible::Experiment;
//!
//! let mut experiment: Experiment<u32> = Experiment::new("checksum");
//! experiment.control(|| Ok(42))?;
//! experiment.candidate(|| Ok(0));
//!
//! // The candidate disagrees, but the caller still gets the control's value.
//! assert_eq!(experiment.conduct()?, 42);
//! # Ok::<(), crucible::Error>(())
//! ```

mod case;
mod mismatch;
mod order;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::comparator::{Comparator, ValueEquality};
use crate::config::{ExperimentConfig, DEFAULT_NAME};
use crate::context::Context;
use crate::observation::{Observation, Recorded};
use crate::publisher::{NoopPublisher, Publisher};
use crate::result::ExperimentResult;
use crate::{Error, Result};

use case::Case;

/// Default name of the control case.
pub const CONTROL_NAME: &str = "Control";

/// Default name of a candidate case.
pub const CANDIDATE_NAME: &str = "Candidate";

/// A single-process comparison of a control implementation against zero or
/// more candidates.
///
/// `T` is the value every case returns and `E` the error type of the
/// control. `conduct()` returns the control's own `Result<T, E>`; engine
/// errors are converted into `E` through `From<crucible::Error>`.
pub struct Experiment<'a, T, E = Error> {
    config: ExperimentConfig,
    enabled: Box<dyn Fn() -> bool + 'a>,
    comparator: Box<dyn Comparator<T, E> + 'a>,
    publisher: Box<dyn Publisher<T, E> + 'a>,
    control: Option<Case<'a, T, E>>,
    candidates: Vec<Case<'a, T, E>>,
}

impl<'a, T: PartialEq + 'a, E: 'a> Experiment<'a, T, E> {
    /// Create an experiment comparing values with `==`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(ExperimentConfig::new(name))
    }

    /// Create an experiment from a configuration, comparing values with `==`.
    #[must_use]
    pub fn from_config(config: ExperimentConfig) -> Self {
        Self::from_config_with_comparator(config, ValueEquality)
    }
}

impl<'a, T: PartialEq + 'a, E: 'a> Default for Experiment<'a, T, E> {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl<'a, T: 'a, E: 'a> Experiment<'a, T, E> {
    /// Create an experiment with a custom comparator.
    #[must_use]
    pub fn with_comparator(
        name: impl Into<String>,
        comparator: impl Comparator<T, E> + 'a,
    ) -> Self {
        Self::from_config_with_comparator(ExperimentConfig::new(name), comparator)
    }

    /// Create an experiment from a configuration and a custom comparator.
    #[must_use]
    pub fn from_config_with_comparator(
        config: ExperimentConfig,
        comparator: impl Comparator<T, E> + 'a,
    ) -> Self {
        Self {
            config,
            enabled: Box::new(|| true),
            comparator: Box::new(comparator),
            publisher: Box::new(NoopPublisher),
            control: None,
            candidates: Vec::new(),
        }
    }

    /// Replace the experiment-wide context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.config.context = context;
        self
    }

    /// Add one experiment-wide context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.context.insert(key.into(), value.into());
        self
    }

    /// Fail `conduct()` with [`Error::Mismatch`] when a candidate disagrees.
    #[must_use]
    pub fn raise_on_mismatch(mut self, raise: bool) -> Self {
        self.config.raise_on_mismatch = raise;
        self
    }

    /// Shuffle the execution order (default) or run in registration order.
    #[must_use]
    pub fn randomize(mut self, randomize: bool) -> Self {
        self.config.randomize = randomize;
        self
    }

    /// Run every candidate before the control.
    #[must_use]
    pub fn candidates_first(mut self, candidates_first: bool) -> Self {
        self.config.candidates_first = candidates_first;
        self
    }

    /// Seed the execution-order shuffle.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Capture a backtrace for every failed case, even without
    /// `RUST_BACKTRACE`.
    #[must_use]
    pub fn force_backtraces(mut self, force: bool) -> Self {
        self.config.force_backtraces = force;
        self
    }

    /// Gate the experiment. While the predicate returns false, `conduct()`
    /// runs only the control, exactly as a direct call would.
    #[must_use]
    pub fn enabled_when(mut self, enabled: impl Fn() -> bool + 'a) -> Self {
        self.enabled = Box::new(enabled);
        self
    }

    /// Replace the comparator.
    #[must_use]
    pub fn comparator(mut self, comparator: impl Comparator<T, E> + 'a) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    /// Replace the publisher.
    #[must_use]
    pub fn publisher(mut self, publisher: impl Publisher<T, E> + 'a) -> Self {
        self.publisher = Box::new(publisher);
        self
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the experiment-wide context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.config.context
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Whether a control is registered for the next run.
    #[must_use]
    pub const fn has_control(&self) -> bool {
        self.control.is_some()
    }

    /// Number of candidates registered for the next run.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Evaluate the enabled predicate.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        (self.enabled)()
    }

    /// Register the control, named `"Control"`, with no context overlay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateControl`] if a control is already registered.
    pub fn control<F>(&mut self, func: F) -> Result<&mut Self>
    where
        F: FnOnce() -> std::result::Result<T, E> + 'a,
    {
        self.control_with(CONTROL_NAME, Context::new(), move |_| func())
    }

    /// Register the control with a name and a context overlay.
    ///
    /// `func` receives its own copy of the merged context and may modify it;
    /// modifications are visible on the control's observation only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateControl`] if a control is already registered.
    pub fn control_with<F>(
        &mut self,
        name: impl Into<String>,
        context: Context,
        func: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Context) -> std::result::Result<T, E> + 'a,
    {
        if self.control.is_some() {
            return Err(Error::DuplicateControl {
                experiment: self.config.name.clone(),
            });
        }
        self.control = Some(Case::new(name, context, func));
        Ok(self)
    }

    /// Register a candidate, named `"Candidate"`, with no context overlay.
    pub fn candidate<F>(&mut self, func: F) -> &mut Self
    where
        F: FnOnce() -> std::result::Result<T, E> + 'a,
    {
        self.candidate_with(CANDIDATE_NAME, Context::new(), move |_| func())
    }

    /// Register a candidate with a name and a context overlay.
    ///
    /// Names need not be unique.
    pub fn candidate_with<F>(
        &mut self,
        name: impl Into<String>,
        context: Context,
        func: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut Context) -> std::result::Result<T, E> + 'a,
    {
        self.candidates.push(Case::new(name, context, func));
        self
    }
}

impl<'a, T: fmt::Debug + 'a, E: fmt::Display + 'a> Experiment<'a, T, E> {
    /// Compare one candidate against the control through the comparator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mismatch`] when they disagree and the experiment
    /// raises on mismatch.
    pub fn compare(
        &self,
        control: &Observation<T, E>,
        candidate: &Observation<T, E>,
    ) -> Result<bool> {
        if self.comparator.matches(control, candidate) {
            return Ok(true);
        }
        mismatch::report(
            &self.config.name,
            self.config.raise_on_mismatch,
            control,
            candidate,
        )
    }

    /// Run the control and every candidate, publish the result, and return
    /// the control's outcome.
    ///
    /// Registrations are consumed, so the experiment can be reused for the
    /// next run.
    ///
    /// # Errors
    ///
    /// - The control's own error, unchanged, if the control failed
    /// - [`Error::MissingControl`] if no control is registered
    /// - [`Error::Mismatch`] if a candidate disagreed and the experiment
    ///   raises on mismatch; nothing is published in that case
    ///
    /// # Panics
    ///
    /// Resumes the control's panic, if it panicked. Candidate panics are
    /// contained.
    pub fn conduct(&mut self) -> std::result::Result<T, E>
    where
        E: From<Error>,
    {
        let candidates = std::mem::take(&mut self.candidates);
        let Some(control) = self.control.take() else {
            return Err(Error::MissingControl {
                experiment: self.config.name.clone(),
            }
            .into());
        };

        if !self.is_enabled() {
            tracing::trace!(
                experiment = %self.config.name,
                "experiment disabled, running control only"
            );
            return control.call(&self.config.context);
        }

        let base = &self.config.context;
        let force_backtraces = self.config.force_backtraces;
        let mut queue: Vec<(usize, Case<'a, T, E>)> =
            candidates.into_iter().enumerate().collect();
        let control_at = order::arrange(&mut queue, &self.config);
        let after = queue.split_off(control_at);
        tracing::debug!(
            experiment = %self.config.name,
            candidates = queue.len() + after.len(),
            control_at,
            "conducting experiment"
        );

        let mut observed: Vec<(usize, Observation<T, E>)> = queue
            .into_iter()
            .map(|(i, case)| (i, case.observe_candidate(base, force_backtraces)))
            .collect();
        let control = control.observe_control(base, force_backtraces)?;
        observed.extend(
            after
                .into_iter()
                .map(|(i, case)| (i, case.observe_candidate(base, force_backtraces))),
        );
        observed.sort_by_key(|(i, _)| *i);
        let candidates: Vec<Observation<T, E>> =
            observed.into_iter().map(|(_, obs)| obs).collect();

        let verdicts = candidates
            .iter()
            .map(|candidate| self.compare(&control, candidate))
            .collect::<Result<Vec<bool>>>()?;

        let result = ExperimentResult::new(
            self.config.name.clone(),
            self.config.context.clone(),
            control,
            candidates,
            verdicts,
        );
        self.publish(&result);

        match result.into_control_value() {
            Recorded::Value(value) => Ok(value),
            Recorded::Unrecorded => unreachable!("control completed without recording a value"),
        }
    }

    fn publish(&self, result: &ExperimentResult<T, E>) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.publisher.publish(result))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(
                experiment = %self.config.name,
                error = %format!("{err:#}"),
                "failed to publish experiment result"
            ),
            Err(payload) => tracing::error!(
                experiment = %self.config.name,
                panic = %case::panic_message(payload.as_ref()),
                "publisher panicked"
            ),
        }
    }
}

impl<T, E> fmt::Debug for Experiment<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("config", &self.config)
            .field("has_control", &self.control.is_some())
            .field("candidates", &self.candidates.len())
            .finish_non_exhaustive()
    }
}
