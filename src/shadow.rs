//! Shadow - wrap an existing function so every call runs an experiment
//!
//! A thin adapter over [`Experiment`] for the "replace this function"
//! call style. Each call builds a fresh experiment from a long-lived
//! [`ExperimentConfig`], registers the control and candidate with the same
//! arguments, and conducts it. Nothing registered by one call is visible
//! to the next. [`Shadow::with_context`] hands each wrapped function its
//! own copy of the merged context as well.
//!
//! ```rust
//! use crucible::{ExperimentConfig, Shadow};
//!
//! fn legacy_total(items: Vec<u32>) -> crucible::Result<u32> {
//!     Ok(items.iter().sum())
//! }
//!
//! fn fast_total(items: Vec<u32>) -> crucible::Result<u32> {
//!     Ok(items.into_iter().fold(0, |acc, x| acc + x))
//! }
//!
//! let total = Shadow::new(legacy_total, fast_total)
//!     .config(ExperimentConfig::new("totals").raise_on_mismatch(true));
//!
//! assert_eq!(total.call(vec![1, 2, 3])?, 6);
//! # Ok::<(), crucible::Error>(())
//! ```

use std::fmt;

use crate::comparator::{Comparator, ValueEquality};
use crate::config::ExperimentConfig;
use crate::context::Context;
use crate::experiment::{Experiment, CANDIDATE_NAME, CONTROL_NAME};
use crate::observation::Observation;
use crate::publisher::{NoopPublisher, Publisher};
use crate::result::ExperimentResult;
use crate::Error;

/// Name and context overlay of one wrapped function.
struct Role {
    name: String,
    context: Context,
}

impl Role {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            context: Context::new(),
        }
    }
}

type ShadowFn<'a, A, T, E> = Box<dyn Fn(A, &mut Context) -> Result<T, E> + 'a>;

/// A control function shadowed by a candidate function.
pub struct Shadow<'a, A, T, E = Error> {
    config: ExperimentConfig,
    control: ShadowFn<'a, A, T, E>,
    candidate: ShadowFn<'a, A, T, E>,
    control_role: Role,
    candidate_role: Role,
    enabled: Box<dyn Fn() -> bool + 'a>,
    comparator: Box<dyn Comparator<T, E> + 'a>,
    publisher: Box<dyn Publisher<T, E> + 'a>,
}

impl<'a, A, T: PartialEq + 'a, E: 'a> Shadow<'a, A, T, E> {
    /// Shadow `control` with `candidate`, comparing values with `==`.
    #[must_use]
    pub fn new<C, K>(control: C, candidate: K) -> Self
    where
        C: Fn(A) -> Result<T, E> + 'a,
        K: Fn(A) -> Result<T, E> + 'a,
    {
        Self::with_context(move |args, _| control(args), move |args, _| candidate(args))
    }

    /// Shadow `control` with `candidate`, passing each its own copy of the
    /// merged context. Changes a function makes to it show up on that
    /// function's observation only.
    #[must_use]
    pub fn with_context<C, K>(control: C, candidate: K) -> Self
    where
        C: Fn(A, &mut Context) -> Result<T, E> + 'a,
        K: Fn(A, &mut Context) -> Result<T, E> + 'a,
    {
        Self {
            config: ExperimentConfig::default(),
            control: Box::new(control),
            candidate: Box::new(candidate),
            control_role: Role::new(CONTROL_NAME),
            candidate_role: Role::new(CANDIDATE_NAME),
            enabled: Box::new(|| true),
            comparator: Box::new(ValueEquality),
            publisher: Box::new(NoopPublisher),
        }
    }
}

impl<'a, A, T: 'a, E: 'a> Shadow<'a, A, T, E> {
    /// Set the configuration every call's experiment is built from.
    #[must_use]
    pub fn config(mut self, config: ExperimentConfig) -> Self {
        self.config = config;
        self
    }

    /// Name the control and give it a context overlay.
    #[must_use]
    pub fn control_case(mut self, name: impl Into<String>, context: Context) -> Self {
        self.control_role = Role {
            name: name.into(),
            context,
        };
        self
    }

    /// Name the candidate and give it a context overlay.
    #[must_use]
    pub fn candidate_case(mut self, name: impl Into<String>, context: Context) -> Self {
        self.candidate_role = Role {
            name: name.into(),
            context,
        };
        self
    }

    /// Gate every call's experiment.
    #[must_use]
    pub fn enabled_when(mut self, enabled: impl Fn() -> bool + 'a) -> Self {
        self.enabled = Box::new(enabled);
        self
    }

    /// Replace the comparator shared by every call.
    #[must_use]
    pub fn comparator(mut self, comparator: impl Comparator<T, E> + 'a) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    /// Replace the publisher shared by every call.
    #[must_use]
    pub fn publisher(mut self, publisher: impl Publisher<T, E> + 'a) -> Self {
        self.publisher = Box::new(publisher);
        self
    }
}

impl<'a, A, T, E> Shadow<'a, A, T, E>
where
    A: Clone + 'a,
    T: fmt::Debug + 'a,
    E: fmt::Display + From<Error> + 'a,
{
    /// Call the control through a freshly built experiment.
    ///
    /// # Errors
    ///
    /// Same as [`Experiment::conduct`].
    pub fn call(&self, args: A) -> Result<T, E> {
        let comparator = &*self.comparator;
        let publisher = &*self.publisher;
        let enabled = &*self.enabled;

        let mut experiment = Experiment::from_config_with_comparator(
            self.config.clone(),
            move |control: &Observation<T, E>, candidate: &Observation<T, E>| {
                comparator.matches(control, candidate)
            },
        )
        .publisher(move |result: &ExperimentResult<T, E>| publisher.publish(result))
        .enabled_when(move || enabled());

        let candidate_args = args.clone();
        experiment.control_with(
            self.control_role.name.clone(),
            self.control_role.context.clone(),
            move |ctx| (self.control)(args, ctx),
        )?;
        experiment.candidate_with(
            self.candidate_role.name.clone(),
            self.candidate_role.context.clone(),
            move |ctx| (self.candidate)(candidate_args, ctx),
        );
        experiment.conduct()
    }
}

impl<A, T, E> fmt::Debug for Shadow<'_, A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shadow")
            .field("config", &self.config)
            .field("control", &self.control_role.name)
            .field("candidate", &self.candidate_role.name)
            .finish_non_exhaustive()
    }
}
