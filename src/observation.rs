//! Observation - timing, value, and failure state of one case execution

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::Context;

/// Status of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationStatus {
    /// Created, the case has not started.
    Pending,
    /// The case is executing.
    Running,
    /// The case returned, failed, or panicked. Terminal.
    Completed,
}

/// Return value slot of an observation.
///
/// `Unrecorded` is distinct from every value `T` can hold, so a case that
/// legitimately returns `None`, `0`, or `()` is never confused with one
/// that never produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded<T> {
    /// No value was recorded (the case has not finished, or it failed).
    Unrecorded,
    /// The value the case returned.
    Value(T),
}

impl<T> Recorded<T> {
    /// Whether a value was recorded.
    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Borrow the recorded value, if any.
    #[must_use]
    pub const fn as_option(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unrecorded => None,
        }
    }

    /// Take the recorded value, if any.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unrecorded => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Recorded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:?}"),
            Self::Unrecorded => f.write_str("Unrecorded"),
        }
    }
}

/// What made a case fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause<E> {
    /// The case returned an error.
    Error(E),
    /// The case panicked; the payload rendered as text.
    Panic(String),
}

impl<E: fmt::Display> fmt::Display for FailureCause<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Panic(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// A captured failure: the cause plus a backtrace snapshot taken where the
/// engine observed it.
///
/// The backtrace is captured when enabled through `RUST_BACKTRACE` or
/// `RUST_LIB_BACKTRACE`, or unconditionally when the experiment forces
/// backtraces.
#[derive(Debug, Clone)]
pub struct Failure<E> {
    cause: FailureCause<E>,
    backtrace: Option<String>,
}

impl<E> Failure<E> {
    pub(crate) fn capture(cause: FailureCause<E>, force_backtrace: bool) -> Self {
        let backtrace = if force_backtrace {
            Backtrace::force_capture()
        } else {
            Backtrace::capture()
        };
        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        Self { cause, backtrace }
    }

    pub(crate) fn into_cause(self) -> FailureCause<E> {
        self.cause
    }

    /// Get the failure cause.
    #[must_use]
    pub const fn cause(&self) -> &FailureCause<E> {
        &self.cause
    }

    /// Get the returned error, if the case failed by returning one.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match &self.cause {
            FailureCause::Error(e) => Some(e),
            FailureCause::Panic(_) => None,
        }
    }

    /// Whether the case panicked.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self.cause, FailureCause::Panic(_))
    }

    /// Get the captured backtrace, if backtraces were enabled.
    #[must_use]
    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

/// Observation of a single control or candidate execution.
///
/// Created by the experiment immediately before its case runs, mutated only
/// while that case runs, and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Observation<T, E> {
    name: String,
    context: Context,
    status: ObservationStatus,
    started_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    duration: Option<Duration>,
    value: Recorded<T>,
    failure: Option<Failure<E>>,
}

impl<T, E> Observation<T, E> {
    pub(crate) fn new(name: impl Into<String>, context: Context) -> Self {
        Self {
            name: name.into(),
            context,
            status: ObservationStatus::Pending,
            started_at: None,
            started: None,
            duration: None,
            value: Recorded::Unrecorded,
            failure: None,
        }
    }

    /// Pending -> Running.
    pub(crate) fn start(&mut self) {
        self.status = ObservationStatus::Running;
        self.started_at = Some(Utc::now());
        self.started = Some(Instant::now());
    }

    pub(crate) fn record(&mut self, value: T) {
        debug_assert!(!self.value.is_recorded(), "observation recorded twice");
        self.value = Recorded::Value(value);
    }

    pub(crate) fn fail(&mut self, cause: FailureCause<E>, force_backtrace: bool) {
        self.failure = Some(Failure::capture(cause, force_backtrace));
    }

    /// Running -> Completed. Runs on every exit path of a case.
    pub(crate) fn finish(&mut self) {
        self.status = ObservationStatus::Completed;
        self.duration = self.started.map(|s| s.elapsed());
    }

    pub(crate) fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub(crate) fn take_failure(&mut self) -> Option<Failure<E>> {
        self.failure.take()
    }

    pub(crate) fn into_value(self) -> Recorded<T> {
        self.value
    }

    /// Get the observation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the context this execution ran with.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Get the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ObservationStatus {
        self.status
    }

    /// Get the wall-clock start time, if the case has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the wall-clock end time, if the case has completed.
    ///
    /// Derived from the start time and the monotonic duration, so it is
    /// never earlier than `started_at`.
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        let started_at = self.started_at?;
        let elapsed = chrono::Duration::from_std(self.duration?).ok()?;
        Some(started_at + elapsed)
    }

    /// Get the execution time, if the case has completed.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Get the recorded value.
    #[must_use]
    pub const fn value(&self) -> &Recorded<T> {
        &self.value
    }

    /// Whether the execution failed.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Get the captured failure, if the execution failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure<E>> {
        self.failure.as_ref()
    }
}

impl<T: fmt::Debug, E: fmt::Display> fmt::Display for Observation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observation(name={:?}, value={}", self.name, self.value)?;
        if let Some(failure) = &self.failure {
            write!(f, ", failure={failure}")?;
        }
        f.write_str(")")
    }
}
