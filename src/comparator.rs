//! Candidate/control comparison policies
//!
//! The engine decides every match through a single [`Comparator`]. The
//! default, [`ValueEquality`], matches when the candidate did not fail and
//! its value equals the control's. Custom policies may have side effects
//! (for example logging a per-field diff) as long as they return a verdict.

use crate::observation::Observation;

/// Decides whether a candidate observation matches the control observation.
pub trait Comparator<T, E> {
    /// Compare one candidate against the control.
    fn matches(&self, control: &Observation<T, E>, candidate: &Observation<T, E>) -> bool;
}

impl<T, E, F> Comparator<T, E> for F
where
    F: Fn(&Observation<T, E>, &Observation<T, E>) -> bool,
{
    fn matches(&self, control: &Observation<T, E>, candidate: &Observation<T, E>) -> bool {
        self(control, candidate)
    }
}

/// Default policy: the candidate did not fail and `candidate == control`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueEquality;

impl<T: PartialEq, E> Comparator<T, E> for ValueEquality {
    fn matches(&self, control: &Observation<T, E>, candidate: &Observation<T, E>) -> bool {
        !candidate.failed() && control.value() == candidate.value()
    }
}

/// Value comparison through a custom equality function.
///
/// A failed candidate never matches, and neither does a side with no
/// recorded value; `eq` only sees two recorded values.
#[derive(Debug, Clone, Copy)]
pub struct ByValue<F>(F);

/// Build a [`ByValue`] comparator from an equality function.
///
/// ```rust
/// use crucible::{comparator, Experiment};
///
/// let mut experiment: Experiment<String> = Experiment::with_comparator(
///     "case-insensitive",
///     comparator::by_value(|a: &String, b: &String| a.eq_ignore_ascii_case(b)),
/// );
/// experiment.control(|| Ok("Hello".to_string()))?;
/// experiment.candidate(|| Ok("HELLO".to_string()));
/// assert_eq!(experiment.conduct()?, "Hello");
/// # Ok::<(), crucible::Error>(())
/// ```
pub const fn by_value<F>(eq: F) -> ByValue<F> {
    ByValue(eq)
}

impl<T, E, F> Comparator<T, E> for ByValue<F>
where
    F: Fn(&T, &T) -> bool,
{
    fn matches(&self, control: &Observation<T, E>, candidate: &Observation<T, E>) -> bool {
        if candidate.failed() {
            return false;
        }
        match (control.value().as_option(), candidate.value().as_option()) {
            (Some(c), Some(k)) => (self.0)(c, k),
            _ => false,
        }
    }
}

/// Approximate comparison for floating point results.
///
/// Two values match when their absolute difference is within `epsilon`.
/// NaN never matches, including NaN against NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    epsilon: f64,
}

impl Tolerance {
    /// Create a tolerance comparator.
    #[must_use]
    pub const fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Get the allowed absolute difference.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl<E> Comparator<f64, E> for Tolerance {
    fn matches(&self, control: &Observation<f64, E>, candidate: &Observation<f64, E>) -> bool {
        by_value(|a: &f64, b: &f64| (a - b).abs() <= self.epsilon).matches(control, candidate)
    }
}
