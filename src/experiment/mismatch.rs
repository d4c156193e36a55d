//! Mismatch reporting: a quiet `false`, or a [`Error::Mismatch`]

use std::fmt;

use crate::observation::Observation;
use crate::{Error, Result};

/// Report a candidate that did not match the control.
///
/// Returns `Ok(false)` unless `raise` is set, in which case the mismatch
/// becomes an error describing either the candidate's failure or both
/// values.
pub(crate) fn report<T: fmt::Debug, E: fmt::Display>(
    experiment: &str,
    raise: bool,
    control: &Observation<T, E>,
    candidate: &Observation<T, E>,
) -> Result<bool> {
    if !raise {
        tracing::debug!(experiment, candidate = candidate.name(), "candidate mismatch");
        return Ok(false);
    }

    let detail = match candidate.failure() {
        Some(failure) => {
            let mut detail = format!("{} raised an error: {failure}", candidate.name());
            if let Some(backtrace) = failure.backtrace() {
                detail.push('\n');
                detail.push_str(backtrace);
            }
            detail
        }
        None => format!(
            "{} does not match control value ({} != {})",
            candidate.name(),
            control.value(),
            candidate.value()
        ),
    };

    Err(Error::Mismatch {
        experiment: experiment.to_string(),
        candidate: candidate.name().to_string(),
        detail,
    })
}
