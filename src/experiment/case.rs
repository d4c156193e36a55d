//! Registered control/candidate cases and their contained execution

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::context::{self, Context};
use crate::observation::{Failure, FailureCause, Observation};

type CaseFn<'a, T, E> = Box<dyn FnOnce(&mut Context) -> Result<T, E> + 'a>;

/// A registered control or candidate: the callable with its captured
/// arguments, a display name, and a context overlay.
pub(crate) struct Case<'a, T, E> {
    name: String,
    context: Context,
    func: CaseFn<'a, T, E>,
}

impl<'a, T, E> Case<'a, T, E> {
    pub(crate) fn new<F>(name: impl Into<String>, context: Context, func: F) -> Self
    where
        F: FnOnce(&mut Context) -> Result<T, E> + 'a,
    {
        Self {
            name: name.into(),
            context,
            func: Box::new(func),
        }
    }

    /// Run without observation or containment. Errors and panics propagate
    /// exactly as if the callable had been invoked directly.
    pub(crate) fn call(self, base: &Context) -> Result<T, E> {
        let mut context = context::merge(base, &self.context);
        (self.func)(&mut context)
    }

    /// Run as the control. The observation is returned on success; a
    /// returned error is handed back unchanged and a panic is resumed, both
    /// after the observation has completed.
    pub(crate) fn observe_control(
        self,
        base: &Context,
        force_backtrace: bool,
    ) -> Result<Observation<T, E>, E> {
        let (mut obs, payload) = self.observe(base, force_backtrace);
        if let Some(payload) = payload {
            tracing::debug!(case = obs.name(), "control panicked, resuming unwind");
            panic::resume_unwind(payload);
        }
        match obs.take_failure().map(Failure::into_cause) {
            Some(FailureCause::Error(err)) => {
                tracing::debug!(case = obs.name(), "control failed, propagating its error");
                Err(err)
            }
            // panics were resumed above
            Some(FailureCause::Panic(_)) | None => Ok(obs),
        }
    }

    /// Run as a candidate. Failures of any kind stay on the observation.
    pub(crate) fn observe_candidate(
        self,
        base: &Context,
        force_backtrace: bool,
    ) -> Observation<T, E> {
        let (obs, _payload) = self.observe(base, force_backtrace);
        if obs.failed() {
            let panicked = obs.failure().is_some_and(Failure::is_panic);
            tracing::debug!(case = obs.name(), panicked, "candidate failed");
        }
        obs
    }

    fn observe(
        self,
        base: &Context,
        force_backtrace: bool,
    ) -> (Observation<T, E>, Option<Box<dyn Any + Send>>) {
        let Self { name, context, func } = self;
        let mut obs = Observation::new(name, context::merge(base, &context));

        obs.start();
        tracing::trace!(case = obs.name(), "case started");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| func(obs.context_mut())));

        let payload = match outcome {
            Ok(Ok(value)) => {
                obs.record(value);
                None
            }
            Ok(Err(err)) => {
                obs.fail(FailureCause::Error(err), force_backtrace);
                None
            }
            Err(payload) => {
                obs.fail(
                    FailureCause::Panic(panic_message(payload.as_ref())),
                    force_backtrace,
                );
                Some(payload)
            }
        };
        obs.finish();
        tracing::trace!(
            case = obs.name(),
            duration = ?obs.duration(),
            failed = obs.failed(),
            "case completed"
        );

        (obs, payload)
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
