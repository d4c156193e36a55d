//! # Crucible: refactoring experiments in the live call path
//!
//! Crucible runs a replacement implementation (a *candidate*) next to the
//! code it replaces (the *control*), compares their outcomes, and reports
//! discrepancies, while the caller always receives the control's outcome.
//!
//! ## Guarantees
//!
//! - The control's value, error, or panic reaches the caller unchanged
//! - Candidate errors and panics are contained and recorded, never propagated
//! - Publishing failures are logged and discarded
//! - Execution order is shuffled by default, ordered or seeded on request
//! - Each case sees its own copy of the context; no case can observe
//!   another's modifications
//!
//! Mismatches surface only through the publisher, or as
//! [`Error::Mismatch`] when the experiment is configured to raise.
//!
//! ## Example
//!
//! ```rust
//! use crucible::{Experiment, ExperimentResult};
//!
//! let mut experiment: Experiment<String> = Experiment::new("render-greeting")
//!     .with_context_entry("user_id", 7)
//!     .publisher(|result: &ExperimentResult<String, crucible::Error>| -> anyhow::Result<()> {
//!         if !result.matched() {
//!             eprintln!("{result}");
//!         }
//!         Ok(())
//!     });
//!
//! experiment.control(|| Ok(format!("Hello, {}!", "world")))?;
//! experiment.candidate(|| Ok(["Hello, ", "world", "!"].concat()));
//!
//! assert_eq!(experiment.conduct()?, "Hello, world!");
//! # Ok::<(), crucible::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod comparator;
pub mod config;
pub mod context;
pub mod error;
pub mod experiment;
pub mod observation;
pub mod publisher;
pub mod result;
pub mod shadow;

pub use comparator::{Comparator, Tolerance, ValueEquality};
pub use config::ExperimentConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use experiment::Experiment;
pub use observation::{Failure, FailureCause, Observation, ObservationStatus, Recorded};
pub use publisher::{LogPublisher, NoopPublisher, Publisher};
pub use result::{ExperimentResult, ObservationSummary, ResultSummary};
pub use shadow::Shadow;
