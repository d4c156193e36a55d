//! Experiment configuration
//!
//! Everything that survives between runs of an experiment lives here; case
//! registrations never do.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::Result;

/// Default experiment name.
pub const DEFAULT_NAME: &str = "Experiment";

/// Long-lived experiment configuration.
///
/// Every field is optional when decoding; missing fields take the defaults
/// below.
///
/// | field               | default        |
/// |---------------------|----------------|
/// | `name`              | `"Experiment"` |
/// | `context`           | `{}`           |
/// | `raise_on_mismatch` | `false`        |
/// | `randomize`         | `true`         |
/// | `candidates_first`  | `false`        |
/// | `seed`              | none           |
///
/// ```rust
/// use crucible::ExperimentConfig;
///
/// let config = ExperimentConfig::from_json(r#"{"name": "search", "raise_on_mismatch": true}"#)?;
/// assert_eq!(config.name, "search");
/// assert!(config.raise_on_mismatch);
/// assert!(config.randomize);
/// # Ok::<(), crucible::Error>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Experiment name, used in logs and errors.
    pub name: String,
    /// Experiment-wide context, copied onto every observation.
    pub context: Context,
    /// Fail `conduct()` with a mismatch error instead of returning the
    /// control's value when any candidate disagrees.
    pub raise_on_mismatch: bool,
    /// Shuffle the execution order. When false, cases run in registration
    /// order.
    pub randomize: bool,
    /// Run every candidate before the control.
    pub candidates_first: bool,
    /// Seed for the shuffle, for reproducible execution orders.
    pub seed: Option<u64>,
    /// Capture a backtrace for every failed case even when `RUST_BACKTRACE`
    /// is unset. Raised mismatch messages then carry the trace.
    pub force_backtraces: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            context: Context::new(),
            raise_on_mismatch: false,
            randomize: true,
            candidates_first: false,
            seed: None,
            force_backtraces: false,
        }
    }
}

impl ExperimentConfig {
    /// Create a configuration with the given name and default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Decode a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the JSON is
    /// malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the experiment-wide context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Add one experiment-wide context entry.
    #[must_use]
    pub fn context_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Set whether mismatches fail `conduct()`.
    #[must_use]
    pub const fn raise_on_mismatch(mut self, raise: bool) -> Self {
        self.raise_on_mismatch = raise;
        self
    }

    /// Set whether the execution order is shuffled.
    #[must_use]
    pub const fn randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Set whether candidates run before the control.
    #[must_use]
    pub const fn candidates_first(mut self, candidates_first: bool) -> Self {
        self.candidates_first = candidates_first;
        self
    }

    /// Seed the shuffle.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set whether failed cases always capture a backtrace.
    #[must_use]
    pub const fn force_backtraces(mut self, force: bool) -> Self {
        self.force_backtraces = force;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.name, "Experiment");
        assert!(config.context.is_empty());
        assert!(!config.raise_on_mismatch);
        assert!(config.randomize);
        assert!(!config.candidates_first);
        assert!(config.seed.is_none());
        assert!(!config.force_backtraces);
    }

    #[test]
    fn test_builder() {
        let config = ExperimentConfig::new("search")
            .context_entry("region", "eu")
            .raise_on_mismatch(true)
            .randomize(false)
            .candidates_first(true)
            .seed(7)
            .force_backtraces(true);

        assert_eq!(config.name, "search");
        assert_eq!(config.context["region"], json!("eu"));
        assert!(config.raise_on_mismatch);
        assert!(!config.randomize);
        assert!(config.candidates_first);
        assert_eq!(config.seed, Some(7));
        assert!(config.force_backtraces);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = ExperimentConfig::from_json(r#"{"context": {"ctx": true}}"#).unwrap();
        assert_eq!(config.name, "Experiment");
        assert_eq!(config.context["ctx"], json!(true));
        assert!(config.randomize);
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let err = ExperimentConfig::from_json(r#"{"randomize": "yes"}"#).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ExperimentConfig::new("roundtrip").seed(42);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ExperimentConfig::from_json(&json).unwrap(), config);
    }
}
