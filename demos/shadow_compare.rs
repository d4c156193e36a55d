//! Shadow Compare Example
//!
//! Runs a rewritten word counter in the shadow of the legacy one and logs
//! every disagreement through `LogPublisher`.
//!
//! Run with: RUST_LOG=crucible=debug cargo run --example shadow_compare

use std::collections::BTreeMap;

use crucible::{Context, Experiment, ExperimentConfig, LogPublisher, Shadow};
use tracing_subscriber::EnvFilter;

type Counts = BTreeMap<String, usize>;

fn legacy_counts(text: &str) -> crucible::Result<Counts> {
    let mut counts = Counts::new();
    for word in text.split_whitespace() {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if !word.is_empty() {
            *counts.entry(word).or_default() += 1;
        }
    }
    Ok(counts)
}

// Splits on punctuation too, so "don't" becomes two words.
fn rewritten_counts(text: &str) -> crucible::Result<Counts> {
    let mut counts = Counts::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        *counts.entry(word.to_lowercase()).or_default() += 1;
    }
    Ok(counts)
}

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crucible=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Crucible Shadow Compare ===\n");

    // -------------------------------------------------------------------------
    // 1. Wrap the legacy function once, call it many times
    // -------------------------------------------------------------------------
    let counter = Shadow::new(legacy_counts, rewritten_counts)
        .config(ExperimentConfig::new("word-counts").context_entry("source", "demo"))
        .candidate_case("split-on-punctuation", Context::new())
        .publisher(LogPublisher);

    for text in ["the cat sat on the mat", "Don't panic.", "one, two; three"] {
        let counts = counter.call(text)?;
        println!("{text:?} -> {counts:?}");
    }

    // -------------------------------------------------------------------------
    // 2. A one-off experiment with several candidates
    // -------------------------------------------------------------------------
    println!();
    let text = "It's a test, it's only a test";
    let mut experiment: Experiment<'_, Counts> = Experiment::new("word-counts-adhoc")
        .seed(7)
        .publisher(LogPublisher);
    experiment.control(|| legacy_counts(text))?;
    experiment
        .candidate_with("rewrite", Context::new(), |_| rewritten_counts(text))
        .candidate_with("legacy-again", Context::new(), |_| legacy_counts(text));

    let counts = experiment.conduct()?;
    println!("{text:?} -> {counts:?}");

    Ok(())
}
