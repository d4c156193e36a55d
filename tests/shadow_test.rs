//! Shadow adapter integration tests

use std::cell::{Cell, RefCell};

use crucible::{
    Context, Error, ExperimentConfig, ExperimentResult, Observation, ResultSummary, Shadow,
};
use serde_json::json;

fn legacy_slug(title: String) -> crucible::Result<String> {
    Ok(title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-"))
}

fn new_slug(title: String) -> crucible::Result<String> {
    Ok(title.to_lowercase().replace(' ', "-"))
}

fn same_magnitude(a: &Observation<i32, Error>, b: &Observation<i32, Error>) -> bool {
    a.value().as_option().map(|v| v.abs()) == b.value().as_option().map(|v| v.abs())
}

#[test]
fn test_shadow_returns_control_value() {
    let slug = Shadow::new(legacy_slug, new_slug);
    assert_eq!(slug.call("Hello World".to_string()).unwrap(), "hello-world");
}

#[test]
fn test_shadow_publishes_divergence() {
    let published: RefCell<Vec<ResultSummary>> = RefCell::new(Vec::new());
    let slug = Shadow::new(legacy_slug, new_slug)
        .config(ExperimentConfig::new("slug").context_entry("source", "blog"))
        .publisher(|r: &ExperimentResult<String, Error>| -> anyhow::Result<()> {
            published.borrow_mut().push(r.summary());
            Ok(())
        });

    // double space: legacy collapses it, the rewrite does not
    assert_eq!(slug.call("Hello  World".to_string()).unwrap(), "hello-world");

    let published = published.borrow();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].experiment, "slug");
    assert_eq!(published[0].context["source"], json!("blog"));
    assert!(!published[0].matched);
    assert_eq!(published[0].candidates[0].value.as_deref(), Some(r#""hello--world""#));
}

#[test]
fn test_shadow_raise_on_mismatch() {
    let slug = Shadow::new(legacy_slug, new_slug)
        .config(ExperimentConfig::new("slug").raise_on_mismatch(true).seed(3));

    assert!(slug.call("one two".to_string()).is_ok());
    let err = slug.call("one  two".to_string()).unwrap_err();
    assert!(err.is_mismatch());
}

#[test]
fn test_shadow_disabled_skips_candidate() {
    let candidate_calls = Cell::new(0);
    let shadow: Shadow<'_, u8, u8> = Shadow::new(Ok, |x: u8| {
        candidate_calls.set(candidate_calls.get() + 1);
        Ok(x)
    })
    .enabled_when(|| false);

    assert_eq!(shadow.call(5).unwrap(), 5);
    assert_eq!(candidate_calls.get(), 0);
}

#[test]
fn test_shadow_case_names_and_context() {
    let names = RefCell::new(Vec::new());
    let shadow: Shadow<'_, u8, u8> = Shadow::new(Ok, Ok)
        .control_case("v1", Context::new())
        .candidate_case("v2", Context::from([("rollout".to_string(), json!(0.1))]))
        .publisher(|r: &ExperimentResult<u8, Error>| -> anyhow::Result<()> {
            let candidate = &r.candidates()[0];
            names.borrow_mut().push((
                r.control().name().to_string(),
                candidate.name().to_string(),
                candidate.context().get("rollout").cloned(),
            ));
            Ok(())
        });

    shadow.call(1).unwrap();

    assert_eq!(
        *names.borrow(),
        vec![("v1".to_string(), "v2".to_string(), Some(json!(0.1)))]
    );
}

#[test]
fn test_shadow_custom_comparator() {
    let shadow: Shadow<'_, i32, i32> = Shadow::new(|x: i32| Ok(x), |x: i32| Ok(-x))
        .config(ExperimentConfig::default().raise_on_mismatch(true))
        .comparator(same_magnitude);

    assert_eq!(shadow.call(-4).unwrap(), -4);
    assert_eq!(shadow.call(9).unwrap(), 9);
}

#[test]
fn test_shadow_functions_see_their_own_context() {
    let contexts = RefCell::new(Vec::new());
    let shadow: Shadow<'_, u8, u8> = Shadow::with_context(
        |x: u8, ctx: &mut Context| {
            ctx.insert("path".to_string(), json!("legacy"));
            Ok(x)
        },
        |x: u8, ctx: &mut Context| {
            let region = ctx.get("region").cloned();
            ctx.insert("path".to_string(), json!("rewrite"));
            ctx.insert("saw_region".to_string(), json!(region.is_some()));
            Ok(x)
        },
    )
    .config(ExperimentConfig::new("ctx").context_entry("region", "eu"))
    .publisher(|r: &ExperimentResult<u8, Error>| -> anyhow::Result<()> {
        contexts
            .borrow_mut()
            .push((r.control().context().clone(), r.candidates()[0].context().clone()));
        Ok(())
    });

    assert_eq!(shadow.call(3).unwrap(), 3);

    let contexts = contexts.borrow();
    let (control, candidate) = &contexts[0];
    assert_eq!(control["path"], json!("legacy"));
    assert_eq!(control["region"], json!("eu"));
    assert!(!control.contains_key("saw_region"));
    assert_eq!(candidate["path"], json!("rewrite"));
    assert_eq!(candidate["saw_region"], json!(true));
}
