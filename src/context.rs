//! Per-run metadata attached to experiments and observations

use std::collections::BTreeMap;

use serde_json::Value;

/// String-keyed metadata carried by an experiment and copied onto every
/// observation it produces.
pub type Context = BTreeMap<String, Value>;

/// Copy `base`, then overlay `overlay` onto the copy.
///
/// Keys present in both take the overlay's value. Neither input is modified.
#[must_use]
pub fn merge(base: &Context, overlay: &Context) -> Context {
    let mut merged = base.clone();
    merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(pairs: &[(&str, Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_overlay_wins_on_conflict() {
        let base = ctx(&[("ctx", json!(true))]);
        let overlay = ctx(&[("ctx", json!(false)), ("candidate", json!(true))]);

        let merged = merge(&base, &overlay);

        assert_eq!(merged, ctx(&[("ctx", json!(false)), ("candidate", json!(true))]));
        assert_eq!(base, ctx(&[("ctx", json!(true))]));
    }

    #[test]
    fn test_merge_into_copy_is_isolated() {
        let base = ctx(&[("a", json!(1))]);
        let mut merged = merge(&base, &Context::new());
        merged.insert("a".to_string(), json!(2));

        assert_eq!(base["a"], json!(1));
    }
}
