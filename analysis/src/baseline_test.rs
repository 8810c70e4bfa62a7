use crate::baseline::BaselineSelector;
use std::collections::BTreeSet;

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

#[test]
pub fn default_infers_from_names() {
    let candidates = names(&["tmp_benchmark_wide", "tmp_df8", "tmp_benchmark_text"]);

    assert_eq!(
        BaselineSelector::default().resolve(&candidates),
        names(&["tmp_benchmark_text", "tmp_benchmark_wide"])
    );
}

#[test]
pub fn explicit_list_wins() {
    let candidates = names(&["tmp_benchmark_wide", "tmp_flat_raw", "tmp_df8"]);
    let selector = BaselineSelector::explicit(["tmp_flat_raw"]);

    assert_eq!(selector.resolve(&candidates), names(&["tmp_flat_raw"]));
}

#[test]
pub fn explicit_names_without_runs_are_dropped() {
    let candidates = names(&["tmp_df8", "tmp_df9"]);
    let selector = BaselineSelector::explicit(["tmp_df9", "tmp_gone"]);

    assert_eq!(selector.resolve(&candidates), names(&["tmp_df9"]));
}

#[test]
pub fn no_match_is_empty() {
    let candidates = names(&["tmp_df8", "tmp_df9"]);

    assert!(BaselineSelector::pattern("flat").resolve(&candidates).is_empty());
}
