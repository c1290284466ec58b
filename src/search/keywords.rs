//! Boost terms derived from the raw question.
use std::collections::BTreeSet;

/// Trigger substrings and the synonym cluster each one unions in.
const CLUSTERS: &[(&[&str], &[&str])] = &[
    (
        &["wellness", "health"],
        &["timelycare", "wellness", "services", "health"],
    ),
    (&["program", "study"], &["certificate", "program", "course"]),
    (&["free", "cost"], &["tuition", "free", "cost", "financial"]),
];

/// Whitespace tokens of the lower-cased query plus the synonym clusters
/// whose trigger words occur anywhere in it.
///
/// Only membership matters to scoring, so the result is a set.
pub fn extract_keywords(query: &str) -> BTreeSet<String> {
    let lowered = query.to_lowercase();
    let mut keywords: BTreeSet<String> = lowered.split_whitespace().map(str::to_string).collect();

    for (triggers, cluster) in CLUSTERS {
        if triggers.iter().any(|t| lowered.contains(t)) {
            keywords.extend(cluster.iter().map(|k| (*k).to_string()));
        }
    }

    keywords
}
