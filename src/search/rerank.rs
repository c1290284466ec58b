//! Keyword-boosted re-ranking of vector search candidates.
use std::collections::BTreeSet;

use serde::Serialize;

use super::CandidateMatch;

/// Added to the similarity score for every keyword found in the passage.
pub const KEYWORD_BOOST: f32 = 0.1;

/// Upper bound of a boosted score.
pub const MAX_SCORE: f32 = 1.0;

/// A candidate together with its boosted score.
///
/// `candidate.score` keeps the raw similarity; the boost lives only in
/// `boosted_score`, so re-ranking the same candidates again recomputes the
/// same values instead of stacking boosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub candidate: CandidateMatch,
    pub keyword_hits: usize,
    pub boosted_score: f32,
}

/// Boost each candidate by its keyword hits, sort descending (stable) and
/// keep the first `top_k`.
pub fn rerank(
    matches: Vec<CandidateMatch>,
    keywords: &BTreeSet<String>,
    top_k: usize,
    text_field: &str,
) -> Vec<RankedMatch> {
    if matches.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<RankedMatch> = matches
        .into_iter()
        .map(|candidate| {
            let text = candidate.text(text_field).unwrap_or_default().to_lowercase();
            let keyword_hits = keywords.iter().filter(|k| text.contains(k.as_str())).count();
            let boosted_score = boosted(candidate.score, keyword_hits);
            RankedMatch {
                candidate,
                keyword_hits,
                boosted_score,
            }
        })
        .collect();

    // `sort_by` is stable: equal scores keep vector-search order.
    ranked.sort_by(|a, b| b.boosted_score.total_cmp(&a.boosted_score));
    ranked.truncate(top_k);
    ranked
}

fn boosted(score: f32, hits: usize) -> f32 {
    (score + hits as f32 * KEYWORD_BOOST).clamp(0.0, MAX_SCORE)
}
