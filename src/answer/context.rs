//! Context document handed to the chat model, and the sources it cites.
use serde::Serialize;

use crate::search::RankedMatch;

const NO_TEXT: &str = "No text available";

/// A cited document as shown under the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// Numbered passages plus their sources, in ranking order.
#[derive(Debug, Clone, Default)]
pub struct ContextDocument {
    pub text: String,
    pub sources: Vec<Source>,
}

impl ContextDocument {
    pub fn from_ranked(ranked: &[RankedMatch], text_field: &str) -> Self {
        let mut doc = Self::default();
        for (i, r) in ranked.iter().enumerate() {
            let text = r.candidate.text(text_field).unwrap_or(NO_TEXT);
            doc.text.push_str(&format!("\nDocument {}:\n{}\n", i + 1, text));
            doc.sources.push(Source {
                title: r.candidate.metadata_str("title").unwrap_or_default().to_string(),
                url: r.candidate.metadata_str("url").unwrap_or_default().to_string(),
            });
        }
        doc
    }
}
