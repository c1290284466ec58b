//! Hybrid retrieval: vector similarity from the hosted index, re-ranked
//! with a keyword-presence boost.
pub mod index;
pub mod keywords;
pub mod rerank;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use index::{SearchError, VectorSearch, normalize_query_url};
pub use keywords::extract_keywords;
pub use rerank::{RankedMatch, rerank};

/// One match returned by the index, before any boosting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CandidateMatch {
    /// String metadata value under `field`, if present.
    pub fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).and_then(Value::as_str)
    }

    /// Passage text stored under the deployment's text field.
    pub fn text(&self, text_field: &str) -> Option<&str> {
        self.metadata_str(text_field)
    }
}
