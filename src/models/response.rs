// src/models/response.rs

//! Backend replies and the pagination plan derived from them.

use serde::Deserialize;
use serde_json::Value;

/// A decoded backend reply.
#[derive(Debug, Clone)]
pub enum RawResponse {
    /// JSON search hits from the structured backend
    StructuredHits(SearchHits),
    /// Listing page from the legacy backend
    RenderedDocument(RenderedDocument),
}

/// Search hits as returned by the structured backend.
///
/// Records stay as raw JSON so that one malformed record cannot reject
/// the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: HitsEnvelope,

    /// Facet counts; informational only
    #[serde(default)]
    pub aggregations: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub total: Option<HitsTotal>,

    #[serde(default)]
    pub hits: Vec<Value>,
}

/// Total hit count, either a bare number or `{"value": n, "relation": ...}`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum HitsTotal {
    Count(u64),
    Object { value: u64 },
}

impl HitsTotal {
    pub fn value(self) -> u64 {
        match self {
            Self::Count(value) | Self::Object { value } => value,
        }
    }
}

impl SearchHits {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn total(&self) -> Option<u64> {
        self.hits.total.map(HitsTotal::value)
    }

    pub fn records(&self) -> &[Value] {
        &self.hits.hits
    }
}

/// Listing page markup whose bracketed URLs are already percent-encoded.
///
/// See [`crate::utils::markup::UrlShield`].
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    markup: String,
}

impl RenderedDocument {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Pagination derived from the first response. Never revised mid-crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub total_pages: usize,
    pub per_page: usize,
}

impl PagePlan {
    /// Page indices still to fetch after page 0.
    pub fn remaining(&self) -> std::ops::Range<usize> {
        1..self.total_pages.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_as_object() {
        let hits = SearchHits::from_json(
            r#"{"hits":{"total":{"value":310,"relation":"eq"},"hits":[{"_source":{}}]}}"#,
        )
        .unwrap();
        assert_eq!(hits.total(), Some(310));
        assert_eq!(hits.records().len(), 1);
    }

    #[test]
    fn test_total_as_number() {
        let hits = SearchHits::from_json(r#"{"hits":{"total":7,"hits":[]}}"#).unwrap();
        assert_eq!(hits.total(), Some(7));
    }

    #[test]
    fn test_missing_hits() {
        let hits = SearchHits::from_json("{}").unwrap();
        assert_eq!(hits.total(), None);
        assert!(hits.records().is_empty());
    }

    #[test]
    fn test_remaining_pages() {
        let plan = PagePlan {
            total_pages: 3,
            per_page: 150,
        };
        assert_eq!(plan.remaining().collect::<Vec<_>>(), vec![1, 2]);

        let empty = PagePlan {
            total_pages: 0,
            per_page: 150,
        };
        assert_eq!(empty.remaining().count(), 0);
    }
}
