// src/models/entry.rs

//! Harvested entries and the crawl result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered, non-empty group of trimmed paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextEntry(Vec<String>);

impl TextEntry {
    /// Build an entry from raw paragraphs.
    ///
    /// Paragraphs are trimmed and blank ones dropped. Returns `None` when
    /// nothing remains.
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        (!paragraphs.is_empty()).then_some(Self(paragraphs))
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.0
    }

    pub fn into_paragraphs(self) -> Vec<String> {
        self.0
    }
}

/// A page that failed after the crawl was planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
    /// Zero-based page index
    pub page: usize,
    pub message: String,
}

/// Lifecycle of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    NotStarted,
    FirstPageInFlight,
    Planning,
    FanningOut,
    Draining,
    Complete,
    /// Stopped by the caller; the result holds the pages completed so far
    Cancelled,
    Failed,
}

impl CrawlState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: CrawlState) -> bool {
        use CrawlState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (NotStarted, FirstPageInFlight)
            | (FirstPageInFlight, Planning)
            | (Planning, FanningOut)
            | (Planning, Draining)
            | (FanningOut, Draining)
            | (Draining, Complete) => true,
            (FirstPageInFlight | Planning | FanningOut | Draining, Cancelled) => true,
            _ => false,
        }
    }
}

/// Outcome of one crawl. Frozen once the crawl reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub entries: Vec<TextEntry>,
    /// Pages fetched and decoded successfully, page 0 included
    pub pages_fetched: usize,
    /// Page count derived from the first response
    pub total_pages: usize,
    pub errors: Vec<PageError>,
    pub state: CrawlState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// JSON shape served to consumers: `{"items": [[paragraph, ...], ...]}`.
#[derive(Debug, Serialize)]
pub struct Items<'a> {
    pub items: &'a [TextEntry],
}

impl CrawlResult {
    pub fn is_complete(&self) -> bool {
        self.state == CrawlState::Complete
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Entries wrapped for the JSON download format.
    pub fn items(&self) -> Items<'_> {
        Items {
            items: &self.entries,
        }
    }

    /// Plain-text rendering: every paragraph separated by a blank line.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.paragraphs().join("\n\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
