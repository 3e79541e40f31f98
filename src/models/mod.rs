// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod criteria;
mod entry;
mod response;

// Re-export all public types
pub use config::{Config, CrawlerConfig, EntryOrdering, LegacyConfig, SearchConfig};
pub use criteria::SearchCriteria;
pub use entry::{CrawlResult, CrawlState, Items, PageError, TextEntry};
pub use response::{HitsEnvelope, HitsTotal, PagePlan, RawResponse, RenderedDocument, SearchHits};
