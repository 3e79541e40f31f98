//! Service layer for the harvester.
//!
//! This module contains the components driven by the crawl pipeline:
//! - Request body construction (`QueryBuilder`)
//! - Page count discovery (`PaginationPlanner`)
//! - Doctrine text extraction (`ResponseExtractor`)
//! - Backend dispatch (`Backend`) and the fetch capability (`Fetch`)

mod backend;
mod extractor;
mod fetch;
mod planner;
pub mod query;

pub use backend::{Backend, PageQuery, PageRequest};
pub use extractor::ResponseExtractor;
pub use fetch::{Fetch, HttpFetcher};
pub use planner::PaginationPlanner;
pub use query::{QueryBuilder, QueryOutcome, SearchRequestBody};
