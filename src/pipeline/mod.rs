//! Pipeline entry points for crawl operations.
//!
//! - `JurisCrawler`: drives a crawl over any fetch capability
//! - `run_crawler`: one HTTP crawl built from configuration

pub mod crawl;

pub use crawl::{JurisCrawler, run_crawler};
