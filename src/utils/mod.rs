//! Utility functions and helpers.

pub mod http;
pub mod markup;

use scraper::Selector;
use url::Url;

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Append query parameters to a base URL, keeping the ones already present.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url.to_string())
}
