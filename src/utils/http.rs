// src/utils/http.rs

//! HTTP client construction.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Both backends serve Portuguese content; the legacy one negotiates on it.
const ACCEPT_LANGUAGE_VALUE: &str = "pt-BR,pt;q=0.9";
const ACCEPT_VALUE: &str = "application/json, text/html;q=0.9, */*;q=0.8";

/// Build the shared client used for every page of a crawl.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(default_headers())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let headers = default_headers();
        assert_eq!(headers[ACCEPT_LANGUAGE], ACCEPT_LANGUAGE_VALUE);
        assert!(headers[ACCEPT].to_str().unwrap().starts_with("application/json"));
    }

    #[test]
    fn test_client_builds_from_config() {
        assert!(create_async_client(&CrawlerConfig::default()).is_ok());
    }
}
