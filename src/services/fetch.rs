// src/services/fetch.rs

//! Fetch capability consumed by the crawl orchestrator.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::services::query::SearchRequestBody;
use crate::utils::http::create_async_client;

/// Performs one request and returns the reply body.
///
/// Implementations fail on unreachable backends and non-success statuses.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, body: Option<&SearchRequestBody>) -> Result<String>;
}

/// [`Fetch`] over HTTP: POSTs JSON when a body is given, GETs otherwise.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, body: Option<&SearchRequestBody>) -> Result<String> {
        let request = match body {
            Some(body) => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_json()),
            None => self.client.get(url),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
