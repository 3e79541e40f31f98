//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and fan-out behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Structured search backend settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Legacy rendered-document backend settings
    #[serde(default)]
    pub legacy: LegacyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.search.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }
        if self.search.window_max < self.search.page_size {
            return Err(AppError::validation(
                "search.window_max must be >= search.page_size",
            ));
        }
        if self.search.text_field.trim().is_empty() {
            return Err(AppError::validation("search.text_field is empty"));
        }
        url::Url::parse(&self.search.endpoint)
            .map_err(|e| AppError::validation(format!("search.endpoint: {e}")))?;
        url::Url::parse(&self.legacy.base_url)
            .map_err(|e| AppError::validation(format!("legacy.base_url: {e}")))?;
        scraper::Selector::parse(&self.legacy.page_indicator_selector).map_err(|e| {
            AppError::selector(&self.legacy.page_indicator_selector, format!("{e:?}"))
        })?;
        Ok(())
    }
}

/// Order in which entries from different pages land in the result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrdering {
    /// Entries follow ascending page index regardless of completion order
    #[default]
    Ascending,
    /// Entries are appended as pages complete
    Completion,
}

/// HTTP client and fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum page requests in flight
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Cross-page ordering of harvested entries
    #[serde(default)]
    pub ordering: EntryOrdering,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            ordering: EntryOrdering::default(),
        }
    }
}

/// Structured search backend settings.
///
/// `page_size` and `window_max` are the pagination constants shared by the
/// query builder and the pagination planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint receiving the query body
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Hits requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Largest `from + size` the backend serves for one query
    #[serde(default = "defaults::window_max")]
    pub window_max: usize,

    /// Record field holding the doctrine text
    #[serde(default = "defaults::text_field")]
    pub text_field: String,

    /// Fuzziness for lexical matching
    #[serde(default = "defaults::fuzziness")]
    pub fuzziness: String,

    /// Recency decay origin
    #[serde(default = "defaults::decay_origin")]
    pub decay_origin: String,

    /// Distance from origin at which the recency score halves
    #[serde(default = "defaults::decay_half_life")]
    pub decay_half_life: String,

    /// Distance from origin within which no decay applies
    #[serde(default = "defaults::decay_offset")]
    pub decay_offset: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            page_size: defaults::page_size(),
            window_max: defaults::window_max(),
            text_field: defaults::text_field(),
            fuzziness: defaults::fuzziness(),
            decay_origin: defaults::decay_origin(),
            decay_half_life: defaults::decay_half_life(),
            decay_offset: defaults::decay_offset(),
        }
    }
}

/// Legacy rendered-document backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Listing page URL
    #[serde(default = "defaults::legacy_base_url")]
    pub base_url: String,

    /// Document base searched by the listing page
    #[serde(default = "defaults::legacy_base")]
    pub base: String,

    /// Query parameter carrying the one-based page number
    #[serde(default = "defaults::page_param")]
    pub page_param: String,

    /// Judgments listed per page
    #[serde(default = "defaults::legacy_per_page")]
    pub per_page: usize,

    /// Element holding the "current / total" page indicator
    #[serde(default = "defaults::page_indicator_selector")]
    pub page_indicator_selector: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::legacy_base_url(),
            base: defaults::legacy_base(),
            page_param: defaults::page_param(),
            per_page: defaults::legacy_per_page(),
            page_indicator_selector: defaults::page_indicator_selector(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; juris/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Search defaults
    pub fn endpoint() -> String {
        "https://jurisprudencia.stf.jus.br/api/search/search".into()
    }
    pub fn page_size() -> usize {
        150
    }
    pub fn window_max() -> usize {
        10_000
    }
    pub fn text_field() -> String {
        "doutrina".into()
    }
    pub fn fuzziness() -> String {
        "AUTO".into()
    }
    pub fn decay_origin() -> String {
        "now".into()
    }
    pub fn decay_half_life() -> String {
        "1825d".into()
    }
    pub fn decay_offset() -> String {
        "30d".into()
    }

    // Legacy defaults
    pub fn legacy_base_url() -> String {
        "https://www.stf.jus.br/portal/jurisprudencia/listarJurisprudencia.asp".into()
    }
    pub fn legacy_base() -> String {
        "baseAcordaos".into()
    }
    pub fn page_param() -> String {
        "pagina".into()
    }
    pub fn legacy_per_page() -> usize {
        10
    }
    pub fn page_indicator_selector() -> String {
        ".paginacao".into()
    }
}
