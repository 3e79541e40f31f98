// src/models/criteria.rs

//! Search criteria for a single crawl.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What to search for. Read-only once a crawl starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    text: String,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl SearchCriteria {
    /// Create criteria, rejecting blank text and inverted date ranges.
    pub fn new(
        text: impl Into<String>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(AppError::validation("search text is empty"));
        }
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(AppError::validation(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }
        Ok(Self {
            text,
            date_from,
            date_to,
        })
    }

    /// Create criteria from `YYYY-MM-DD` strings. Empty strings mean no bound.
    pub fn parse(text: impl Into<String>, date_from: &str, date_to: &str) -> Result<Self> {
        Self::new(text, parse_date(date_from)?, parse_date(date_to)?)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date_from(&self) -> Option<NaiveDate> {
        self.date_from
    }

    pub fn date_to(&self) -> Option<NaiveDate> {
        self.date_to
    }

    /// Key identifying this crawl, e.g. `habeas corpus/2020-01-01-2020-12-31`.
    ///
    /// Two submissions with the same key describe the same crawl.
    pub fn job_key(&self) -> String {
        format!(
            "{}/{}-{}",
            self.text,
            format_bound(self.date_from),
            format_bound(self.date_to)
        )
    }
}

fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|e| AppError::validation(format!("invalid date '{value}': {e}")))
}

fn format_bound(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
