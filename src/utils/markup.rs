// src/utils/markup.rs

//! Protection of bracketed literal URLs in legacy listing markup.
//!
//! Legacy listing pages write references as `<http://host/path with spaces>`
//! inside `pre` blocks. A markup parser reads such text as a start tag and
//! the reference disappears from the extracted text. Before parsing, every
//! byte between the brackets is percent-encoded (`<%68%74...>`). A `<`
//! followed by `%` cannot open a tag, so the run survives as plain text and
//! is decoded back after extraction.

use std::borrow::Cow;

use regex::{Captures, Regex};

use crate::error::Result;

/// A literal URL between angle brackets: `<scheme://...>` or `<www....>`.
pub const BRACKETED_URL: &str = r"(?i)<((?:https?|ftp)://[^<>]*|www\.[^<>]*)>";

/// A bracketed run made only of percent-encoded bytes.
pub const ENCODED_RUN: &str = r"<((?:%[0-9A-Fa-f]{2})+)>";

/// Encodes bracketed URLs before parsing and restores them afterwards.
#[derive(Debug, Clone)]
pub struct UrlShield {
    bracketed: Regex,
    encoded: Regex,
}

impl UrlShield {
    pub fn new() -> Result<Self> {
        Ok(Self {
            bracketed: Regex::new(BRACKETED_URL)?,
            encoded: Regex::new(ENCODED_RUN)?,
        })
    }

    /// Percent-encode the contents of every bracketed URL in `raw`.
    pub fn encode<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        self.bracketed.replace_all(raw, |caps: &Captures| {
            format!("<{}>", percent_encode_all(&caps[1]))
        })
    }

    /// Decode runs produced by [`UrlShield::encode`], leaving other text alone.
    pub fn decode<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.encoded.replace_all(text, |caps: &Captures| {
            match urlencoding::decode(&caps[1]) {
                Ok(url) => format!("<{url}>"),
                Err(_) => caps[0].to_string(),
            }
        })
    }
}

/// Percent-encode every byte, including unreserved ones.
fn percent_encode_all(value: &str) -> String {
    value.bytes().map(|b| format!("%{b:02X}")).collect()
}
