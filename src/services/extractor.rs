// src/services/extractor.rs

//! Doctrine text extraction from backend responses.
//!
//! Malformed records never fail a page: they are skipped and logged.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::Result;
use crate::models::{RawResponse, RenderedDocument, SearchHits, TextEntry};
use crate::utils::markup::UrlShield;
use crate::utils::parse_selector;

/// One or more blank lines between paragraphs.
pub const PARAGRAPH_BREAK: &str = r"\n\s*\n";

/// Caption text that precedes a doctrine block in listing pages.
pub const DOCTRINE_CAPTION: &str = "Doutrina";

/// Turns responses into text entries.
#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    text_field: String,
    paragraph_break: Regex,
    caption: Selector,
    caption_label: Selector,
    shield: UrlShield,
}

impl ResponseExtractor {
    /// `text_field` names the record field holding doctrine text.
    pub fn new(text_field: impl Into<String>) -> Result<Self> {
        Ok(Self {
            text_field: text_field.into(),
            paragraph_break: Regex::new(PARAGRAPH_BREAK)?,
            caption: parse_selector("p")?,
            caption_label: parse_selector("strong")?,
            shield: UrlShield::new()?,
        })
    }

    /// Extract entries in document order.
    pub fn extract(&self, response: &RawResponse) -> Vec<TextEntry> {
        match response {
            RawResponse::StructuredHits(hits) => self.extract_hits(hits),
            RawResponse::RenderedDocument(document) => self.extract_document(document),
        }
    }

    /// One entry per record carrying doctrine text.
    fn extract_hits(&self, hits: &SearchHits) -> Vec<TextEntry> {
        hits.records()
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let entry = self.extract_record(record);
                if entry.is_none() {
                    log::debug!("Record {index} has no usable '{}' field", self.text_field);
                }
                entry
            })
            .collect()
    }

    fn extract_record(&self, record: &Value) -> Option<TextEntry> {
        let source = record.get("_source").unwrap_or(record);
        let paragraphs = match source.as_object()?.get(&self.text_field)? {
            Value::String(text) => self.split_paragraphs(text),
            Value::Array(parts) => parts
                .iter()
                .filter_map(Value::as_str)
                .flat_map(|text| self.split_paragraphs(text))
                .collect(),
            _ => return None,
        };
        TextEntry::from_paragraphs(paragraphs)
    }

    /// Split on blank lines; single newlines stay inside a paragraph.
    pub fn split_paragraphs(&self, text: &str) -> Vec<String> {
        let text = text.replace("\r\n", "\n");
        self.paragraph_break
            .split(&text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// One entry per `pre` block that directly follows a "Doutrina" caption.
    fn extract_document(&self, document: &RenderedDocument) -> Vec<TextEntry> {
        let html = Html::parse_document(document.markup());

        html.select(&self.caption)
            .filter(|p| self.is_doctrine_caption(p))
            .filter_map(next_element_sibling)
            .filter(|sibling| sibling.value().name() == "pre")
            .filter_map(|pre| {
                let text: String = pre.text().collect();
                TextEntry::from_paragraphs(
                    text.lines()
                        .map(|line| self.shield.decode(line).trim().to_string()),
                )
            })
            .collect()
    }

    fn is_doctrine_caption(&self, p: &ElementRef) -> bool {
        p.select(&self.caption_label)
            .any(|label| label.text().collect::<String>().trim() == DOCTRINE_CAPTION)
    }
}

fn next_element_sibling<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ResponseExtractor {
        ResponseExtractor::new("doutrina").unwrap()
    }

    fn hits(json: &str) -> RawResponse {
        RawResponse::StructuredHits(SearchHits::from_json(json).unwrap())
    }

    fn document(raw: &str) -> RawResponse {
        let shield = UrlShield::new().unwrap();
        RawResponse::RenderedDocument(RenderedDocument::new(shield.encode(raw)))
    }

    #[test]
    fn test_split_on_blank_lines_only() {
        let paragraphs =
            extractor().split_paragraphs("Para one line A\nPara one line B\n\nPara two line C");
        assert_eq!(
            paragraphs,
            vec!["Para one line A\nPara one line B", "Para two line C"]
        );
    }

    #[test]
    fn test_split_collapses_blank_runs() {
        let paragraphs = extractor().split_paragraphs("  A \r\n \r\n\r\n\n B\n\n\n");
        assert_eq!(paragraphs, vec!["A", "B"]);
    }

    #[test]
    fn test_record_becomes_grouped_entry() {
        let entries = extractor().extract(&hits(
            r#"{"hits":{"total":1,"hits":[
                {"_source":{"doutrina":"Para one line A\nPara one line B\n\nPara two line C"}}
            ]}}"#,
        ));
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].paragraphs(),
            ["Para one line A\nPara one line B", "Para two line C"]
        );
    }

    #[test]
    fn test_skips_records_without_text() {
        let entries = extractor().extract(&hits(
            r#"{"hits":{"total":5,"hits":[
                {"_source":{"titulo":"no doctrine"}},
                {"_source":{"doutrina":42}},
                {"_source":{"doutrina":"   \n\n  "}},
                "not an object",
                {"_source":{"doutrina":"SILVA, José. Curso. 2019."}}
            ]}}"#,
        ));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].paragraphs(), ["SILVA, José. Curso. 2019."]);
    }

    #[test]
    fn test_array_field_and_bare_records() {
        let entries = extractor().extract(&hits(
            r#"{"hits":{"total":1,"hits":[{"doutrina":["A\n\nB", "C"]}]}}"#,
        ));
        assert_eq!(entries[0].paragraphs(), ["A", "B", "C"]);
    }

    #[test]
    fn test_rendered_doctrine_block() {
        let entries = extractor().extract(&document(
            r#"<html><body>
            <p><strong>Ementa</strong></p><pre>not doctrine</pre>
            <p><strong>Doutrina</strong></p>
            <pre>  MENDES, Gilmar. Curso de direito constitucional.

              BARROSO, Luís Roberto. O controle de constitucionalidade.  </pre>
            </body></html>"#,
        ));
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].paragraphs(),
            [
                "MENDES, Gilmar. Curso de direito constitucional.",
                "BARROSO, Luís Roberto. O controle de constitucionalidade."
            ]
        );
    }

    #[test]
    fn test_rendered_block_must_follow_caption() {
        let entries = extractor().extract(&document(
            r#"<p><strong>Doutrina</strong></p><div>interloper</div><pre>orphan</pre>"#,
        ));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_rendered_recovers_bracketed_urls() {
        let entries = extractor().extract(&document(
            "<p><strong>Doutrina</strong></p><pre>SOUZA, Ana. Artigo. Disponível em: <http://example.com/a b>. Acesso em: 1 jan. 2020.\nOutro.</pre>",
        ));
        assert_eq!(
            entries[0].paragraphs(),
            [
                "SOUZA, Ana. Artigo. Disponível em: <http://example.com/a b>. Acesso em: 1 jan. 2020.",
                "Outro."
            ]
        );
    }

    #[test]
    fn test_rendered_multiple_blocks() {
        let entries = extractor().extract(&document(
            r#"<div><p><strong>Doutrina</strong></p><pre>first</pre></div>
               <div><p><strong> Doutrina </strong></p><pre>second</pre></div>"#,
        ));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].paragraphs(), ["second"]);
    }
}
