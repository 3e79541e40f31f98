// src/services/planner.rs

//! Pagination planning from the first response of a crawl.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{PagePlan, RawResponse, RenderedDocument, SearchHits};
use crate::utils::parse_selector;

/// A "current / total" page indicator, e.g. `1 / 7` or `Página 3/12`.
pub const PAGE_INDICATOR: &str = r"(\d+)\s*/\s*(\d+)";

/// Derives the page count of a crawl.
#[derive(Debug, Clone)]
pub struct PaginationPlanner {
    per_page: usize,
    rendered_per_page: usize,
    indicator: Selector,
    indicator_pattern: Regex,
}

impl PaginationPlanner {
    /// `per_page` must be the page size used by the query builder.
    pub fn new(per_page: usize, rendered_per_page: usize, indicator_selector: &str) -> Result<Self> {
        Ok(Self {
            per_page,
            rendered_per_page,
            indicator: parse_selector(indicator_selector)?,
            indicator_pattern: Regex::new(PAGE_INDICATOR)?,
        })
    }

    /// Plan the crawl from its first response.
    ///
    /// Fails only when structured hits carry no total count.
    pub fn plan(&self, first: &RawResponse) -> Result<PagePlan> {
        match first {
            RawResponse::StructuredHits(hits) => self.plan_hits(hits),
            RawResponse::RenderedDocument(document) => Ok(self.plan_document(document)),
        }
    }

    fn plan_hits(&self, hits: &SearchHits) -> Result<PagePlan> {
        let total = hits
            .total()
            .ok_or_else(|| AppError::planning("first response carries no total hit count"))?;
        let total = usize::try_from(total).unwrap_or(usize::MAX);

        Ok(PagePlan {
            total_pages: total.div_ceil(self.per_page.max(1)),
            per_page: self.per_page,
        })
    }

    fn plan_document(&self, document: &RenderedDocument) -> PagePlan {
        let html = Html::parse_document(document.markup());
        let total_pages = html
            .select(&self.indicator)
            .next()
            .map(|element| element.text().collect::<String>())
            .and_then(|text| self.parse_indicator(&text))
            .unwrap_or_else(|| {
                log::debug!("No page indicator found; treating listing as a single page");
                1
            });

        PagePlan {
            total_pages,
            per_page: self.rendered_per_page,
        }
    }

    /// Total from a `current / total` indicator, if the text holds one.
    fn parse_indicator(&self, text: &str) -> Option<usize> {
        let caps = self.indicator_pattern.captures(text)?;
        caps.get(2)?.as_str().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> PaginationPlanner {
        PaginationPlanner::new(150, 10, ".paginacao").unwrap()
    }

    fn hits(json: &str) -> RawResponse {
        RawResponse::StructuredHits(SearchHits::from_json(json).unwrap())
    }

    fn document(markup: &str) -> RawResponse {
        RawResponse::RenderedDocument(RenderedDocument::new(markup))
    }

    #[test]
    fn test_total_hits_rounds_up() {
        let plan = planner()
            .plan(&hits(r#"{"hits":{"total":{"value":310},"hits":[]}}"#))
            .unwrap();
        assert_eq!(plan.total_pages, 3);
        assert_eq!(plan.per_page, 150);
    }

    #[test]
    fn test_exact_multiple() {
        let plan = planner()
            .plan(&hits(r#"{"hits":{"total":300,"hits":[]}}"#))
            .unwrap();
        assert_eq!(plan.total_pages, 2);
    }

    #[test]
    fn test_empty_result_set() {
        let plan = planner()
            .plan(&hits(r#"{"hits":{"total":{"value":0},"hits":[]}}"#))
            .unwrap();
        assert_eq!(plan.total_pages, 0);
        assert_eq!(plan.remaining().count(), 0);
    }

    #[test]
    fn test_missing_total_is_fatal() {
        let err = planner().plan(&hits(r#"{"hits":{"hits":[]}}"#)).unwrap_err();
        assert!(matches!(err, AppError::Planning { .. }));
    }

    #[test]
    fn test_rendered_indicator() {
        let plan = planner()
            .plan(&document(
                r#"<html><body><div class="paginacao">1 / 7</div></body></html>"#,
            ))
            .unwrap();
        assert_eq!(plan.total_pages, 7);
        assert_eq!(plan.per_page, 10);
    }

    #[test]
    fn test_rendered_indicator_with_markup() {
        let plan = planner()
            .plan(&document(
                r#"<div class="paginacao">Página <b>2</b>/<b>12</b></div>"#,
            ))
            .unwrap();
        assert_eq!(plan.total_pages, 12);
    }

    #[test]
    fn test_rendered_unparsable_indicator() {
        let plan = planner()
            .plan(&document(r#"<div class="paginacao">page one of many</div>"#))
            .unwrap();
        assert_eq!(plan.total_pages, 1);
    }

    #[test]
    fn test_rendered_missing_indicator() {
        let plan = planner().plan(&document("<p>nothing here</p>")).unwrap();
        assert_eq!(plan.total_pages, 1);
        assert_eq!(plan.remaining().count(), 0);
    }
}
