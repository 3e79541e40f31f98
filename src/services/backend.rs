// src/services/backend.rs

//! Search backends: how a page is requested and how its reply is decoded.

use crate::error::Result;
use crate::models::{LegacyConfig, RawResponse, RenderedDocument, SearchConfig, SearchCriteria, SearchHits};
use crate::services::query::{QueryBuilder, QueryOutcome, SearchRequestBody};
use crate::utils::markup::UrlShield;
use crate::utils::with_query;

/// Date format of the legacy search syntax.
const LEGACY_DATE_FORMAT: &str = "%Y%m%d";

/// One page to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Zero-based page index
    pub page: usize,
    pub url: String,
    /// Present for the structured backend, which expects a POSTed query
    pub body: Option<SearchRequestBody>,
}

/// What a backend produced for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageQuery {
    Fetch(PageRequest),
    /// The result window ends before this page
    WindowExhausted { page: usize, offset: usize },
}

/// The two supported search backends.
#[derive(Debug, Clone)]
pub enum Backend {
    /// JSON search API queried with a POSTed body
    Structured { builder: QueryBuilder, endpoint: String },
    /// Listing pages addressed by a one-based page parameter
    Rendered { legacy: LegacyConfig, shield: UrlShield },
}

impl Backend {
    pub fn structured(config: &SearchConfig) -> Self {
        Self::Structured {
            builder: QueryBuilder::new(config.clone()),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn rendered(config: &LegacyConfig) -> Result<Self> {
        Ok(Self::Rendered {
            legacy: config.clone(),
            shield: UrlShield::new()?,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Structured { .. } => "structured",
            Self::Rendered { .. } => "rendered",
        }
    }

    /// Request for a zero-based page.
    pub fn request(&self, criteria: &SearchCriteria, page: usize) -> Result<PageQuery> {
        match self {
            Self::Structured { builder, endpoint } => Ok(match builder.build(criteria, page) {
                QueryOutcome::Body(body) => PageQuery::Fetch(PageRequest {
                    page,
                    url: endpoint.clone(),
                    body: Some(body),
                }),
                QueryOutcome::WindowExhausted { offset } => {
                    PageQuery::WindowExhausted { page, offset }
                }
            }),
            Self::Rendered { legacy, .. } => {
                let expression = legacy_expression(criteria);
                let page_number = (page + 1).to_string();
                let url = with_query(
                    &legacy.base_url,
                    &[
                        ("base", legacy.base.as_str()),
                        ("s1", expression.as_str()),
                        (legacy.page_param.as_str(), page_number.as_str()),
                    ],
                )?;
                Ok(PageQuery::Fetch(PageRequest {
                    page,
                    url,
                    body: None,
                }))
            }
        }
    }

    /// Decode a reply body into the variant this backend produces.
    pub fn decode(&self, text: &str) -> Result<RawResponse> {
        match self {
            Self::Structured { .. } => Ok(RawResponse::StructuredHits(SearchHits::from_json(text)?)),
            Self::Rendered { shield, .. } => Ok(RawResponse::RenderedDocument(
                RenderedDocument::new(shield.encode(text)),
            )),
        }
    }
}

/// Criteria in the legacy search syntax, e.g.
/// `habeas corpus E @JULG>=20200101 E @JULG<=20201231`.
fn legacy_expression(criteria: &SearchCriteria) -> String {
    let mut clauses = vec![criteria.text().to_string()];
    if let Some(from) = criteria.date_from() {
        clauses.push(format!("@JULG>={}", from.format(LEGACY_DATE_FORMAT)));
    }
    if let Some(to) = criteria.date_to() {
        clauses.push(format!("@JULG<={}", to.format(LEGACY_DATE_FORMAT)));
    }
    clauses.join(" E ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> SearchCriteria {
        SearchCriteria::parse("habeas corpus", "2020-01-01", "2020-12-31").unwrap()
    }

    #[test]
    fn test_structured_request() {
        let backend = Backend::structured(&SearchConfig::default());
        let PageQuery::Fetch(request) = backend.request(&criteria(), 1).unwrap() else {
            panic!("expected a request");
        };
        assert_eq!(request.page, 1);
        assert_eq!(request.url, SearchConfig::default().endpoint);
        assert_eq!(request.body.map(|b| b.offset()), Some(150));
    }

    #[test]
    fn test_structured_window() {
        let backend = Backend::structured(&SearchConfig::default());
        assert_eq!(
            backend.request(&criteria(), 70).unwrap(),
            PageQuery::WindowExhausted {
                page: 70,
                offset: 10_500
            }
        );
    }

    #[test]
    fn test_rendered_request_is_one_based() {
        let backend = Backend::rendered(&LegacyConfig::default()).unwrap();
        let PageQuery::Fetch(request) = backend.request(&criteria(), 0).unwrap() else {
            panic!("expected a request");
        };
        assert!(request.body.is_none());
        assert!(request.url.ends_with("&pagina=1"));
        assert!(request.url.contains("base=baseAcordaos"));
        assert!(
            request
                .url
                .contains("s1=habeas+corpus+E+%40JULG%3E%3D20200101+E+%40JULG%3C%3D20201231")
        );
    }

    #[test]
    fn test_legacy_expression_open_ended() {
        let criteria = SearchCriteria::parse("mandado", "", "2019-06-30").unwrap();
        assert_eq!(legacy_expression(&criteria), "mandado E @JULG<=20190630");
    }

    #[test]
    fn test_decode() {
        let structured = Backend::structured(&SearchConfig::default());
        assert!(matches!(
            structured.decode(r#"{"hits":{"total":0,"hits":[]}}"#).unwrap(),
            RawResponse::StructuredHits(_)
        ));
        assert!(structured.decode("<html>").is_err());

        let rendered = Backend::rendered(&LegacyConfig::default()).unwrap();
        let RawResponse::RenderedDocument(document) = rendered.decode("<pre><http://a.b/c></pre>").unwrap()
        else {
            panic!("expected a document");
        };
        assert!(document.markup().contains("<%68%74%74%70"));
    }
}
