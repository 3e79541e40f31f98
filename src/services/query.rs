// src/services/query.rs

//! Search request construction for the structured backend.
//!
//! Field names, weights and aggregation names below are part of the wire
//! contract with the search backend. Decay parameters, page size and the
//! result window come from [`SearchConfig`].

use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::models::{SearchConfig, SearchCriteria};

/// Weighted fields for lexical matching.
pub const SEARCH_FIELDS: &[(&str, u32)] = &[
    ("titulo", 4),
    ("ementa_texto", 3),
    ("doutrina", 3),
    ("indexacao", 2),
    ("decisao_texto", 2),
    ("legislacao_citada_texto", 1),
    ("observacao_texto", 1),
    ("partes_lista_texto", 1),
];

/// Judgment date, used by the range filter and the recency decay.
pub const DATE_FIELD: &str = "julgamento_data";

/// Date format sent to the backend.
pub const DATE_FORMAT: &str = "yyyy-MM-dd";

/// Score multiplier for judgments of the full court.
pub const FULL_COURT_WEIGHT: f64 = 1.5;
pub const FULL_COURT_FIELD: &str = "orgao_julgador";
pub const FULL_COURT_VALUE: &str = "Tribunal Pleno";

/// Score multiplier for general-repercussion cases.
pub const REPERCUSSION_WEIGHT: f64 = 2.0;
pub const REPERCUSSION_FIELD: &str = "is_repercussao_geral";

/// Facet requests as `(aggregation name, field)`.
pub const AGGREGATIONS: &[(&str, &str)] = &[
    ("base_agg", "base"),
    ("orgao_julgador_agg", "orgao_julgador"),
    ("ministro_facet_agg", "relator_processo_nome"),
    ("is_repercussao_geral_agg", "is_repercussao_geral"),
];

const AGGREGATION_SIZE: u32 = 10;

/// Serialized query for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequestBody {
    value: Value,
    offset: usize,
    size: usize,
}

impl SearchRequestBody {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Compact JSON; identical inputs render identical bytes.
    pub fn to_json(&self) -> String {
        self.value.to_string()
    }

    /// Hex SHA-256 of [`SearchRequestBody::to_json`].
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_json().as_bytes()))
    }
}

/// What the builder produced for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Body(SearchRequestBody),
    /// The page starts at or past the result window; nothing more can be fetched
    WindowExhausted { offset: usize },
}

/// Builds search request bodies. Pure: no state besides settings.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    settings: SearchConfig,
}

impl QueryBuilder {
    pub fn new(settings: SearchConfig) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    pub fn page_size(&self) -> usize {
        self.settings.page_size
    }

    /// Build the body for a zero-based page.
    pub fn build(&self, criteria: &SearchCriteria, page: usize) -> QueryOutcome {
        let page_size = self.settings.page_size;
        let offset = page.saturating_mul(page_size);
        let size = page_size.min(self.settings.window_max.saturating_sub(offset));
        if size == 0 {
            return QueryOutcome::WindowExhausted { offset };
        }

        let value = json!({
            "query": {
                "function_score": {
                    "query": {
                        "bool": {
                            "must": [self.text_clause(criteria.text())],
                            "filter": date_filters(criteria.date_from(), criteria.date_to()),
                        }
                    },
                    "functions": self.score_functions(),
                    "score_mode": "multiply",
                    "boost_mode": "multiply",
                }
            },
            "aggs": aggregations(),
            "from": offset,
            "size": size,
            "track_total_hits": true,
            "_source": [
                "id",
                "titulo",
                DATE_FIELD,
                self.settings.text_field.as_str(),
            ],
        });

        QueryOutcome::Body(SearchRequestBody {
            value,
            offset,
            size,
        })
    }

    fn text_clause(&self, text: &str) -> Value {
        let fields: Vec<String> = SEARCH_FIELDS
            .iter()
            .map(|(field, weight)| format!("{field}^{weight}"))
            .collect();

        json!({
            "multi_match": {
                "query": text,
                "fields": fields,
                "type": "best_fields",
                "fuzziness": self.settings.fuzziness,
                "operator": "and",
            }
        })
    }

    fn score_functions(&self) -> Value {
        json!([
            {
                "exp": {
                    DATE_FIELD: {
                        "origin": self.settings.decay_origin,
                        "scale": self.settings.decay_half_life,
                        "offset": self.settings.decay_offset,
                        "decay": 0.5,
                    }
                }
            },
            {
                "filter": { "term": { FULL_COURT_FIELD: FULL_COURT_VALUE } },
                "weight": FULL_COURT_WEIGHT,
            },
            {
                "filter": { "term": { REPERCUSSION_FIELD: true } },
                "weight": REPERCUSSION_WEIGHT,
            },
        ])
    }
}

/// Range filter over the judgment date. Absent bounds are left open.
fn date_filters(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Value {
    let mut range = Map::new();
    if let Some(from) = from {
        range.insert("gte".into(), Value::String(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = to {
        range.insert("lte".into(), Value::String(to.format("%Y-%m-%d").to_string()));
    }
    if range.is_empty() {
        return json!([]);
    }
    range.insert("format".into(), Value::String(DATE_FORMAT.into()));

    json!([{ "range": { DATE_FIELD: range } }])
}

fn aggregations() -> Value {
    let aggs: Map<String, Value> = AGGREGATIONS
        .iter()
        .map(|(name, field)| {
            (
                (*name).to_string(),
                json!({ "terms": { "field": field, "size": AGGREGATION_SIZE } }),
            )
        })
        .collect();
    Value::Object(aggs)
}
