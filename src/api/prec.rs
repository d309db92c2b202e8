use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::client::{page_response, search_params, ClientConfig, Transport};
use super::context::RequestContext;
use super::deserializers::{lenient_string, lenient_u32, single_or_vec, string_or_number};
use super::response::unwrap_envelope;
use super::types::*;
use super::{ApiType, LegalApiClient, SEARCH_PATH, SERVICE_PATH};
use crate::error::{Result, WarpError};

const SOURCE: &str = "PREC";

/// Court precedent (판례) API client
pub struct PrecClient {
    transport: Transport,
}

impl PrecClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(ApiType::Prec, config)?,
        })
    }

    fn filters(request: &UnifiedSearchRequest) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(court) = &request.department {
            filters.push(("curt", court.clone()));
        }
        if let Some(range) = request.date_range() {
            filters.push(("prncYd", range));
        }
        filters
    }
}

fn parse_search(value: Value, request: &UnifiedSearchRequest) -> Result<SearchResponse> {
    let data: PrecSearchData = unwrap_envelope(value, "PrecSearch")
        .ok_or_else(|| WarpError::Parse("Unexpected PREC search response".to_string()))?;
    let items = data.precedents.into_iter().map(PrecSummary::into_item).collect();
    Ok(page_response(SOURCE, request, data.total_count, items))
}

fn parse_detail(value: Value, id: &str) -> Result<LawDetail> {
    match unwrap_envelope::<PrecDetail>(value, "PrecService") {
        Some(detail) if !detail.case_name.is_empty() || detail.id.is_some() => {
            Ok(detail.into_law_detail(id))
        }
        _ => Err(WarpError::NotFound(format!("precedent {}", id))),
    }
}

/// Reference lists are separated by `/` or line breaks
fn references(text: Option<String>, relation: &str) -> Vec<RelatedLaw> {
    text.map(|text| {
        text.split(['/', '\n'])
            .map(|part| part.trim().trim_end_matches(',').trim())
            .filter(|part| !part.is_empty())
            .map(|part| RelatedLaw {
                id: None,
                title: part.to_string(),
                relation_type: relation.to_string(),
            })
            .collect()
    })
    .unwrap_or_default()
}

fn plain(text: &str) -> String {
    text.replace("<br/>", "\n").replace("<br>", "\n")
}

#[async_trait]
impl LegalApiClient for PrecClient {
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
        let request = request.normalized();
        let params = search_params(&request, Self::filters(&request));
        debug!("PREC search '{}' page {}", request.query, request.page_no);

        let value = self
            .transport
            .fetch(ctx, SEARCH_PATH, request.response_type, &params)
            .await?;
        parse_search(value, &request)
    }

    async fn get_detail(&self, ctx: &RequestContext, id: &str) -> Result<LawDetail> {
        let params = [("ID", id.to_string())];
        let value = self
            .transport
            .fetch(ctx, SERVICE_PATH, ResponseType::Json, &params)
            .await?;
        parse_detail(value, id)
    }

    fn api_type(&self) -> ApiType {
        ApiType::Prec
    }

    fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn is_configured(&self) -> bool {
        self.transport.is_configured()
    }
}

#[derive(Debug, Deserialize)]
struct PrecSearchData {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total_count: Option<u32>,
    #[serde(rename = "prec", default, deserialize_with = "single_or_vec")]
    precedents: Vec<PrecSummary>,
}

#[derive(Debug, Deserialize)]
struct PrecSummary {
    #[serde(rename = "판례일련번호", deserialize_with = "string_or_number")]
    id: String,
    #[serde(rename = "사건명", default)]
    case_name: String,
    #[serde(rename = "사건번호", default, deserialize_with = "lenient_string")]
    case_no: Option<String>,
    #[serde(rename = "선고일자", default, deserialize_with = "lenient_string")]
    decision_date: Option<String>,
    #[serde(rename = "법원명", default, deserialize_with = "lenient_string")]
    court: Option<String>,
    #[serde(rename = "사건종류명", default, deserialize_with = "lenient_string")]
    case_type: Option<String>,
    #[serde(rename = "판결유형", default, deserialize_with = "lenient_string")]
    judgment_type: Option<String>,
    #[serde(rename = "판례상세링크", default, deserialize_with = "lenient_string")]
    detail_link: Option<String>,
}

impl PrecSummary {
    fn into_item(self) -> SearchItem {
        let mut metadata = HashMap::new();
        for (key, value) in [
            ("court", self.court.clone()),
            ("judgment_type", self.judgment_type),
            ("detail_link", self.detail_link),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        SearchItem {
            id: self.id,
            title: self.case_name,
            law_type: self.case_type,
            department: self.court,
            promulgation_date: self.decision_date,
            promulgation_no: self.case_no,
            metadata,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct PrecDetail {
    #[serde(rename = "판례정보일련번호", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "사건명", default)]
    case_name: String,
    #[serde(rename = "사건번호", default, deserialize_with = "lenient_string")]
    case_no: Option<String>,
    #[serde(rename = "선고일자", default, deserialize_with = "lenient_string")]
    decision_date: Option<String>,
    #[serde(rename = "법원명", default, deserialize_with = "lenient_string")]
    court: Option<String>,
    #[serde(rename = "사건종류명", default, deserialize_with = "lenient_string")]
    case_type: Option<String>,
    #[serde(rename = "판결유형", default, deserialize_with = "lenient_string")]
    judgment_type: Option<String>,
    #[serde(rename = "판시사항", default, deserialize_with = "lenient_string")]
    holdings: Option<String>,
    #[serde(rename = "판결요지", default, deserialize_with = "lenient_string")]
    summary: Option<String>,
    #[serde(rename = "참조조문", default, deserialize_with = "lenient_string")]
    referenced_articles: Option<String>,
    #[serde(rename = "참조판례", default, deserialize_with = "lenient_string")]
    referenced_cases: Option<String>,
    #[serde(rename = "판례내용", default, deserialize_with = "lenient_string")]
    full_text: Option<String>,
}

impl PrecDetail {
    fn into_law_detail(self, requested_id: &str) -> LawDetail {
        let sections: Vec<String> = [
            ("【판시사항】", &self.holdings),
            ("【판결요지】", &self.summary),
            ("【전문】", &self.full_text),
        ]
        .into_iter()
        .filter_map(|(heading, text)| text.as_deref().map(|t| format!("{}\n{}", heading, plain(t))))
        .collect();

        let mut related_laws = references(self.referenced_articles, "참조조문");
        related_laws.extend(references(self.referenced_cases, "참조판례"));

        let mut metadata = HashMap::new();
        if let Some(judgment_type) = self.judgment_type {
            metadata.insert("judgment_type".to_string(), judgment_type);
        }
        if let Some(court) = &self.court {
            metadata.insert("court".to_string(), court.clone());
        }

        LawDetail {
            info: SearchItem {
                id: self.id.unwrap_or_else(|| requested_id.to_string()),
                title: self.case_name,
                law_type: self.case_type,
                department: self.court,
                promulgation_date: self.decision_date,
                promulgation_no: self.case_no,
                metadata,
                ..Default::default()
            },
            content: sections.join("\n\n"),
            articles: Vec::new(),
            attachments: Vec::new(),
            related_laws,
        }
    }
}
