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

const SOURCE: &str = "ELIS";

/// ELIS (local ordinances, 자치법규) API client
pub struct ElisClient {
    transport: Transport,
}

impl ElisClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(ApiType::Elis, config)?,
        })
    }

    /// The ordinance service filters by issuing local government through `org`
    fn filters(request: &UnifiedSearchRequest) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(region) = &request.region {
            filters.push(("org", region.clone()));
        }
        if let Some(law_type) = &request.law_type {
            filters.push(("knd", law_type.clone()));
        }
        if let Some(range) = request.date_range() {
            filters.push(("ancYd", range));
        }
        filters
    }
}

fn parse_search(value: Value, request: &UnifiedSearchRequest) -> Result<SearchResponse> {
    let data: ElisSearchData = unwrap_envelope(value, "OrdinSearch")
        .ok_or_else(|| WarpError::Parse("Unexpected ELIS search response".to_string()))?;
    let items = data.ordinances.into_iter().map(ElisOrdinance::into_item).collect();
    Ok(page_response(SOURCE, request, data.total_count, items))
}

fn parse_detail(value: Value, id: &str) -> Result<LawDetail> {
    match unwrap_envelope::<ElisDetail>(value, "LawService") {
        Some(detail) if !detail.basic.ordinance_id.is_empty() => Ok(detail.into_law_detail()),
        _ => Err(WarpError::NotFound(format!("ordinance {}", id))),
    }
}

#[async_trait]
impl LegalApiClient for ElisClient {
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
        let request = request.normalized();
        let params = search_params(&request, Self::filters(&request));
        debug!("ELIS search '{}' page {}", request.query, request.page_no);

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
        ApiType::Elis
    }

    fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn is_configured(&self) -> bool {
        self.transport.is_configured()
    }
}

#[derive(Debug, Deserialize)]
struct ElisSearchData {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total_count: Option<u32>,
    #[serde(rename = "law", default, deserialize_with = "single_or_vec")]
    ordinances: Vec<ElisOrdinance>,
}

#[derive(Debug, Deserialize)]
struct ElisOrdinance {
    #[serde(rename = "자치법규ID", deserialize_with = "string_or_number")]
    ordinance_id: String,
    #[serde(rename = "자치법규명", default)]
    name: String,
    #[serde(rename = "자치법규일련번호", default, deserialize_with = "lenient_string")]
    serial_no: Option<String>,
    #[serde(rename = "자치법규종류", default, deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(rename = "지자체기관명", default, deserialize_with = "lenient_string")]
    local_government: Option<String>,
    #[serde(rename = "공포일자", default, deserialize_with = "lenient_string")]
    promulgation_date: Option<String>,
    #[serde(rename = "공포번호", default, deserialize_with = "lenient_string")]
    promulgation_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
    #[serde(rename = "제개정구분명", default, deserialize_with = "lenient_string")]
    revision_type: Option<String>,
    #[serde(rename = "자치법규분야명", default, deserialize_with = "lenient_string")]
    field: Option<String>,
    #[serde(rename = "자치법규상세링크", default, deserialize_with = "lenient_string")]
    detail_link: Option<String>,
}

impl ElisOrdinance {
    fn into_item(self) -> SearchItem {
        let mut metadata = HashMap::new();
        if let Some(region) = &self.local_government {
            metadata.insert("region".to_string(), region.clone());
        }
        for (key, value) in [
            ("revision_type", self.revision_type),
            ("field", self.field),
            ("detail_link", self.detail_link),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        SearchItem {
            id: self.ordinance_id,
            title: self.name,
            short_title: None,
            serial_no: self.serial_no,
            law_type: self.kind,
            department: self.local_government,
            promulgation_date: self.promulgation_date,
            promulgation_no: self.promulgation_no,
            enforcement_date: self.enforcement_date,
            source: None,
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ElisDetail {
    #[serde(rename = "자치법규기본정보")]
    basic: ElisBasicInfo,
    #[serde(rename = "조문", default)]
    articles: Option<ElisArticles>,
    #[serde(rename = "부칙", default)]
    addenda: Option<ElisAddenda>,
}

#[derive(Debug, Deserialize)]
struct ElisBasicInfo {
    #[serde(rename = "자치법규ID", default, deserialize_with = "string_or_number")]
    ordinance_id: String,
    #[serde(rename = "자치법규명", default)]
    name: String,
    #[serde(rename = "자치법규종류", default, deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(rename = "지자체기관명", default, deserialize_with = "lenient_string")]
    local_government: Option<String>,
    #[serde(rename = "담당부서명", default, deserialize_with = "lenient_string")]
    department: Option<String>,
    #[serde(rename = "공포일자", default, deserialize_with = "lenient_string")]
    promulgation_date: Option<String>,
    #[serde(rename = "공포번호", default, deserialize_with = "lenient_string")]
    promulgation_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElisArticles {
    #[serde(rename = "조", default, deserialize_with = "single_or_vec")]
    units: Vec<ElisArticle>,
}

#[derive(Debug, Deserialize)]
struct ElisArticle {
    #[serde(rename = "조문번호", default, deserialize_with = "lenient_string")]
    number: Option<String>,
    #[serde(rename = "조제목", default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(rename = "조내용", default, deserialize_with = "lenient_string")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElisAddenda {
    #[serde(rename = "부칙내용", default, deserialize_with = "lenient_string")]
    content: Option<String>,
}

impl ElisDetail {
    fn into_law_detail(self) -> LawDetail {
        let articles: Vec<Article> = self
            .articles
            .map(|a| a.units)
            .unwrap_or_default()
            .into_iter()
            .map(|a| Article {
                number: a.number.unwrap_or_default(),
                title: a.title,
                content: a.content.unwrap_or_default(),
                enforcement_date: None,
            })
            .collect();

        let mut sections: Vec<String> = articles
            .iter()
            .map(|a| match &a.title {
                Some(title) if !a.content.starts_with('제') => {
                    format!("제{}조({})\n{}", a.number, title, a.content)
                }
                _ => a.content.clone(),
            })
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(addenda) = self.addenda.and_then(|a| a.content) {
            sections.push(format!("부칙\n{}", addenda));
        }

        let basic = self.basic;
        let mut metadata = HashMap::new();
        if let Some(region) = &basic.local_government {
            metadata.insert("region".to_string(), region.clone());
        }

        LawDetail {
            info: SearchItem {
                id: basic.ordinance_id,
                title: basic.name,
                law_type: basic.kind,
                department: basic.department.or(basic.local_government),
                promulgation_date: basic.promulgation_date,
                promulgation_no: basic.promulgation_no,
                enforcement_date: basic.enforcement_date,
                metadata,
                ..Default::default()
            },
            content: sections.join("\n\n"),
            articles,
            attachments: Vec::new(),
            related_laws: Vec::new(),
        }
    }
}
