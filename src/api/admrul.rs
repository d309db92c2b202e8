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

const SOURCE: &str = "ADMRUL";

/// Administrative rule (행정규칙) API client
pub struct AdmrulClient {
    transport: Transport,
}

impl AdmrulClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(ApiType::Admrul, config)?,
        })
    }

    fn filters(request: &UnifiedSearchRequest) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(kind) = &request.law_type {
            filters.push(("knd", kind.clone()));
        }
        if let Some(department) = &request.department {
            filters.push(("org", department.clone()));
        }
        if let Some(range) = request.date_range() {
            filters.push(("prmlYd", range));
        }
        filters
    }
}

fn parse_search(value: Value, request: &UnifiedSearchRequest) -> Result<SearchResponse> {
    let data: AdmrulSearchData = unwrap_envelope(value, "AdmRulSearch")
        .ok_or_else(|| WarpError::Parse("Unexpected ADMRUL search response".to_string()))?;
    let items = data.rules.into_iter().map(AdmrulSummary::into_item).collect();
    Ok(page_response(SOURCE, request, data.total_count, items))
}

fn parse_detail(value: Value, id: &str) -> Result<LawDetail> {
    match unwrap_envelope::<AdmrulDetail>(value, "AdmRulService") {
        Some(detail) if !detail.basic.name.is_empty() => Ok(detail.into_law_detail(id)),
        _ => Err(WarpError::NotFound(format!("administrative rule {}", id))),
    }
}

#[async_trait]
impl LegalApiClient for AdmrulClient {
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
        let request = request.normalized();
        let params = search_params(&request, Self::filters(&request));
        debug!("ADMRUL search '{}' page {}", request.query, request.page_no);

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
        ApiType::Admrul
    }

    fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn is_configured(&self) -> bool {
        self.transport.is_configured()
    }
}

#[derive(Debug, Deserialize)]
struct AdmrulSearchData {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total_count: Option<u32>,
    #[serde(rename = "admrul", default, deserialize_with = "single_or_vec")]
    rules: Vec<AdmrulSummary>,
}

#[derive(Debug, Deserialize)]
struct AdmrulSummary {
    #[serde(rename = "행정규칙일련번호", deserialize_with = "string_or_number")]
    serial: String,
    #[serde(rename = "행정규칙ID", default, deserialize_with = "lenient_string")]
    rule_id: Option<String>,
    #[serde(rename = "행정규칙명", default)]
    name: String,
    #[serde(rename = "행정규칙종류", default, deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(rename = "소관부처명", default, deserialize_with = "lenient_string")]
    department: Option<String>,
    #[serde(rename = "발령일자", default, deserialize_with = "lenient_string")]
    issued_date: Option<String>,
    #[serde(rename = "발령번호", default, deserialize_with = "lenient_string")]
    issued_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
    #[serde(rename = "제개정구분명", default, deserialize_with = "lenient_string")]
    revision_type: Option<String>,
    #[serde(rename = "행정규칙상세링크", default, deserialize_with = "lenient_string")]
    detail_link: Option<String>,
}

impl AdmrulSummary {
    fn into_item(self) -> SearchItem {
        let mut metadata = HashMap::new();
        for (key, value) in [
            ("revision_type", self.revision_type),
            ("detail_link", self.detail_link),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        SearchItem {
            id: self.serial,
            title: self.name,
            short_title: None,
            serial_no: self.rule_id,
            law_type: self.kind,
            department: self.department,
            promulgation_date: self.issued_date,
            promulgation_no: self.issued_no,
            enforcement_date: self.enforcement_date,
            source: None,
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdmrulDetail {
    #[serde(rename = "행정규칙기본정보")]
    basic: AdmrulBasicInfo,
    #[serde(rename = "조문내용", default, deserialize_with = "single_or_vec")]
    articles: Vec<String>,
    #[serde(rename = "부칙", default)]
    addenda: Option<AdmrulAddenda>,
    #[serde(rename = "별표", default)]
    appendices: Option<AdmrulAppendices>,
}

#[derive(Debug, Deserialize)]
struct AdmrulBasicInfo {
    #[serde(rename = "행정규칙일련번호", default, deserialize_with = "lenient_string")]
    serial: Option<String>,
    #[serde(rename = "행정규칙명", default)]
    name: String,
    #[serde(rename = "행정규칙종류", default, deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(rename = "소관부처명", default, deserialize_with = "lenient_string")]
    department: Option<String>,
    #[serde(rename = "발령일자", default, deserialize_with = "lenient_string")]
    issued_date: Option<String>,
    #[serde(rename = "발령번호", default, deserialize_with = "lenient_string")]
    issued_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdmrulAddenda {
    #[serde(rename = "부칙내용", default, deserialize_with = "lenient_string")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdmrulAppendices {
    #[serde(rename = "별표단위", default, deserialize_with = "single_or_vec")]
    units: Vec<AdmrulAppendix>,
}

#[derive(Debug, Deserialize)]
struct AdmrulAppendix {
    #[serde(rename = "별표제목", default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(rename = "별표서식파일링크", default, deserialize_with = "lenient_string")]
    link: Option<String>,
}

/// Article text leads with its marker, e.g. `제3조(적용범위) ...`
fn article_from_text(text: String) -> Article {
    let marker_end = text.find(|c: char| c == '(' || c.is_whitespace());
    let (number, title) = match marker_end {
        Some(end) if text.starts_with('제') => {
            let number = text[..end].to_string();
            let title = text[end..]
                .strip_prefix('(')
                .and_then(|rest| rest.split_once(')'))
                .map(|(title, _)| title.to_string());
            (number, title)
        }
        _ => (String::new(), None),
    };
    Article {
        number,
        title,
        content: text,
        enforcement_date: None,
    }
}

impl AdmrulDetail {
    fn into_law_detail(self, requested_id: &str) -> LawDetail {
        let mut sections: Vec<String> = self.articles.iter().map(|a| a.trim().to_string()).collect();
        if let Some(addenda) = self.addenda.and_then(|a| a.content) {
            sections.push(format!("부칙\n{}", addenda));
        }

        let articles = self
            .articles
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| article_from_text(a.trim().to_string()))
            .collect();

        let attachments = self
            .appendices
            .map(|a| a.units)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| {
                Some(Attachment {
                    name: a.title?,
                    file_type: Some("별표".to_string()),
                    url: a.link,
                })
            })
            .collect();

        let basic = self.basic;
        LawDetail {
            info: SearchItem {
                id: basic.serial.unwrap_or_else(|| requested_id.to_string()),
                title: basic.name,
                law_type: basic.kind,
                department: basic.department,
                promulgation_date: basic.issued_date,
                promulgation_no: basic.issued_no,
                enforcement_date: basic.enforcement_date,
                ..Default::default()
            },
            content: sections
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
            articles,
            attachments,
            related_laws: Vec::new(),
        }
    }
}
