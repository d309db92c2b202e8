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

const SOURCE: &str = "EXPC";

/// Legal interpretation (법령해석례) API client.
///
/// The interpretation service only answers in XML. A search that asks for
/// JSON gets an empty page without a request being made.
pub struct ExpcClient {
    transport: Transport,
}

impl ExpcClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(ApiType::Expc, config)?,
        })
    }

    fn filters(request: &UnifiedSearchRequest) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(agency) = &request.department {
            filters.push(("inq", agency.clone()));
        }
        if let Some(range) = request.date_range() {
            filters.push(("rplYd", range));
        }
        filters
    }
}

fn parse_search(value: Value, request: &UnifiedSearchRequest) -> Result<SearchResponse> {
    let data: ExpcSearchData = unwrap_envelope(value, "Expc")
        .ok_or_else(|| WarpError::Parse("Unexpected EXPC search response".to_string()))?;
    let items = data.interpretations.into_iter().map(ExpcSummary::into_item).collect();
    Ok(page_response(SOURCE, request, data.total_count, items))
}

fn parse_detail(value: Value, id: &str) -> Result<LawDetail> {
    match unwrap_envelope::<ExpcDetail>(value, "ExpcService") {
        Some(detail) if !detail.title.is_empty() => Ok(detail.into_law_detail(id)),
        _ => Err(WarpError::NotFound(format!("interpretation {}", id))),
    }
}

#[async_trait]
impl LegalApiClient for ExpcClient {
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
        let request = request.normalized();
        if request.response_type == ResponseType::Json {
            debug!("EXPC has no JSON output; returning an empty page for '{}'", request.query);
            return Ok(SearchResponse::empty(request.page_no, request.page_size, SOURCE));
        }

        let params = search_params(&request, Self::filters(&request));
        debug!("EXPC search '{}' page {}", request.query, request.page_no);

        let value = self
            .transport
            .fetch(ctx, SEARCH_PATH, ResponseType::Xml, &params)
            .await?;
        parse_search(value, &request)
    }

    async fn get_detail(&self, ctx: &RequestContext, id: &str) -> Result<LawDetail> {
        let params = [("ID", id.to_string())];
        let value = self
            .transport
            .fetch(ctx, SERVICE_PATH, ResponseType::Xml, &params)
            .await?;
        parse_detail(value, id)
    }

    fn api_type(&self) -> ApiType {
        ApiType::Expc
    }

    fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn is_configured(&self) -> bool {
        self.transport.is_configured()
    }
}

#[derive(Debug, Deserialize)]
struct ExpcSearchData {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total_count: Option<u32>,
    #[serde(rename = "expc", default, deserialize_with = "single_or_vec")]
    interpretations: Vec<ExpcSummary>,
}

#[derive(Debug, Deserialize)]
struct ExpcSummary {
    #[serde(rename = "법령해석례일련번호", deserialize_with = "string_or_number")]
    id: String,
    #[serde(rename = "안건명", default)]
    title: String,
    #[serde(rename = "안건번호", default, deserialize_with = "lenient_string")]
    case_no: Option<String>,
    #[serde(rename = "질의기관명", default, deserialize_with = "lenient_string")]
    inquiring_agency: Option<String>,
    #[serde(rename = "회신기관명", default, deserialize_with = "lenient_string")]
    replying_agency: Option<String>,
    #[serde(rename = "회신일자", default, deserialize_with = "lenient_string")]
    reply_date: Option<String>,
    #[serde(rename = "법령해석례상세링크", default, deserialize_with = "lenient_string")]
    detail_link: Option<String>,
}

impl ExpcSummary {
    fn into_item(self) -> SearchItem {
        let mut metadata = HashMap::new();
        for (key, value) in [
            ("inquiring_agency", self.inquiring_agency.clone()),
            ("detail_link", self.detail_link),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        SearchItem {
            id: self.id,
            title: self.title,
            law_type: Some("법령해석례".to_string()),
            department: self.replying_agency.or(self.inquiring_agency),
            promulgation_date: self.reply_date,
            promulgation_no: self.case_no,
            metadata,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExpcDetail {
    #[serde(rename = "법령해석례일련번호", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "안건명", default)]
    title: String,
    #[serde(rename = "안건번호", default, deserialize_with = "lenient_string")]
    case_no: Option<String>,
    #[serde(rename = "해석일자", default, deserialize_with = "lenient_string")]
    interpretation_date: Option<String>,
    #[serde(rename = "해석기관명", default, deserialize_with = "lenient_string")]
    interpreting_agency: Option<String>,
    #[serde(rename = "질의기관명", default, deserialize_with = "lenient_string")]
    inquiring_agency: Option<String>,
    #[serde(rename = "질의요지", default, deserialize_with = "lenient_string")]
    question: Option<String>,
    #[serde(rename = "회답", default, deserialize_with = "lenient_string")]
    answer: Option<String>,
    #[serde(rename = "이유", default, deserialize_with = "lenient_string")]
    reasoning: Option<String>,
}

impl ExpcDetail {
    fn into_law_detail(self, requested_id: &str) -> LawDetail {
        let content = [
            ("질의요지", &self.question),
            ("회답", &self.answer),
            ("이유", &self.reasoning),
        ]
        .into_iter()
        .filter_map(|(heading, text)| text.as_deref().map(|t| format!("【{}】\n{}", heading, t)))
        .collect::<Vec<_>>()
        .join("\n\n");

        let mut metadata = HashMap::new();
        if let Some(agency) = self.inquiring_agency {
            metadata.insert("inquiring_agency".to_string(), agency);
        }

        LawDetail {
            info: SearchItem {
                id: self.id.unwrap_or_else(|| requested_id.to_string()),
                title: self.title,
                law_type: Some("법령해석례".to_string()),
                department: self.interpreting_agency,
                promulgation_date: self.interpretation_date,
                promulgation_no: self.case_no,
                metadata,
                ..Default::default()
            },
            content,
            articles: Vec::new(),
            attachments: Vec::new(),
            related_laws: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::xml_to_value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_search_xml() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <Expc>
              <target>expc</target>
              <키워드>건축</키워드>
              <totalCnt>1</totalCnt>
              <page>1</page>
              <expc id="1">
                <법령해석례일련번호>313107</법령해석례일련번호>
                <안건명><![CDATA[「건축법」 제11조 관련]]></안건명>
                <안건번호>21-0345</안건번호>
                <질의기관명>국토교통부</질의기관명>
                <회신기관명>법제처</회신기관명>
                <회신일자>2021.08.10</회신일자>
              </expc>
            </Expc>"#;

        let request = UnifiedSearchRequest {
            response_type: ResponseType::Xml,
            ..UnifiedSearchRequest::new("건축")
        }
        .normalized();
        let response = parse_search(xml_to_value(xml).unwrap(), &request).unwrap();

        assert_eq!(response.total_count, 1);
        let item = &response.items[0];
        assert_eq!(item.id, "313107");
        assert_eq!(item.title, "「건축법」 제11조 관련");
        assert_eq!(item.department.as_deref(), Some("법제처"));
        assert_eq!(
            item.metadata.get("inquiring_agency").map(String::as_str),
            Some("국토교통부")
        );
    }

    #[test]
    fn test_parse_detail_xml() {
        let xml = r#"<ExpcService>
              <법령해석례일련번호>313107</법령해석례일련번호>
              <안건명>「건축법」 제11조 관련</안건명>
              <해석기관명>법제처</해석기관명>
              <질의요지>건축허가 대상인지?</질의요지>
              <회답>대상에 해당합니다.</회답>
              <이유></이유>
            </ExpcService>"#;

        let detail = parse_detail(xml_to_value(xml).unwrap(), "313107").unwrap();
        assert_eq!(detail.info.department.as_deref(), Some("법제처"));
        assert_eq!(
            detail.content,
            "【질의요지】\n건축허가 대상인지?\n\n【회답】\n대상에 해당합니다."
        );
    }

    #[tokio::test]
    async fn test_json_search_short_circuits() {
        // Unroutable base URL: any request would fail
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ClientConfig::with_key("k")
        };
        let client = ExpcClient::new(config).unwrap();

        let mut request = UnifiedSearchRequest::new("건축");
        request.page_no = 0;
        let response = client
            .search(&RequestContext::new(), request)
            .await
            .unwrap();

        assert_eq!(response, SearchResponse::empty(1, DEFAULT_PAGE_SIZE, "EXPC"));
    }
}
