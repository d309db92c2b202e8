use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::client::{page_response, search_params, ClientConfig, Transport};
use super::context::RequestContext;
use super::deserializers::{lenient_string, lenient_u32, single_or_vec, string_or_number};
use super::response::unwrap_envelope;
use super::types::*;
use super::{ApiType, LegalApiClient, SEARCH_PATH, SERVICE_PATH};
use crate::error::{Result, WarpError};

const SOURCE: &str = "NLIC";
const HISTORY_TARGET: &str = "lsHstry";

/// NLIC (National Law Information Center) API client
pub struct NlicClient {
    transport: Transport,
}

impl NlicClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(ApiType::Nlic, config)?,
        })
    }

    fn filters(request: &UnifiedSearchRequest) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(law_type) = &request.law_type {
            filters.push(("knd", law_type.clone()));
        }
        if let Some(department) = &request.department {
            filters.push(("org", department.clone()));
        }
        if let Some(range) = request.date_range() {
            filters.push(("ancYd", range));
        }
        filters
    }
}

fn parse_search(value: Value, request: &UnifiedSearchRequest) -> Result<SearchResponse> {
    let data: NlicSearchData = unwrap_envelope(value, "LawSearch")
        .ok_or_else(|| WarpError::Parse("Unexpected NLIC search response".to_string()))?;
    let items = data.laws.into_iter().map(NlicLaw::into_item).collect();
    Ok(page_response(SOURCE, request, data.total_count, items))
}

fn parse_detail(value: Value, id: &str) -> Result<LawDetail> {
    match unwrap_envelope::<NlicDetail>(value, "법령") {
        Some(detail) if !detail.basic.law_id.is_empty() => Ok(detail.into_law_detail()),
        _ => Err(WarpError::NotFound(format!("law {}", id))),
    }
}

fn parse_history(value: Value, id: &str) -> Result<LawHistory> {
    match unwrap_envelope::<NlicHistory>(value, "LsHstry") {
        Some(history) if !history.law_id.is_empty() || !history.entries.is_empty() => {
            Ok(history.into_law_history(id))
        }
        _ => Err(WarpError::NotFound(format!("history of law {}", id))),
    }
}

#[async_trait]
impl LegalApiClient for NlicClient {
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
        let request = request.normalized();
        let params = search_params(&request, Self::filters(&request));
        debug!("NLIC search '{}' page {}", request.query, request.page_no);

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

    async fn get_history(&self, ctx: &RequestContext, id: &str) -> Result<LawHistory> {
        let params = [("ID", id.to_string())];
        let value = self
            .transport
            .fetch_target(ctx, SERVICE_PATH, HISTORY_TARGET, ResponseType::Json, &params)
            .await?;
        parse_history(value, id)
    }

    fn api_type(&self) -> ApiType {
        ApiType::Nlic
    }

    fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn is_configured(&self) -> bool {
        self.transport.is_configured()
    }
}

// The DRF payload is `{ "LawSearch": { "totalCnt": "..", "law": [...] } }`
#[derive(Debug, Deserialize)]
struct NlicSearchData {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total_count: Option<u32>,
    #[serde(rename = "law", default, deserialize_with = "single_or_vec")]
    laws: Vec<NlicLaw>,
}

#[derive(Debug, Deserialize)]
struct NlicLaw {
    #[serde(rename = "법령ID", deserialize_with = "string_or_number")]
    law_id: String,
    #[serde(rename = "법령명한글", default)]
    law_name: String,
    #[serde(rename = "법령약칭명", default, deserialize_with = "lenient_string")]
    short_name: Option<String>,
    #[serde(rename = "법령일련번호", default, deserialize_with = "lenient_string")]
    serial_no: Option<String>,
    #[serde(rename = "법령구분명", default, deserialize_with = "lenient_string")]
    law_type: Option<String>,
    #[serde(rename = "소관부처명", default, deserialize_with = "lenient_string")]
    department: Option<String>,
    #[serde(rename = "공포일자", default, deserialize_with = "lenient_string")]
    promulgation_date: Option<String>,
    #[serde(rename = "공포번호", default, deserialize_with = "lenient_string")]
    promulgation_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
    #[serde(rename = "제개정구분명", default, deserialize_with = "lenient_string")]
    revision_type: Option<String>,
    #[serde(rename = "현행연혁코드", default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(rename = "법령상세링크", default, deserialize_with = "lenient_string")]
    detail_link: Option<String>,
}

impl NlicLaw {
    fn into_item(self) -> SearchItem {
        let mut metadata = std::collections::HashMap::new();
        for (key, value) in [
            ("revision_type", self.revision_type),
            ("status", self.status),
            ("detail_link", self.detail_link),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        SearchItem {
            id: self.law_id,
            title: self.law_name,
            short_title: self.short_name,
            serial_no: self.serial_no,
            law_type: self.law_type,
            department: self.department,
            promulgation_date: self.promulgation_date,
            promulgation_no: self.promulgation_no,
            enforcement_date: self.enforcement_date,
            source: None,
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NlicDetail {
    #[serde(rename = "기본정보")]
    basic: NlicBasicInfo,
    #[serde(rename = "조문", default)]
    articles: Option<NlicArticles>,
    #[serde(rename = "별표", default)]
    appendices: Option<NlicAppendices>,
}

#[derive(Debug, Deserialize)]
struct NlicBasicInfo {
    #[serde(rename = "법령ID", default, deserialize_with = "string_or_number")]
    law_id: String,
    #[serde(rename = "법령명_한글", default)]
    law_name: String,
    #[serde(rename = "법령명약칭", default, deserialize_with = "lenient_string")]
    short_name: Option<String>,
    #[serde(rename = "법종구분", default, deserialize_with = "lenient_string")]
    law_type: Option<String>,
    #[serde(rename = "소관부처", default, deserialize_with = "lenient_string")]
    department: Option<String>,
    #[serde(rename = "공포일자", default, deserialize_with = "lenient_string")]
    promulgation_date: Option<String>,
    #[serde(rename = "공포번호", default, deserialize_with = "lenient_string")]
    promulgation_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NlicArticles {
    #[serde(rename = "조문단위", default, deserialize_with = "single_or_vec")]
    units: Vec<NlicArticle>,
}

#[derive(Debug, Deserialize)]
struct NlicArticle {
    #[serde(rename = "조문번호", default, deserialize_with = "lenient_string")]
    number: Option<String>,
    #[serde(rename = "조문제목", default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(rename = "조문내용", default, deserialize_with = "lenient_string")]
    content: Option<String>,
    #[serde(rename = "조문시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NlicAppendices {
    #[serde(rename = "별표단위", default, deserialize_with = "single_or_vec")]
    units: Vec<NlicAppendix>,
}

#[derive(Debug, Deserialize)]
struct NlicAppendix {
    #[serde(rename = "별표제목", default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(rename = "별표구분", default, deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(rename = "별표서식파일링크", default, deserialize_with = "lenient_string")]
    link: Option<String>,
}

impl NlicDetail {
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
                enforcement_date: a.enforcement_date,
            })
            .collect();

        let attachments = self
            .appendices
            .map(|a| a.units)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| {
                Some(Attachment {
                    name: a.title?,
                    file_type: a.kind,
                    url: a.link,
                })
            })
            .collect();

        let content = articles
            .iter()
            .map(|a| a.content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let basic = self.basic;
        LawDetail {
            info: SearchItem {
                id: basic.law_id,
                title: basic.law_name,
                short_title: basic.short_name,
                law_type: basic.law_type,
                department: basic.department,
                promulgation_date: basic.promulgation_date,
                promulgation_no: basic.promulgation_no,
                enforcement_date: basic.enforcement_date,
                ..Default::default()
            },
            content,
            articles,
            attachments,
            related_laws: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NlicHistory {
    #[serde(rename = "법령ID", default, deserialize_with = "string_or_number")]
    law_id: String,
    #[serde(rename = "법령명한글", default)]
    law_name: String,
    #[serde(rename = "연혁", default, deserialize_with = "single_or_vec")]
    entries: Vec<NlicHistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct NlicHistoryEntry {
    #[serde(rename = "공포일자", default, deserialize_with = "lenient_string")]
    promulgation_date: Option<String>,
    #[serde(rename = "제개정구분명", default, deserialize_with = "lenient_string")]
    revision_type: Option<String>,
    #[serde(rename = "개정이유", default, deserialize_with = "lenient_string")]
    reason: Option<String>,
    #[serde(rename = "공포번호", default, deserialize_with = "lenient_string")]
    promulgation_no: Option<String>,
    #[serde(rename = "시행일자", default, deserialize_with = "lenient_string")]
    enforcement_date: Option<String>,
}

impl NlicHistory {
    fn into_law_history(self, id: &str) -> LawHistory {
        LawHistory {
            law_id: if self.law_id.is_empty() {
                id.to_string()
            } else {
                self.law_id
            },
            law_name: self.law_name,
            entries: self
                .entries
                .into_iter()
                .map(|e| HistoryEntry {
                    promulgation_date: e.promulgation_date.unwrap_or_default(),
                    revision_type: e.revision_type.unwrap_or_default(),
                    reason: e.reason,
                    promulgation_no: e.promulgation_no,
                    enforcement_date: e.enforcement_date,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::xml_to_value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request() -> UnifiedSearchRequest {
        UnifiedSearchRequest::new("민법").normalized()
    }

    #[test]
    fn test_parse_search_single_item() {
        let value = json!({
            "LawSearch": {
                "totalCnt": "1",
                "page": "1",
                "law": {
                    "법령ID": "001706",
                    "법령명한글": "민법",
                    "법령구분명": "법률",
                    "소관부처명": "법무부",
                    "공포일자": "20230808",
                    "공포번호": 19592,
                    "제개정구분명": "일부개정"
                }
            }
        });

        let response = parse_search(value, &request()).unwrap();
        assert_eq!(response.total_count, 1);
        assert_eq!(response.source, "NLIC");
        assert_eq!(response.items.len(), 1);

        let item = &response.items[0];
        assert_eq!(item.id, "001706");
        assert_eq!(item.promulgation_no.as_deref(), Some("19592"));
        assert_eq!(item.metadata.get("revision_type").map(String::as_str), Some("일부개정"));
        assert_eq!(item.source, None);
    }

    #[test]
    fn test_parse_search_xml_matches_json() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <LawSearch>
              <totalCnt>2</totalCnt>
              <law id="1"><법령ID>001706</법령ID><법령명한글><![CDATA[민법]]></법령명한글><공포일자>20230808</공포일자></law>
              <law id="2"><법령ID>001707</법령ID><법령명한글>민법 시행령</법령명한글><공포일자></공포일자></law>
            </LawSearch>"#;

        let response = parse_search(xml_to_value(xml).unwrap(), &request()).unwrap();
        assert_eq!(response.total_count, 2);
        assert_eq!(response.items[0].title, "민법");
        assert_eq!(response.items[1].id, "001707");
        assert_eq!(response.items[1].promulgation_date, None);
    }

    #[test]
    fn test_parse_search_without_results() {
        let value = json!({"LawSearch": {"totalCnt": "0", "page": "1"}});
        let response = parse_search(value, &request()).unwrap();
        assert_eq!(response.total_count, 0);
        assert!(response.items.is_empty());
        assert_eq!(response.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_parse_detail() {
        let value = json!({
            "법령": {
                "기본정보": {
                    "법령ID": "001706",
                    "법령명_한글": "민법",
                    "법종구분": {"content": "법률", "법종구분코드": "A0002"},
                    "소관부처": {"content": "법무부", "소관부처코드": "1270000"},
                    "공포일자": "20230808"
                },
                "조문": {
                    "조문단위": [
                        {"조문번호": "1", "조문제목": "법원", "조문내용": "제1조(법원) 민사에 관하여..."},
                        {"조문번호": "2", "조문내용": ["제2조(신의성실)", "① 권리의 행사와..."]}
                    ]
                },
                "별표": {"별표단위": {"별표제목": "서식 1", "별표구분": "서식"}}
            }
        });

        let detail = parse_detail(value, "001706").unwrap();
        assert_eq!(detail.info.title, "민법");
        assert_eq!(detail.info.law_type.as_deref(), Some("법률"));
        assert_eq!(detail.info.department.as_deref(), Some("법무부"));
        assert_eq!(detail.articles.len(), 2);
        assert_eq!(detail.articles[1].content, "제2조(신의성실)\n① 권리의 행사와...");
        assert_eq!(detail.attachments[0].name, "서식 1");
        assert!(detail.content.starts_with("제1조(법원)"));
    }

    #[test]
    fn test_parse_detail_missing_is_not_found() {
        let value = json!({"Law": "일치하는 법령이 없습니다."});
        match parse_detail(value, "999") {
            Err(WarpError::NotFound(what)) => assert!(what.contains("999")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_history_keeps_server_order() {
        let value = json!({
            "LsHstry": {
                "법령ID": "001706",
                "법령명한글": "민법",
                "연혁": [
                    {"공포일자": "20230808", "제개정구분명": "일부개정"},
                    {"공포일자": "19580222", "제개정구분명": "제정"}
                ]
            }
        });

        let history = parse_history(value, "001706").unwrap();
        assert_eq!(history.law_name, "민법");
        let dates: Vec<&str> = history.entries.iter().map(|e| e.promulgation_date.as_str()).collect();
        assert_eq!(dates, vec!["20230808", "19580222"]);
    }

    #[test]
    fn test_filters_use_national_parameters() {
        let mut request = request();
        request.law_type = Some("법률".to_string());
        request.region = Some("서울".to_string());
        request.date_from = Some("20200101".to_string());

        let filters = NlicClient::filters(&request);
        assert_eq!(
            filters,
            vec![
                ("knd", "법률".to_string()),
                ("ancYd", "20200101~99991231".to_string()),
            ]
        );
    }
}
