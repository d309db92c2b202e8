use serde::Deserialize;
use serde_json::json;

use warp::api::deserializers::{lenient_string, lenient_u32, single_or_vec, string_or_number};
use warp::api::response::{decode_body, unwrap_envelope, xml_to_value};
use warp::api::types::ResponseType;

#[derive(Debug, Deserialize, PartialEq)]
struct TestItem {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TestResponse {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total: Option<u32>,
    #[serde(default, deserialize_with = "single_or_vec")]
    items: Vec<TestItem>,
}

#[test]
fn test_parse_single_item_as_object() {
    let json = json!({
        "items": {
            "id": "LAW001",
            "name": "Test Law"
        }
    });

    let response: TestResponse = serde_json::from_value(json).expect("Failed to parse single item");
    assert_eq!(response.items.len(), 1);
    assert_eq!(response.items[0].id, "LAW001");
    assert_eq!(response.items[0].name, "Test Law");
}

#[test]
fn test_parse_multiple_items_as_array() {
    let json = json!({
        "totalCnt": "2",
        "items": [
            { "id": 1001, "name": "Test Law 1" },
            { "id": "1002", "name": "Test Law 2" }
        ]
    });

    let response: TestResponse = serde_json::from_value(json).expect("Failed to parse multiple items");
    assert_eq!(response.total, Some(2));
    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].id, "1001");
    assert_eq!(response.items[1].id, "1002");
}

#[test]
fn test_parse_missing_items() {
    let json = json!({ "totalCnt": "0" });

    let response: TestResponse = serde_json::from_value(json).expect("Failed to parse empty result");
    assert_eq!(response.total, Some(0));
    assert!(response.items.is_empty());
}

#[test]
fn test_wrapped_text_fields() {
    #[derive(Debug, Deserialize)]
    struct Article {
        #[serde(default, deserialize_with = "lenient_string")]
        title: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        body: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        note: Option<String>,
    }

    let article: Article = serde_json::from_value(json!({
        "title": { "content": "목적" },
        "body": ["① 첫째 항", "② 둘째 항"],
        "note": "   "
    }))
    .unwrap();

    assert_eq!(article.title.as_deref(), Some("목적"));
    assert_eq!(article.body.as_deref(), Some("① 첫째 항\n② 둘째 항"));
    assert_eq!(article.note, None);
}

// Simulate actual API response structures
#[derive(Debug, Deserialize)]
struct NlicLikeSearchData {
    #[serde(rename = "totalCnt", default, deserialize_with = "lenient_u32")]
    total: Option<u32>,
    #[serde(rename = "law", default, deserialize_with = "single_or_vec")]
    laws: Vec<TestItem>,
}

#[test]
fn test_nlic_style_single_result() {
    let json = json!({
        "LawSearch": {
            "law": {
                "id": "12345",
                "name": "민법"
            }
        }
    });

    let data: NlicLikeSearchData = unwrap_envelope(json, "LawSearch").expect("envelope");
    assert_eq!(data.laws.len(), 1);
    assert_eq!(data.laws[0].id, "12345");
}

#[test]
fn test_nlic_style_without_envelope() {
    let json = json!({
        "totalCnt": 2,
        "law": [
            { "id": "12345", "name": "민법" },
            { "id": "67890", "name": "형법" }
        ]
    });

    let data: NlicLikeSearchData = unwrap_envelope(json, "LawSearch").expect("direct payload");
    assert_eq!(data.total, Some(2));
    assert_eq!(data.laws[1].name, "형법");
}

#[test]
fn test_xml_search_matches_json_shape() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <LawSearch>
          <totalCnt>2</totalCnt>
          <law id="1"><id>12345</id><name>민법</name></law>
          <law id="2"><id>67890</id><name>형법 &amp; 시행령</name></law>
        </LawSearch>"#;

    let value = xml_to_value(xml).unwrap();
    let data: NlicLikeSearchData = unwrap_envelope(value, "LawSearch").expect("envelope");
    assert_eq!(data.total, Some(2));
    assert_eq!(data.laws[0].id, "12345");
    assert_eq!(data.laws[1].name, "형법 & 시행령");
}

#[test]
fn test_xml_single_result_is_one_item() {
    let xml = "<LawSearch><totalCnt>1</totalCnt><law><id>1</id><name>민법</name></law></LawSearch>";

    let data: NlicLikeSearchData = unwrap_envelope(xml_to_value(xml).unwrap(), "LawSearch").unwrap();
    assert_eq!(data.laws.len(), 1);
}

#[test]
fn test_malformed_xml_is_rejected() {
    assert!(xml_to_value("<LawSearch><law></LawSearch>").is_err());
    assert!(xml_to_value("").is_err());
}

#[test]
fn test_decode_body_falls_back_to_other_format() {
    // XML body sent with a JSON hint and no content type
    let value = decode_body("<PrecSearch><totalCnt>0</totalCnt></PrecSearch>", None, ResponseType::Json)
        .unwrap();
    assert_eq!(value, json!({ "PrecSearch": { "totalCnt": "0" } }));

    // JSON body mislabelled as XML
    let value = decode_body(r#"{"totalCnt": 0}"#, Some("text/xml"), ResponseType::Xml).unwrap();
    assert_eq!(value, json!({ "totalCnt": 0 }));

    assert!(decode_body("not a payload", None, ResponseType::Json).is_err());
}
