//! Turning raw response bodies into typed payloads.
//!
//! The DRF endpoints answer in JSON or XML, and on credential problems they
//! answer with an HTML page and status 200. XML is converted into the same
//! `serde_json::Value` shape the JSON endpoints produce (root element name as
//! the envelope key), so each backend declares its payload structs once.

use log::debug;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::retry::{snippet, RawResponse};
use super::types::ResponseType;
use crate::error::{Result, WarpError};

const API_KEY_KEYWORDS: &[&str] = &["인증", "api key", "apikey", "auth", "key", "키", "oc 값", "사용자 정보"];
const RATE_LIMIT_KEYWORDS: &[&str] = &["rate limit", "too many", "요청 한도", "요청횟수", "트래픽 초과"];
const MAINTENANCE_KEYWORDS: &[&str] = &["maintenance", "점검", "서비스 중단"];

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Whether `body` is an HTML document rather than an API payload
pub fn is_html_page(body: &str) -> bool {
    let trimmed = body.trim_start();
    trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html")
}

/// Visible text of an HTML page (title first), whitespace collapsed
pub fn html_text(body: &str) -> String {
    let title = TITLE_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let without_scripts = SCRIPT_RE.replace_all(body, " ");
    let text = TAG_RE.replace_all(&without_scripts, " ");
    let text = snippet(&text, 500);
    if title.is_empty() || text.starts_with(&title) {
        text
    } else {
        format!("{} {}", title, text)
    }
}

/// Map an HTML error page to the error it most likely reports
pub fn classify_html_error(body: &str) -> WarpError {
    let text = html_text(body);
    let lowered = text.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if matches(API_KEY_KEYWORDS) {
        WarpError::InvalidApiKey(if text.is_empty() {
            "API returned an authentication error page".to_string()
        } else {
            text
        })
    } else if matches(RATE_LIMIT_KEYWORDS) {
        WarpError::RateLimit
    } else if matches(MAINTENANCE_KEYWORDS) {
        WarpError::Maintenance(text)
    } else {
        WarpError::api_error(
            "HTML_RESPONSE",
            format!("API returned an HTML page instead of data: {}", snippet(&text, 200)),
            Some("The service may be unavailable or the request parameters are invalid.".to_string()),
        )
    }
}

/// Convert an XML document into a JSON value.
///
/// Elements holding only text become strings, elements with children become
/// objects, and repeated child names collect into arrays. Attributes are
/// ignored. The root element name is kept as the single top-level key.
pub fn xml_to_value(xml: &str) -> Result<Value> {
    struct Frame {
        name: String,
        children: Map<String, Value>,
        text: String,
    }

    fn insert(map: &mut Map<String, Value>, name: String, value: Value) {
        match map.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }

    fn finish(frame: Frame) -> Value {
        if frame.children.is_empty() {
            Value::String(frame.text.trim().to_string())
        } else {
            Value::Object(frame.children)
        }
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = Map::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Frame {
                name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                children: Map::new(),
                text: String::new(),
            }),
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                match stack.last_mut() {
                    Some(parent) => insert(&mut parent.children, name, Value::String(String::new())),
                    None => insert(&mut root, name, Value::String(String::new())),
                }
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| WarpError::Parse("unbalanced XML end tag".to_string()))?;
                let name = frame.name.clone();
                let value = finish(frame);
                match stack.last_mut() {
                    Some(parent) => insert(&mut parent.children, name, value),
                    None => insert(&mut root, name, value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(WarpError::Parse("unexpected end of XML document".to_string()));
    }
    if root.is_empty() {
        return Err(WarpError::Parse("XML document has no root element".to_string()));
    }
    Ok(Value::Object(root))
}

/// Decode a payload, trying the likely encoding first and the other one second
pub fn decode_body(body: &str, content_type: Option<&str>, hint: ResponseType) -> Result<Value> {
    let xml_first = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"))
        || (hint == ResponseType::Xml && body.trim_start().starts_with('<'));

    let parse = |as_xml: bool| -> Result<Value> {
        if as_xml {
            xml_to_value(body)
        } else {
            Ok(serde_json::from_str(body)?)
        }
    };

    match parse(xml_first) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            parse(!xml_first).map_err(|second_err| {
                debug!("JSON/XML decoding failed: {} / {}", first_err, second_err);
                WarpError::Parse(format!(
                    "Response is neither valid JSON nor XML ({}). Response starts with: {}",
                    first_err,
                    snippet(body, 100)
                ))
            })
        }
    }
}

/// Check a successful response for HTML/empty bodies, then decode it
pub fn decode_response(raw: &RawResponse, hint: ResponseType) -> Result<Value> {
    if is_html_page(&raw.body) {
        return Err(classify_html_error(&raw.body));
    }
    if raw.body.trim().is_empty() {
        return Err(WarpError::api_error(
            "EMPTY_RESPONSE",
            "API returned an empty response.",
            Some("This might indicate an invalid API key or server issue. Try again later.".to_string()),
        ));
    }
    decode_body(&raw.body, raw.content_type.as_deref(), hint)
}

/// Decode `T` from under `envelope`, or from the value itself when the
/// envelope key is missing. `None` when neither shape fits.
pub fn unwrap_envelope<T: DeserializeOwned>(value: Value, envelope: &str) -> Option<T> {
    let value = match value {
        Value::Object(mut map) => match map.remove(envelope) {
            Some(inner) if !inner.is_null() => match serde_json::from_value(inner) {
                Ok(parsed) => return Some(parsed),
                Err(e) => {
                    debug!("Envelope '{}' present but undecodable: {}", envelope, e);
                    return None;
                }
            },
            _ => Value::Object(map),
        },
        other => other,
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Direct decoding without '{}' envelope failed: {}", envelope, e);
            None
        }
    }
}
