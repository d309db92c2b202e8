use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default page number when the caller leaves it unset
pub const DEFAULT_PAGE_NO: u32 = 1;
/// Default page size when the caller leaves it unset
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Unified search request for all API types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSearchRequest {
    /// Search query
    pub query: String,
    /// Page number (1-based)
    pub page_no: u32,
    /// Results per page
    pub page_size: u32,
    /// Response type (JSON/XML)
    pub response_type: ResponseType,
    /// Region filter (for ELIS)
    pub region: Option<String>,
    /// Law type filter
    pub law_type: Option<String>,
    /// Department filter
    pub department: Option<String>,
    /// Date range start (YYYYMMDD)
    pub date_from: Option<String>,
    /// Date range end (YYYYMMDD)
    pub date_to: Option<String>,
    /// Sort order
    pub sort: Option<SortOrder>,
    /// API-specific extra parameters
    pub extras: HashMap<String, String>,
}

impl Default for UnifiedSearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            page_no: DEFAULT_PAGE_NO,
            page_size: DEFAULT_PAGE_SIZE,
            response_type: ResponseType::Json,
            region: None,
            law_type: None,
            department: None,
            date_from: None,
            date_to: None,
            sort: None,
            extras: HashMap::new(),
        }
    }
}

impl UnifiedSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Replace zero page number/size with the defaults
    pub fn normalized(mut self) -> Self {
        if self.page_no == 0 {
            self.page_no = DEFAULT_PAGE_NO;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self
    }

    /// Date range formatted as `from~to`, when either end is set
    pub fn date_range(&self) -> Option<String> {
        match (&self.date_from, &self.date_to) {
            (None, None) => None,
            (from, to) => Some(format!(
                "{}~{}",
                from.as_deref().unwrap_or("19000101"),
                to.as_deref().unwrap_or("99991231")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    #[default]
    Json,
    Xml,
}

impl ResponseType {
    /// Value of the `type` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Relevance (default)
    Relevance,
    /// Date ascending
    DateAsc,
    /// Date descending
    DateDesc,
    /// Title ascending
    TitleAsc,
    /// Title descending
    TitleDesc,
}

impl SortOrder {
    /// Value of the `sort` query parameter, `None` for relevance
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            Self::Relevance => None,
            Self::DateAsc => Some("dasc"),
            Self::DateDesc => Some("ddes"),
            Self::TitleAsc => Some("lasc"),
            Self::TitleDesc => Some("ldes"),
        }
    }
}

/// Unified search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total number of results reported by the server
    pub total_count: u32,
    /// Current page number
    pub page_no: u32,
    /// Results per page
    pub page_size: u32,
    /// List of search results
    pub items: Vec<SearchItem>,
    /// Source API
    pub source: String,
}

impl SearchResponse {
    pub fn empty(page_no: u32, page_size: u32, source: impl Into<String>) -> Self {
        Self {
            total_count: 0,
            page_no,
            page_size,
            items: Vec::new(),
            source: source.into(),
        }
    }
}

/// Individual search result item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Unique identifier
    pub id: String,
    /// Law/document title
    pub title: String,
    /// Abbreviated title
    pub short_title: Option<String>,
    /// Serial number (일련번호)
    pub serial_no: Option<String>,
    /// Type of law/document
    pub law_type: Option<String>,
    /// Department, court or local government
    pub department: Option<String>,
    /// Promulgation date (YYYYMMDD)
    pub promulgation_date: Option<String>,
    /// Promulgation number
    pub promulgation_no: Option<String>,
    /// Enforcement date (YYYYMMDD)
    pub enforcement_date: Option<String>,
    /// Backend label, set only for merged results
    pub source: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

/// Law detail information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LawDetail {
    /// Summary fields
    pub info: SearchItem,
    /// Full content
    pub content: String,
    /// Articles
    pub articles: Vec<Article>,
    /// Attachments
    pub attachments: Vec<Attachment>,
    /// Related laws
    pub related_laws: Vec<RelatedLaw>,
}

/// Law article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Article number
    pub number: String,
    /// Article title
    pub title: Option<String>,
    /// Article content
    pub content: String,
    /// Enforcement date of this article
    pub enforcement_date: Option<String>,
}

/// Attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment title
    pub name: String,
    /// Attachment kind (별표, 서식...)
    pub file_type: Option<String>,
    /// Download URL
    pub url: Option<String>,
}

/// Related law
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedLaw {
    /// Law ID
    pub id: Option<String>,
    /// Law title
    pub title: String,
    /// Relationship type
    pub relation_type: String,
}

/// Law history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LawHistory {
    /// Law ID
    pub law_id: String,
    /// Law title
    pub law_name: String,
    /// History entries, in server order
    pub entries: Vec<HistoryEntry>,
}

/// History entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Promulgation date
    pub promulgation_date: String,
    /// Revision type (제정, 일부개정...)
    pub revision_type: String,
    /// Revision reason
    pub reason: Option<String>,
    /// Promulgation number
    pub promulgation_no: Option<String>,
    /// Enforcement date
    pub enforcement_date: Option<String>,
}
