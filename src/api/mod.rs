pub mod admrul;
pub mod client;
pub mod context;
pub mod deserializers;
pub mod elis;
pub mod expc;
pub mod http_client;
pub mod nlic;
pub mod prec;
pub mod response;
pub mod retry;
pub mod types;
pub mod unified;

pub use client::{ApiClientFactory, ClientConfig, LegalApiClient};
pub use context::RequestContext;
pub use unified::UnifiedClient;

use std::fmt;
use std::str::FromStr;

use crate::error::WarpError;

/// Base URL shared by every law.go.kr DRF endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.law.go.kr";
/// Search endpoint path
pub const SEARCH_PATH: &str = "/DRF/lawSearch.do";
/// Detail/history endpoint path
pub const SERVICE_PATH: &str = "/DRF/lawService.do";

/// API types supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiType {
    /// National Law Information Center (국가법령정보센터)
    Nlic,
    /// Local Regulations Information System (자치법규정보시스템)
    Elis,
    /// Precedent API (판례)
    Prec,
    /// Administrative Rule API (행정규칙)
    Admrul,
    /// Legal Interpretation API (법령해석례)
    Expc,
    /// Unified search across national laws and local ordinances
    All,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nlic => "nlic",
            Self::Elis => "elis",
            Self::Prec => "prec",
            Self::Admrul => "admrul",
            Self::Expc => "expc",
            Self::All => "all",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nlic => "국가법령정보센터",
            Self::Elis => "자치법규정보시스템",
            Self::Prec => "판례",
            Self::Admrul => "행정규칙",
            Self::Expc => "법령해석례",
            Self::All => "통합검색",
        }
    }

    /// Short label attached to merged search results
    pub fn source_label(&self) -> &'static str {
        match self {
            Self::Nlic => "법령",
            Self::Elis => "자치법규",
            Self::Prec => "판례",
            Self::Admrul => "행정규칙",
            Self::Expc => "해석례",
            Self::All => "통합",
        }
    }

    /// `target` discriminator sent to the DRF endpoints
    pub fn target(&self) -> &'static str {
        match self {
            Self::Nlic | Self::All => "law",
            Self::Elis => "ordin",
            Self::Prec => "prec",
            Self::Admrul => "admrul",
            Self::Expc => "expc",
        }
    }

    /// Configuration key holding the backend-specific API key
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Nlic => "law.nlic.key",
            Self::Elis => "law.elis.key",
            Self::Prec => "law.prec.key",
            Self::Admrul => "law.admrul.key",
            Self::Expc => "law.expc.key",
            Self::All => "law.key",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiType {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nlic" | "law" => Ok(Self::Nlic),
            "elis" | "ordinance" | "ordin" => Ok(Self::Elis),
            "prec" | "precedent" => Ok(Self::Prec),
            "admrul" | "administrative" | "admrule" => Ok(Self::Admrul),
            "expc" | "interpretation" => Ok(Self::Expc),
            "all" | "unified" => Ok(Self::All),
            other => Err(WarpError::InvalidInput(format!("Unknown API type: {}", other))),
        }
    }
}
