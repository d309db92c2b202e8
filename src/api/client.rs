use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::context::RequestContext;
use super::http_client::{client_for, default_user_agent};
use super::response::decode_response;
use super::retry::{fetch_with_retry, RetryPolicy};
use super::types::*;
use super::{ApiType, DEFAULT_BASE_URL};
use crate::config::Config;
use crate::error::{Result, WarpError};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for legal API clients
#[async_trait]
pub trait LegalApiClient: Send + Sync {
    /// Search for laws/documents
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse>;

    /// Get detailed information about a specific document
    async fn get_detail(&self, ctx: &RequestContext, id: &str) -> Result<LawDetail>;

    /// Get revision history; only national laws have one
    async fn get_history(&self, _ctx: &RequestContext, _id: &str) -> Result<LawHistory> {
        Err(WarpError::NotSupported(format!(
            "Revision history for {}",
            self.api_type().display_name()
        )))
    }

    /// Get the API type
    fn api_type(&self) -> ApiType;

    /// Get the base URL for this API
    fn base_url(&self) -> &str;

    /// Check if the client is configured properly
    fn is_configured(&self) -> bool;
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API key (the `OC` parameter)
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Maximum number of attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff (milliseconds)
    pub retry_base_delay: u64,
    /// User agent string
    pub user_agent: String,
    /// Scheme and host of the DRF endpoints
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: 3,
            retry_base_delay: 500,
            user_agent: default_user_agent(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay),
        }
    }
}

/// HTTP plumbing shared by the backend clients: URL building, the retry loop
/// and body decoding.
pub(crate) struct Transport {
    api_type: ApiType,
    config: ClientConfig,
    http: Client,
}

impl Transport {
    pub(crate) fn new(api_type: ApiType, config: ClientConfig) -> Result<Self> {
        let http = client_for(&config)?;
        Ok(Self {
            api_type,
            config,
            http,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn url(
        &self,
        path: &str,
        target: &str,
        format: ResponseType,
        params: &[(&str, String)],
    ) -> Result<Url> {
        let endpoint = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut all: Vec<(&str, &str)> = vec![
            ("OC", self.config.api_key.as_str()),
            ("target", target),
            ("type", format.as_param()),
        ];
        all.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        Url::parse_with_params(&endpoint, &all).map_err(|e| WarpError::Parse(e.to_string()))
    }

    /// GET `path` with `params` and decode the body into a JSON value
    pub(crate) async fn fetch(
        &self,
        ctx: &RequestContext,
        path: &str,
        format: ResponseType,
        params: &[(&str, String)],
    ) -> Result<Value> {
        self.fetch_target(ctx, path, self.api_type.target(), format, params)
            .await
    }

    /// Same as [`Transport::fetch`] against a different `target` of the same service
    pub(crate) async fn fetch_target(
        &self,
        ctx: &RequestContext,
        path: &str,
        target: &str,
        format: ResponseType,
        params: &[(&str, String)],
    ) -> Result<Value> {
        if !self.is_configured() {
            return Err(WarpError::NoApiKey {
                key: self.api_type.config_key().to_string(),
            });
        }
        let url = self.url(path, target, format, params)?;
        let raw = fetch_with_retry(&self.http, &url, ctx, &self.config.retry_policy()).await?;
        debug!(
            "{} responded with {} ({} bytes)",
            self.api_type,
            raw.status,
            raw.body.len()
        );
        decode_response(&raw, format)
    }
}

/// Query, paging, sort and extra parameters common to every search endpoint.
/// Backend-specific filters go between the common ones and the extras.
pub(crate) fn search_params<'a>(
    request: &'a UnifiedSearchRequest,
    filters: Vec<(&'a str, String)>,
) -> Vec<(&'a str, String)> {
    let mut params = vec![
        ("query", request.query.clone()),
        ("page", request.page_no.to_string()),
        ("display", request.page_size.to_string()),
    ];
    if let Some(sort) = request.sort.and_then(|s| s.as_param()) {
        params.push(("sort", sort.to_string()));
    }
    params.extend(filters);

    let mut extras: Vec<_> = request.extras.iter().collect();
    extras.sort();
    params.extend(extras.into_iter().map(|(k, v)| (k.as_str(), v.clone())));
    params
}

/// Page of results echoing the requested paging; never longer than the page size
pub(crate) fn page_response(
    source: &str,
    request: &UnifiedSearchRequest,
    total_count: Option<u32>,
    mut items: Vec<SearchItem>,
) -> SearchResponse {
    items.truncate(request.page_size as usize);
    SearchResponse {
        total_count: total_count.unwrap_or(items.len() as u32),
        page_no: request.page_no,
        page_size: request.page_size,
        items,
        source: source.to_string(),
    }
}

/// Factory for creating API clients
pub struct ApiClientFactory;

impl ApiClientFactory {
    /// Create a new API client based on the API type
    pub fn create(api_type: ApiType, config: ClientConfig) -> Result<Box<dyn LegalApiClient>> {
        Ok(match api_type {
            ApiType::Nlic => Box::new(super::nlic::NlicClient::new(config)?),
            ApiType::Elis => Box::new(super::elis::ElisClient::new(config)?),
            ApiType::Prec => Box::new(super::prec::PrecClient::new(config)?),
            ApiType::Admrul => Box::new(super::admrul::AdmrulClient::new(config)?),
            ApiType::Expc => Box::new(super::expc::ExpcClient::new(config)?),
            ApiType::All => Box::new(super::unified::UnifiedClient::from_configs(config.clone(), config)?),
        })
    }

    /// Create a client from the application configuration, resolving its key
    pub fn from_config(api_type: ApiType, config: &Config) -> Result<Box<dyn LegalApiClient>> {
        match api_type {
            ApiType::All => Ok(Box::new(super::unified::UnifiedClient::from_config(config)?)),
            _ => Self::create(api_type, Self::client_config(api_type, config)?),
        }
    }

    /// Client configuration for one backend, failing when no key is configured
    pub fn client_config(api_type: ApiType, config: &Config) -> Result<ClientConfig> {
        config
            .client_config(api_type)
            .ok_or_else(|| WarpError::NoApiKey {
                key: api_type.config_key().to_string(),
            })
    }
}
