use async_trait::async_trait;
use futures::future::join;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::sync::Arc;

use super::client::{ApiClientFactory, ClientConfig};
use super::context::RequestContext;
use super::elis::ElisClient;
use super::nlic::NlicClient;
use super::types::*;
use super::{ApiType, LegalApiClient};
use crate::config::Config;
use crate::error::{Result, WarpError};

/// Source label of a merged response
pub const UNIFIED_SOURCE: &str = "UNIFIED";

/// Searches national laws and local ordinances together.
///
/// Both backends receive the same request; their pages are merged, re-sorted
/// by promulgation date and sliced again to the requested page.
pub struct UnifiedClient {
    national: Arc<dyn LegalApiClient>,
    local: Arc<dyn LegalApiClient>,
}

impl UnifiedClient {
    pub fn new(national: Arc<dyn LegalApiClient>, local: Arc<dyn LegalApiClient>) -> Self {
        Self { national, local }
    }

    /// Build the national (NLIC) and local (ELIS) clients
    pub fn from_configs(national: ClientConfig, local: ClientConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(NlicClient::new(national)?),
            Arc::new(ElisClient::new(local)?),
        ))
    }

    /// Resolve both keys from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_configs(
            ApiClientFactory::client_config(ApiType::Nlic, config)?,
            ApiClientFactory::client_config(ApiType::Elis, config)?,
        )
    }

    /// Search only the selected sources. A single source is searched as is,
    /// without merging or re-pagination.
    pub async fn search_with_options(
        &self,
        ctx: &RequestContext,
        request: UnifiedSearchRequest,
        include_national: bool,
        include_local: bool,
    ) -> Result<SearchResponse> {
        match (include_national, include_local) {
            (false, false) => Err(WarpError::NoSourceSelected),
            (true, false) => self.national.search(ctx, request).await,
            (false, true) => self.local.search(ctx, request).await,
            (true, true) => self.search(ctx, request).await,
        }
    }
}

fn newest_first(a: &SearchItem, b: &SearchItem) -> Ordering {
    match (&a.promulgation_date, &b.promulgation_date) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Merge backend pages into one page of `page_size` items.
///
/// Items are tagged with their backend's label and stable-sorted newest
/// first; items without a promulgation date go last. The total is the
/// saturating sum of the backend totals.
pub fn merge_results(
    responses: Vec<(ApiType, SearchResponse)>,
    page_no: u32,
    page_size: u32,
) -> SearchResponse {
    let mut total_count = 0u32;
    let mut items = Vec::new();
    for (api_type, response) in responses {
        total_count = total_count.saturating_add(response.total_count);
        items.extend(response.items.into_iter().map(|mut item| {
            item.source = Some(api_type.source_label().to_string());
            item
        }));
    }

    items.sort_by(newest_first);

    let page_no = page_no.max(1);
    let page_size = page_size.max(1);
    let start = (page_no as usize - 1).saturating_mul(page_size as usize);
    let items = if start >= items.len() {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size as usize).min(items.len());
        items.drain(start..end).collect()
    };

    SearchResponse {
        total_count,
        page_no,
        page_size,
        items,
        source: UNIFIED_SOURCE.to_string(),
    }
}

#[async_trait]
impl LegalApiClient for UnifiedClient {
    async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
        let request = request.normalized();
        let (page_no, page_size) = (request.page_no, request.page_size);

        let (national, local) = join(
            self.national.search(ctx, request.clone()),
            self.local.search(ctx, request),
        )
        .await;

        // A finished context fails the whole search, even if one side already had results
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let responses = match (national, local) {
            (Err(e), _) if e.is_cancellation() => return Err(e),
            (_, Err(e)) if e.is_cancellation() => return Err(e),
            (Ok(national), Ok(local)) => vec![
                (self.national.api_type(), national),
                (self.local.api_type(), local),
            ],
            (Ok(national), Err(e)) => {
                warn!("{} search failed, showing national results only: {}", self.local.api_type(), e);
                vec![(self.national.api_type(), national)]
            }
            (Err(e), Ok(local)) => {
                warn!("{} search failed, showing local results only: {}", self.national.api_type(), e);
                vec![(self.local.api_type(), local)]
            }
            (Err(national), Err(local)) => {
                return Err(WarpError::AllSourcesFailed {
                    national: Box::new(national),
                    local: Box::new(local),
                });
            }
        };

        let merged = merge_results(responses, page_no, page_size);
        debug!(
            "Merged {} items of {} total for page {}",
            merged.items.len(),
            merged.total_count,
            page_no
        );
        Ok(merged)
    }

    /// No backend tells whether an ID is national or local, so the national
    /// lookup is tried first and any failure falls through to the local one.
    async fn get_detail(&self, ctx: &RequestContext, id: &str) -> Result<LawDetail> {
        match self.national.get_detail(ctx, id).await {
            Ok(detail) => return Ok(detail),
            Err(e) if e.is_cancellation() => return Err(e),
            Err(e) => info!("National lookup of {} failed, trying local: {}", id, e),
        }

        match self.local.get_detail(ctx, id).await {
            Ok(detail) => Ok(detail),
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                debug!("Local lookup of {} failed: {}", id, e);
                Err(WarpError::NotFound(format!(
                    "no national law or local ordinance for id {}",
                    id
                )))
            }
        }
    }

    async fn get_history(&self, ctx: &RequestContext, id: &str) -> Result<LawHistory> {
        self.national.get_history(ctx, id).await
    }

    fn api_type(&self) -> ApiType {
        ApiType::All
    }

    fn base_url(&self) -> &str {
        self.national.base_url()
    }

    fn is_configured(&self) -> bool {
        self.national.is_configured() && self.local.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // Mock backend returning a fixed outcome
    struct MockClient {
        api_type: ApiType,
        dates: Vec<Option<&'static str>>,
        total: u32,
        should_fail: bool,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl MockClient {
        fn new(api_type: ApiType, dates: Vec<Option<&'static str>>) -> Self {
            Self {
                api_type,
                total: dates.len() as u32,
                dates,
                should_fail: false,
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(api_type: ApiType) -> Self {
            Self {
                should_fail: true,
                ..Self::new(api_type, vec![])
            }
        }
    }

    #[async_trait]
    impl LegalApiClient for MockClient {
        async fn search(&self, ctx: &RequestContext, request: UnifiedSearchRequest) -> Result<SearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.sleep(self.delay).await?;

            if self.should_fail {
                return Err(WarpError::ServerError(format!("{} unavailable", self.api_type)));
            }
            let items = self
                .dates
                .iter()
                .enumerate()
                .map(|(i, date)| SearchItem {
                    id: format!("{}-{}", self.api_type, i),
                    title: format!("{} {}", request.query, i),
                    promulgation_date: date.map(str::to_string),
                    ..Default::default()
                })
                .collect();
            Ok(SearchResponse {
                total_count: self.total,
                page_no: request.page_no,
                page_size: request.page_size,
                items,
                source: self.api_type.as_str().to_uppercase(),
            })
        }

        async fn get_detail(&self, _ctx: &RequestContext, id: &str) -> Result<LawDetail> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(WarpError::NotFound(id.to_string()));
            }
            Ok(LawDetail {
                info: SearchItem {
                    id: id.to_string(),
                    title: self.api_type.display_name().to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
        }

        fn api_type(&self) -> ApiType {
            self.api_type
        }

        fn base_url(&self) -> &str {
            "http://mock"
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn unified(national: MockClient, local: MockClient) -> UnifiedClient {
        UnifiedClient::new(Arc::new(national), Arc::new(local))
    }

    fn dates(response: &SearchResponse) -> Vec<Option<&str>> {
        response
            .items
            .iter()
            .map(|i| i.promulgation_date.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn test_merge_sorts_newest_first() {
        let client = unified(
            MockClient::new(ApiType::Nlic, vec![Some("20200101"), Some("20230101")]),
            MockClient::new(ApiType::Elis, vec![Some("20220101")]),
        );

        let response = client
            .search(&RequestContext::new(), UnifiedSearchRequest::new("법"))
            .await
            .unwrap();

        assert_eq!(response.total_count, 3);
        assert_eq!(
            dates(&response),
            vec![Some("20230101"), Some("20220101"), Some("20200101")]
        );
        let sources: Vec<_> = response.items.iter().map(|i| i.source.as_deref()).collect();
        assert_eq!(sources, vec![Some("법령"), Some("자치법규"), Some("법령")]);
        assert_eq!(response.source, UNIFIED_SOURCE);
    }

    #[tokio::test]
    async fn test_missing_dates_sort_last() {
        let client = unified(
            MockClient::new(ApiType::Nlic, vec![None, Some("20100101")]),
            MockClient::new(ApiType::Elis, vec![Some("20240101"), None]),
        );

        let response = client
            .search(&RequestContext::new(), UnifiedSearchRequest::new("법"))
            .await
            .unwrap();

        assert_eq!(
            dates(&response),
            vec![Some("20240101"), Some("20100101"), None, None]
        );
        // stable: national's undated item stays ahead of local's
        assert_eq!(response.items[2].id, "nlic-0");
        assert_eq!(response.items[3].id, "elis-1");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_surviving_results() {
        let client = unified(
            MockClient::failing(ApiType::Nlic),
            MockClient::new(ApiType::Elis, vec![Some("20220101")]),
        );

        let response = client
            .search(&RequestContext::new(), UnifiedSearchRequest::new("법"))
            .await
            .unwrap();

        assert_eq!(response.total_count, 1);
        assert_eq!(response.items[0].source.as_deref(), Some("자치법규"));
    }

    #[tokio::test]
    async fn test_double_failure_names_both_sources() {
        let client = unified(MockClient::failing(ApiType::Nlic), MockClient::failing(ApiType::Elis));

        match client
            .search(&RequestContext::new(), UnifiedSearchRequest::new("법"))
            .await
        {
            Err(WarpError::AllSourcesFailed { national, local }) => {
                assert!(national.to_string().contains("nlic"));
                assert!(local.to_string().contains("elis"));
            }
            other => panic!("expected AllSourcesFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let client = unified(
            MockClient::new(ApiType::Nlic, vec![Some("20200101"), Some("20230101")]),
            MockClient::new(ApiType::Elis, vec![Some("20220101")]),
        );

        let mut request = UnifiedSearchRequest::new("법");
        request.page_no = 100;
        request.page_size = 10;
        let response = client.search(&RequestContext::new(), request).await.unwrap();

        assert!(response.items.is_empty());
        assert_eq!(response.total_count, 3);
        assert_eq!(response.page_no, 100);
    }

    #[test]
    fn test_merge_slices_pages() {
        let page = |dates: Vec<&str>| SearchResponse {
            total_count: 500,
            page_no: 1,
            page_size: 2,
            items: dates
                .into_iter()
                .map(|d| SearchItem {
                    promulgation_date: Some(d.to_string()),
                    ..Default::default()
                })
                .collect(),
            source: String::new(),
        };

        let merged = merge_results(
            vec![
                (ApiType::Nlic, page(vec!["20210101", "20190101"])),
                (ApiType::Elis, page(vec!["20200101", "20180101"])),
            ],
            2,
            2,
        );
        assert_eq!(dates(&merged), vec![Some("20190101"), Some("20180101")]);
        assert_eq!(merged.total_count, 1000);

        let saturated = merge_results(
            vec![
                (ApiType::Nlic, SearchResponse { total_count: u32::MAX, ..page(vec![]) }),
                (ApiType::Elis, page(vec![])),
            ],
            1,
            2,
        );
        assert_eq!(saturated.total_count, u32::MAX);
    }

    #[tokio::test]
    async fn test_search_with_options() {
        let client = unified(
            MockClient::new(ApiType::Nlic, vec![Some("20200101")]),
            MockClient::new(ApiType::Elis, vec![Some("20220101")]),
        );
        let ctx = RequestContext::new();
        let request = UnifiedSearchRequest::new("법");

        assert!(matches!(
            client.search_with_options(&ctx, request.clone(), false, false).await,
            Err(WarpError::NoSourceSelected)
        ));

        let local_only = client
            .search_with_options(&ctx, request.clone(), false, true)
            .await
            .unwrap();
        assert_eq!(local_only.source, "ELIS");
        assert_eq!(local_only.items[0].source, None);

        let both = client.search_with_options(&ctx, request, true, true).await.unwrap();
        assert_eq!(both.items.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backends_run_concurrently() {
        let mut national = MockClient::new(ApiType::Nlic, vec![Some("20200101")]);
        national.delay = Duration::from_secs(2);
        let mut local = MockClient::new(ApiType::Elis, vec![Some("20220101")]);
        local.delay = Duration::from_secs(2);
        let client = unified(national, local);

        let started = tokio::time::Instant::now();
        client
            .search(&RequestContext::new(), UnifiedSearchRequest::new("법"))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_detail_falls_back_to_local() {
        let national = MockClient::failing(ApiType::Nlic);
        let local = MockClient::new(ApiType::Elis, vec![]);
        let local_calls = local.calls.clone();
        let client = unified(national, local);

        let detail = client.get_detail(&RequestContext::new(), "42").await.unwrap();
        assert_eq!(detail.info.title, ApiType::Elis.display_name());
        assert_eq!(local_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detail_prefers_national() {
        let national = MockClient::new(ApiType::Nlic, vec![]);
        let local = MockClient::new(ApiType::Elis, vec![]);
        let local_calls = local.calls.clone();
        let client = unified(national, local);

        let detail = client.get_detail(&RequestContext::new(), "42").await.unwrap();
        assert_eq!(detail.info.title, ApiType::Nlic.display_name());
        assert_eq!(local_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detail_not_found_anywhere() {
        let client = unified(MockClient::failing(ApiType::Nlic), MockClient::failing(ApiType::Elis));
        match client.get_detail(&RequestContext::new(), "42").await {
            Err(WarpError::NotFound(message)) => assert!(message.ends_with("for id 42")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_goes_to_national() {
        let client = unified(
            MockClient::new(ApiType::Nlic, vec![]),
            MockClient::new(ApiType::Elis, vec![]),
        );
        // the mock keeps the default history behaviour
        match client.get_history(&RequestContext::new(), "1").await {
            Err(WarpError::NotSupported(what)) => {
                assert!(what.contains(ApiType::Nlic.display_name()))
            }
            other => panic!("expected NotSupported, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_search_is_a_cancellation() {
        let mut national = MockClient::new(ApiType::Nlic, vec![]);
        national.delay = Duration::from_secs(60);
        let mut local = MockClient::new(ApiType::Elis, vec![]);
        local.delay = Duration::from_secs(60);
        let client = unified(national, local);

        let ctx = RequestContext::new();
        ctx.cancel();
        let err = client
            .search(&ctx, UnifiedSearchRequest::new("법"))
            .await
            .unwrap_err();
        assert!(matches!(err, WarpError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_search_drops_partial_results() {
        let national = MockClient::new(ApiType::Nlic, vec![Some("20240101")]);
        let mut local = MockClient::new(ApiType::Elis, vec![Some("20230101")]);
        local.delay = Duration::from_secs(60);
        let client = unified(national, local);

        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = client
            .search(&ctx, UnifiedSearchRequest::new("법"))
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_search() {
        let mut national = MockClient::new(ApiType::Nlic, vec![Some("20240101")]);
        national.delay = Duration::from_secs(30);
        let local = MockClient::failing(ApiType::Elis);
        let client = unified(national, local);

        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        let err = client
            .search(&ctx, UnifiedSearchRequest::new("법"))
            .await
            .unwrap_err();
        assert!(matches!(err, WarpError::DeadlineExceeded));
    }
}
