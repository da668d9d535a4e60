//! End-to-end tests for the pagination engine and the combined search,
//! driven by a scripted transport instead of the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use litsearch::cache::RequestCache;
use litsearch::models::SearchRequest;
use litsearch::providers::mock::{make_record, MockCursor, MockProvider};
use litsearch::providers::{ProviderRegistry, SearchError};
use litsearch::search::{run_combined, SearchSession, StopReason};
use litsearch::utils::Transport;

/// Transport that replays a fixed script of responses.
#[derive(Debug)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String, SearchError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<String, SearchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, _url: &str, _headers: &[(String, String)]) -> Result<String, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(SearchError::Transport("script exhausted".to_string())))
    }
}

fn page_of(ids: &[&str], source: &str, next: Option<MockCursor>) -> String {
    let records = ids
        .iter()
        .map(|id| make_record(id, &format!("Paper {}", id), source))
        .collect();
    MockProvider::page(records, next)
}

fn session(
    provider: MockProvider,
    transport: Arc<ScriptedTransport>,
    cache: &RequestCache,
    request: SearchRequest,
) -> SearchSession {
    SearchSession::start(Arc::new(provider), transport, cache.clone(), request)
        .expect("searchable provider")
}

#[tokio::test]
async fn paginates_until_empty_page() {
    let transport = ScriptedTransport::new(vec![
        Ok(page_of(&["1", "2"], "mock", Some(MockCursor::Offset(2)))),
        Ok(page_of(&["3", "4"], "mock", Some(MockCursor::Offset(4)))),
        Ok(page_of(&["5"], "mock", Some(MockCursor::Offset(5)))),
        Ok(page_of(&[], "mock", None)),
    ]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(0);

    let outcome = session(MockProvider::new("mock"), Arc::clone(&transport), &cache, request)
        .run()
        .await;

    assert_eq!(transport.calls(), 4);
    assert_eq!(outcome.fetched, 4);
    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.reason, StopReason::Exhausted);
}

#[tokio::test]
async fn stops_when_provider_omits_cursor() {
    let transport = ScriptedTransport::new(vec![Ok(page_of(&["1", "2"], "mock", None))]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(0);

    let outcome = session(MockProvider::new("mock"), Arc::clone(&transport), &cache, request)
        .run()
        .await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.reason, StopReason::Exhausted);
}

#[tokio::test]
async fn detects_stuck_cursor() {
    // The provider keeps handing back the same token; the engine must not
    // loop on it.
    let transport = ScriptedTransport::new(vec![
        Ok(page_of(&["1"], "mock", Some(MockCursor::Token("t1".into())))),
        Ok(page_of(&["2"], "mock", Some(MockCursor::Token("t1".into())))),
    ]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(0);

    let outcome = session(
        MockProvider::with_token_style("mock"),
        Arc::clone(&transport),
        &cache,
        request,
    )
    .run()
    .await;

    assert_eq!(transport.calls(), 2);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.reason, StopReason::CursorStuck);
}

#[tokio::test]
async fn failure_keeps_earlier_pages() {
    let transport = ScriptedTransport::new(vec![
        Ok(page_of(&["1", "2"], "mock", Some(MockCursor::Offset(2)))),
        Ok(page_of(&["3"], "mock", Some(MockCursor::Offset(3)))),
        Err(SearchError::Http { status: 500 }),
    ]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(0);

    let outcome = session(MockProvider::new("mock"), Arc::clone(&transport), &cache, request)
        .run()
        .await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.fetched, 2);
    match outcome.reason {
        StopReason::Failed(message) => assert!(message.contains("500")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn limit_truncates_mid_page() {
    let transport = ScriptedTransport::new(vec![
        Ok(page_of(&["1", "2", "3"], "mock", Some(MockCursor::Offset(3)))),
        Ok(page_of(&["4", "5", "6"], "mock", Some(MockCursor::Offset(6)))),
    ]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(5);

    let outcome = session(MockProvider::new("mock"), Arc::clone(&transport), &cache, request)
        .run()
        .await;

    assert_eq!(transport.calls(), 2);
    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.reason, StopReason::LimitReached);
}

#[tokio::test]
async fn unsearchable_provider_fails_before_network() {
    let transport = ScriptedTransport::new(vec![]);
    let cache = RequestCache::in_memory();

    let result = SearchSession::start(
        Arc::new(MockProvider::unsearchable("lookup-only")),
        Arc::clone(&transport) as Arc<dyn Transport>,
        cache,
        SearchRequest::new("q"),
    );

    assert!(matches!(result, Err(SearchError::Config(_))));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn cache_hit_skips_network() {
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(2);

    let first = ScriptedTransport::new(vec![Ok(page_of(&["1", "2"], "mock", None))]);
    let outcome = session(
        MockProvider::new("mock"),
        Arc::clone(&first),
        &cache,
        request.clone(),
    )
    .run()
    .await;
    assert_eq!(first.calls(), 1);
    assert_eq!(outcome.records.len(), 2);

    // Identical request against the same cache: served entirely from cache.
    let second = ScriptedTransport::new(vec![]);
    let outcome = session(MockProvider::new("mock"), Arc::clone(&second), &cache, request)
        .run()
        .await;
    assert_eq!(second.calls(), 0);
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn combined_search_survives_one_failing_provider() {
    let mut registry = ProviderRegistry::empty();
    registry.register(Arc::new(MockProvider::new("crossref")));
    registry.register(Arc::new(MockProvider::new("openalex")));
    registry.register(Arc::new(MockProvider::new("semantic")));

    // Same DOI from crossref and semantic so the merge collapses them;
    // openalex answers with a server error and gets skipped.
    let crossref_page = MockProvider::page(
        vec![{
            let mut r = make_record("cr1", "Shared Paper", "crossref");
            r.doi = "10.1/x".to_string();
            r
        }],
        None,
    );
    let semantic_page = MockProvider::page(
        vec![{
            let mut r = make_record("s1", "Shared Paper", "semantic");
            r.doi = "https://doi.org/10.1/X".to_string();
            r
        }],
        None,
    );

    let transport = ScriptedTransport::new(vec![
        Ok(crossref_page),
        Err(SearchError::Http { status: 503 }),
        Ok(semantic_page),
    ]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(30);

    let outcome = run_combined(&registry, Arc::clone(&transport) as Arc<dyn Transport>, cache, &request).await;

    assert_eq!(transport.calls(), 3);
    assert_eq!(outcome.fetched, 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].0, "openalex");

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].source, "crossref,semantic");
    assert_eq!(outcome.records[0].doi, "10.1/x");
}

#[tokio::test]
async fn combined_search_takes_one_page_per_provider() {
    let mut registry = ProviderRegistry::empty();
    registry.register(Arc::new(MockProvider::new("crossref")));
    registry.register(Arc::new(MockProvider::new("openalex")));
    registry.register(Arc::new(MockProvider::new("semantic")));

    // Every page advertises a continuation cursor, but the combined search
    // must not follow any of them.
    let transport = ScriptedTransport::new(vec![
        Ok(page_of(&["a"], "crossref", Some(MockCursor::Offset(1)))),
        Ok(page_of(&["b"], "openalex", Some(MockCursor::Offset(1)))),
        Ok(page_of(&["c"], "semantic", Some(MockCursor::Offset(1)))),
    ]);
    let cache = RequestCache::in_memory();
    let request = SearchRequest::new("q").limit(30);

    let outcome = run_combined(&registry, Arc::clone(&transport) as Arc<dyn Transport>, cache, &request).await;

    assert_eq!(transport.calls(), 3);
    assert_eq!(outcome.fetched, 3);
    assert_eq!(outcome.records.len(), 3);
    assert!(outcome.skipped.is_empty());
}
