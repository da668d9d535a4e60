//! Combined open-source search: one page each from the free metadata
//! providers, merged into a single deduplicated result set.

use std::sync::Arc;

use tracing::warn;

use crate::cache::RequestCache;
use crate::models::{Record, SearchRequest};
use crate::providers::{ProviderRegistry, SearchError};
use crate::search::{SearchSession, StopReason};
use crate::utils::http::Transport;
use crate::utils::merge::merge_records;

/// Providers polled by the combined search, in order. All three are usable
/// without an API key.
pub const COMBINED_PROVIDERS: [&str; 3] = ["crossref", "openalex", "semantic"];

/// Per-provider page size when the caller asked for everything
pub const COMBINED_DEFAULT_PAGE: usize = 25;

/// Result of one combined search.
#[derive(Debug)]
pub struct CombinedOutcome {
    /// Deduplicated, merged records across all contributing providers
    pub records: Vec<Record>,

    /// Total pages fetched (at most one per provider)
    pub fetched: usize,

    /// Providers that contributed nothing, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Fetch the first page from a single provider, without paging on.
async fn fetch_first_page(
    registry: &ProviderRegistry,
    id: &str,
    transport: Arc<dyn Transport>,
    cache: RequestCache,
    request: SearchRequest,
) -> Result<Vec<Record>, SearchError> {
    let provider = registry.get_required(id)?;

    let session = SearchSession::start(provider, transport, cache, request)?;
    let outcome = session.run_one_page().await;
    match outcome.reason {
        StopReason::Failed(message) if outcome.records.is_empty() => {
            Err(SearchError::Transport(message))
        }
        _ => Ok(outcome.records),
    }
}

/// Run a combined search: one page from each provider in
/// [`COMBINED_PROVIDERS`], sequentially, then one merge pass over
/// everything.
///
/// A failing provider is logged and skipped; the others still contribute.
/// The outcome's `skipped` list records who dropped out and why.
pub async fn run_combined(
    registry: &ProviderRegistry,
    transport: Arc<dyn Transport>,
    cache: RequestCache,
    request: &SearchRequest,
) -> CombinedOutcome {
    // Split the caller's target across the three providers; each gets at
    // least one record's worth of page.
    let page_size = if request.limit == 0 {
        COMBINED_DEFAULT_PAGE
    } else {
        (request.limit / COMBINED_PROVIDERS.len()).max(1)
    };

    let mut raw: Vec<Record> = Vec::new();
    let mut fetched = 0;
    let mut skipped: Vec<(String, String)> = Vec::new();

    for id in COMBINED_PROVIDERS {
        let mut provider_request = request.clone();
        provider_request.limit = page_size;

        match fetch_first_page(
            registry,
            id,
            Arc::clone(&transport),
            cache.clone(),
            provider_request,
        )
        .await
        {
            Ok(records) => {
                fetched += 1;
                raw.extend(records);
            }
            Err(err) => {
                warn!(provider = id, error = %err, "combined search: provider skipped");
                skipped.push((id.to_string(), err.to_string()));
            }
        }
    }

    CombinedOutcome {
        records: merge_records(raw),
        fetched,
        skipped,
    }
}
