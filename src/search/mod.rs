//! Search engine: per-provider pagination sessions and the combined
//! multi-provider search.

mod combined;
mod session;

pub use combined::{run_combined, CombinedOutcome, COMBINED_DEFAULT_PAGE, COMBINED_PROVIDERS};
pub use session::SearchSession;

use std::sync::Arc;

use crate::cache::RequestCache;
use crate::models::{Record, SearchRequest};
use crate::providers::{ProviderRegistry, SearchError};
use crate::utils::http::Transport;

/// Why a search stopped paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of records was collected
    LimitReached,

    /// The provider ran out of results
    Exhausted,

    /// The provider repeated its continuation cursor
    CursorStuck,

    /// A transport, HTTP, or parse failure ended the search early
    Failed(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::LimitReached => write!(f, "limit reached"),
            StopReason::Exhausted => write!(f, "no more pages"),
            StopReason::CursorStuck => write!(f, "cursor stuck"),
            StopReason::Failed(message) => write!(f, "{}", message),
        }
    }
}

/// Result of one single-provider search.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Deduplicated, merged records in first-seen order
    pub records: Vec<Record>,

    /// Number of pages fetched
    pub fetched: usize,

    /// Why the page loop stopped
    pub reason: StopReason,
}

/// Search a single registered provider by id.
///
/// Convenience wrapper over [`SearchSession`]: resolves the provider,
/// starts a session, and runs the full page loop.
pub async fn search(
    registry: &ProviderRegistry,
    provider_id: &str,
    transport: Arc<dyn Transport>,
    cache: RequestCache,
    request: SearchRequest,
) -> Result<SearchOutcome, SearchError> {
    let provider = registry.get_required(provider_id)?;
    let session = SearchSession::start(provider, transport, cache, request)?;
    Ok(session.run().await)
}
