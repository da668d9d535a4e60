//! Pagination engine: drives one provider through its page loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{SearchOutcome, StopReason};
use crate::cache::{request_key, CacheEntry, RequestCache};
use crate::models::{Record, SearchRequest};
use crate::providers::{Cursor, PaginationStyle, Provider, SearchError, MAX_PAGE_SIZE};
use crate::utils::http::Transport;
use crate::utils::merge::merge_records;

/// One in-flight search against a single provider.
///
/// The session owns its accumulator and cursor; nothing is shared, so
/// concurrent sessions over the same provider never interfere. `run`
/// consumes the session and applies its stop conditions in a fixed order:
///
/// 1. the requested limit is reached
/// 2. a page comes back empty
/// 3. the provider offers no continuation cursor
/// 4. the continuation cursor equals the current one (stuck)
/// 5. a transport, HTTP, or parse failure
///
/// Conditions 2-5 finalize with whatever records were accumulated so far;
/// a failure partway through a multi-page search keeps the earlier pages.
pub struct SearchSession {
    provider: Arc<dyn Provider>,
    transport: Arc<dyn Transport>,
    cache: RequestCache,
    request: SearchRequest,
    cursor: Cursor,
    records: Vec<Record>,
    fetched: usize,
}

impl SearchSession {
    /// Start a session. Fails fast with [`SearchError::Config`] when the
    /// provider has no search support, before any network activity.
    pub fn start(
        provider: Arc<dyn Provider>,
        transport: Arc<dyn Transport>,
        cache: RequestCache,
        request: SearchRequest,
    ) -> Result<Self, SearchError> {
        if !provider.supports_search() {
            return Err(SearchError::Config(provider.id().to_string()));
        }
        let cursor = provider.pagination().initial();
        Ok(Self {
            provider,
            transport,
            cache,
            request,
            cursor,
            records: Vec::new(),
            fetched: 0,
        })
    }

    fn page_size(&self) -> usize {
        if self.request.limit == 0 {
            MAX_PAGE_SIZE
        } else {
            (self.request.limit - self.records.len())
                .min(MAX_PAGE_SIZE)
                .max(1)
        }
    }

    /// Fetch and parse the page at the current cursor, consulting the
    /// request cache first.
    async fn fetch_page(&self) -> Result<crate::providers::ParsedPage, SearchError> {
        let url = self
            .provider
            .build_url(&self.request, self.page_size(), &self.cursor)?;
        let headers = self.provider.headers();

        // Opaque tokens are part of the request identity even when a
        // provider elides them from the URL on the first page.
        let mut context = BTreeMap::new();
        if self.provider.pagination() == PaginationStyle::Token {
            context.insert("cursor".to_string(), self.cursor.as_param());
        }

        let key = request_key(self.provider.id(), &url, &headers, &context);

        let payload = match self.cache.get(&key) {
            Some(entry) => entry.payload,
            None => {
                let payload = self.transport.fetch(&url, &headers).await?;
                self.cache
                    .put(CacheEntry::new(&key, self.provider.id(), &url, &payload));
                payload
            }
        };

        self.provider.parse(&payload)
    }

    /// Run the page loop to completion.
    pub async fn run(mut self) -> SearchOutcome {
        let reason = loop {
            if self.request.limit > 0 && self.records.len() >= self.request.limit {
                break StopReason::LimitReached;
            }

            let page = match self.fetch_page().await {
                Ok(page) => page,
                Err(err) => {
                    warn!(
                        provider = self.provider.id(),
                        page = self.fetched + 1,
                        error = %err,
                        "page fetch failed, finalizing with accumulated records"
                    );
                    break StopReason::Failed(err.to_string());
                }
            };

            self.fetched += 1;
            let count = page.records.len();
            self.records.extend(page.records);
            debug!(
                provider = self.provider.id(),
                page = self.fetched,
                records = count,
                accumulated = self.records.len(),
                "page fetched"
            );

            if self.request.limit > 0 && self.records.len() >= self.request.limit {
                self.records.truncate(self.request.limit);
                break StopReason::LimitReached;
            }

            if count == 0 {
                break StopReason::Exhausted;
            }

            match page.next_cursor {
                None => break StopReason::Exhausted,
                Some(next) if next == self.cursor => {
                    warn!(
                        provider = self.provider.id(),
                        cursor = %next,
                        "provider repeated its continuation cursor"
                    );
                    break StopReason::CursorStuck;
                }
                Some(next) => self.cursor = next,
            }
        };

        self.finish(reason)
    }

    /// Fetch exactly one page and finalize, never paging on. Used by the
    /// combined search, which takes a single page from each provider.
    pub async fn run_one_page(mut self) -> SearchOutcome {
        let reason = match self.fetch_page().await {
            Ok(mut page) => {
                self.fetched = 1;
                if self.request.limit > 0 {
                    page.records.truncate(self.request.limit);
                }
                let empty = page.records.is_empty();
                self.records.extend(page.records);
                if empty {
                    StopReason::Exhausted
                } else {
                    StopReason::LimitReached
                }
            }
            Err(err) => {
                warn!(
                    provider = self.provider.id(),
                    error = %err,
                    "page fetch failed"
                );
                StopReason::Failed(err.to_string())
            }
        };
        self.finish(reason)
    }

    fn finish(self, reason: StopReason) -> SearchOutcome {
        let raw = self.records.len();
        let records = merge_records(self.records);
        info!(
            provider = self.provider.id(),
            pages = self.fetched,
            raw,
            merged = records.len(),
            reason = %reason,
            "search finished"
        );
        SearchOutcome {
            records,
            fetched: self.fetched,
            reason,
        }
    }
}
