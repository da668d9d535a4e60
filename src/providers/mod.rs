//! Metadata provider plugins with a trait-based registry.
//!
//! Each provider contributes three pure functions: a URL builder, a header
//! builder, and a response parser, plus a declared pagination style. A
//! provider is searchable only when all three are present; lookup-only
//! providers (such as Unpaywall) stay registered for other capabilities but
//! are excluded from search and fail fast with [`SearchError::Config`] when
//! a search is started on them directly.
//!
//! URL builders must be deterministic for identical inputs; the request
//! cache keys on the built URL. Parsers must not fail on a well-formed but
//! empty payload: they return zero records and no cursor, which the
//! pagination engine reads as "no more pages".

mod crossref;
mod openalex;
mod registry;
mod scopus;
mod semantic;
mod unpaywall;
mod wos;

pub mod mock;

pub use crossref::CrossrefProvider;
pub use mock::MockProvider;
pub use openalex::OpenAlexProvider;
pub use registry::{ProviderCapabilities, ProviderRegistry};
pub use scopus::ScopusProvider;
pub use semantic::SemanticScholarProvider;
pub use unpaywall::UnpaywallProvider;
pub use wos::WosProvider;

use crate::models::{Record, SearchRequest};

/// Hard cap on the number of records requested per page, regardless of the
/// caller's total target. Bounds memory and keeps individual requests within
/// provider limits.
pub const MAX_PAGE_SIZE: usize = 100;

/// Opaque continuation token for one provider's paging loop.
///
/// Owned solely by the pagination engine's loop state; never persisted
/// beyond one search. Structural equality is what the stuck-cursor guard
/// compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Integer record offset (Crossref, Scopus, Semantic Scholar)
    Offset(usize),
    /// Opaque server-issued token (OpenAlex)
    Token(String),
    /// 1-based page number (Web of Science)
    Page(usize),
}

impl Cursor {
    /// Render the cursor the way it appears in a query string
    pub fn as_param(&self) -> String {
        match self {
            Cursor::Offset(n) => n.to_string(),
            Cursor::Token(t) => t.clone(),
            Cursor::Page(p) => p.to_string(),
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

/// How a provider pages through results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// `offset=N` style integer offsets
    Offset,
    /// Opaque continuation tokens ("*" requests the first page)
    Token,
    /// 1-based page numbers
    Page,
}

impl PaginationStyle {
    /// The cursor that requests the first page for this style
    pub fn initial(self) -> Cursor {
        match self {
            PaginationStyle::Offset => Cursor::Offset(0),
            PaginationStyle::Token => Cursor::Token("*".to_string()),
            PaginationStyle::Page => Cursor::Page(1),
        }
    }
}

/// One parsed page of provider results
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Records normalized from this page
    pub records: Vec<Record>,

    /// Total hit count reported by the provider, when it reports one
    pub total: Option<usize>,

    /// Continuation cursor for the next page; `None` means no more pages
    pub next_cursor: Option<Cursor>,
}

/// Errors that can occur while searching a provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The provider lacks a complete URL/header/parse triple for search
    #[error("provider '{0}' has no search configuration")]
    Config(String),

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status
    #[error("http error {status}")]
    Http { status: u16 },

    /// Payload does not match the expected shape for this provider
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Parse(format!("JSON: {}", err))
    }
}

/// The Provider trait defines the search contract every metadata provider
/// implements.
///
/// # Implementing a new provider
///
/// 1. Create a struct holding whatever credentials the API needs
/// 2. Implement `id`, `name`, `capabilities` and `pagination`
/// 3. Override `build_url`, `headers` and `parse` for search support
/// 4. Register it in [`ProviderRegistry::from_config`]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Unique identifier (used in the registry and in record provenance)
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Describe the capabilities of this provider
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::empty()
    }

    /// Whether this provider supports search
    fn supports_search(&self) -> bool {
        self.capabilities().contains(ProviderCapabilities::SEARCH)
    }

    /// Declared pagination style
    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::Offset
    }

    /// Build the request URL for one page.
    ///
    /// Must be pure: identical inputs yield the identical, fully
    /// percent-encoded URL.
    fn build_url(
        &self,
        _request: &SearchRequest,
        _page_size: usize,
        _cursor: &Cursor,
    ) -> Result<String, SearchError> {
        Err(SearchError::Config(self.id().to_string()))
    }

    /// Request headers, including any API key header
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Parse one raw response payload into records plus a continuation
    /// cursor
    fn parse(&self, _raw: &str) -> Result<ParsedPage, SearchError> {
        Err(SearchError::Config(self.id().to_string()))
    }
}
