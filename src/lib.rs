//! litsearch: federated academic literature search.
//!
//! Queries scholarly metadata providers (Crossref, OpenAlex, Semantic
//! Scholar, Scopus, Web of Science) through one canonical record shape,
//! pages through results with per-provider cursor styles, caches raw
//! responses content-addressed on disk, and merges duplicate works across
//! providers into single enriched records.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use litsearch::models::SearchRequest;
//! use litsearch::providers::ProviderRegistry;
//! use litsearch::cache::RequestCache;
//! use litsearch::utils::HttpTransport;
//!
//! # async fn demo() -> Result<(), litsearch::providers::SearchError> {
//! let registry = ProviderRegistry::new();
//! let transport = Arc::new(HttpTransport::new()?);
//! let cache = RequestCache::in_memory();
//!
//! let request = SearchRequest::new("cyber attribution").limit(50);
//! let outcome = litsearch::search::search(&registry, "openalex", transport, cache, request).await?;
//! println!("{} records ({})", outcome.records.len(), outcome.reason);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod models;
pub mod providers;
pub mod search;
pub mod utils;

pub use models::{Record, SearchRequest, SortMode};
pub use providers::{Provider, ProviderRegistry, SearchError};
pub use search::{search, SearchOutcome, StopReason};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
