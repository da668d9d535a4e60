//! Scopus metadata provider implementation.
//!
//! Uses the Elsevier Scopus Search API. Year bounds are expressed as
//! `PUBYEAR` clauses appended to the query string, but only when the user
//! has not already written their own `PUBYEAR` clause. The OpenSearch
//! envelope reports counts as strings.

use serde::Deserialize;

use super::{Cursor, PaginationStyle, ParsedPage, Provider, ProviderCapabilities, SearchError};
use crate::models::{Record, RecordBuilder, SearchRequest, SortMode};

const SCOPUS_API_BASE: &str = "https://api.elsevier.com/content/search/scopus";

/// Scopus metadata provider
#[derive(Debug, Clone)]
pub struct ScopusProvider {
    api_key: Option<String>,
}

impl ScopusProvider {
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("SCOPUS_API_KEY").ok(),
        }
    }

    /// Create with an Elsevier API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    fn effective_query(&self, request: &SearchRequest) -> String {
        let mut query = request.query.clone();
        if !query.to_uppercase().contains("PUBYEAR") {
            if let Some(from) = request.year_from {
                query.push_str(&format!(" AND PUBYEAR >= {}", from));
            }
            if let Some(to) = request.year_to {
                query.push_str(&format!(" AND PUBYEAR <= {}", to));
            }
        }
        query
    }

    fn parse_entry(&self, entry: ScopusEntry) -> Record {
        let year = entry
            .cover_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok())
            .unwrap_or(0);

        let mut builder = RecordBuilder::new(
            entry.eid.unwrap_or_default(),
            entry.title.unwrap_or_default(),
            self.id(),
        )
        .authors(entry.creator.unwrap_or_default())
        .year(year)
        .venue(entry.publication_name.unwrap_or_default())
        .doi(entry.doi.unwrap_or_default())
        .url(entry.url.unwrap_or_default());

        if let Some(flag) = entry.open_access_flag {
            builder = builder.oa_status(if flag { "open" } else { "closed" });
        }
        if let Some(count) = entry.citedby_count.and_then(|c| c.parse::<u64>().ok()) {
            builder = builder.extra("cited_by_count", serde_json::json!(count));
        }

        builder.build()
    }
}

impl Default for ScopusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for ScopusProvider {
    fn id(&self) -> &str {
        "scopus"
    }

    fn name(&self) -> &str {
        "Scopus"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::SEARCH
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::Offset
    }

    fn build_url(
        &self,
        request: &SearchRequest,
        page_size: usize,
        cursor: &Cursor,
    ) -> Result<String, SearchError> {
        let start = match cursor {
            Cursor::Offset(n) => *n,
            _ => 0,
        };

        let mut url = format!(
            "{}?query={}&count={}&start={}",
            SCOPUS_API_BASE,
            urlencoding::encode(&self.effective_query(request)),
            page_size,
            start
        );

        if request.sort == SortMode::Year {
            url.push_str("&sort=-coverDate");
        }

        Ok(url)
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(key) = &self.api_key {
            headers.push(("X-ELS-APIKey".to_string(), key.clone()));
        }
        headers
    }

    fn parse(&self, raw: &str) -> Result<ParsedPage, SearchError> {
        let data: ScopusResponse = serde_json::from_str(raw)?;
        let results = data.results;

        let total = results
            .total_results
            .as_deref()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        let start = results
            .start_index
            .as_deref()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);

        // An empty result set comes back as a single entry carrying only an
        // error string; drop entries with no identity at all.
        let records: Vec<Record> = results
            .entry
            .into_iter()
            .filter(|e| e.title.is_some() || e.eid.is_some() || e.doi.is_some())
            .map(|e| self.parse_entry(e))
            .collect();

        let count = records.len();
        let next_cursor = if count > 0 && start + count < total {
            Some(Cursor::Offset(start + count))
        } else {
            None
        };

        Ok(ParsedPage {
            records,
            total: Some(total),
            next_cursor,
        })
    }
}

// ===== Scopus API types =====

#[derive(Debug, Deserialize)]
struct ScopusResponse {
    #[serde(rename = "search-results")]
    results: ScopusResults,
}

#[derive(Debug, Deserialize)]
struct ScopusResults {
    #[serde(rename = "opensearch:totalResults")]
    total_results: Option<String>,
    #[serde(rename = "opensearch:startIndex")]
    start_index: Option<String>,
    #[serde(default)]
    entry: Vec<ScopusEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct ScopusEntry {
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<String>,
    #[serde(rename = "prism:publicationName")]
    publication_name: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    #[serde(rename = "prism:url")]
    url: Option<String>,
    eid: Option<String>,
    #[serde(rename = "citedby-count")]
    citedby_count: Option<String>,
    #[serde(rename = "openaccessFlag")]
    open_access_flag: Option<bool>,
}
