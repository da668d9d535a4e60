//! Crossref metadata provider implementation.
//!
//! Uses the Crossref REST API `works` endpoint with bibliographic query and
//! offset pagination. Supplying a `mailto` address routes requests through
//! the polite pool.

use serde::Deserialize;

use super::{Cursor, PaginationStyle, ParsedPage, Provider, ProviderCapabilities, SearchError};
use crate::models::{RecordBuilder, SearchRequest, SortMode};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// Crossref metadata provider
#[derive(Debug, Clone)]
pub struct CrossrefProvider {
    mailto: Option<String>,
}

impl CrossrefProvider {
    pub fn new() -> Self {
        Self {
            mailto: std::env::var("LITSEARCH_CONTACT_EMAIL").ok(),
        }
    }

    /// Create with a contact address for the polite pool
    pub fn with_mailto(mailto: impl Into<String>) -> Self {
        Self {
            mailto: Some(mailto.into()),
        }
    }
}

impl Default for CrossrefProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CrossrefProvider {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "Crossref"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::SEARCH | ProviderCapabilities::DOI_LOOKUP
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
        let offset = match cursor {
            Cursor::Offset(n) => *n,
            _ => 0,
        };

        let mut url = format!(
            "{}/works?query.bibliographic={}&rows={}&offset={}",
            CROSSREF_API_BASE,
            urlencoding::encode(&request.query),
            page_size,
            offset
        );

        let mut filters = Vec::new();
        if let Some(from) = request.year_from {
            filters.push(format!("from-pub-date:{}-01-01", from));
        }
        if let Some(to) = request.year_to {
            filters.push(format!("until-pub-date:{}-12-31", to));
        }
        if !filters.is_empty() {
            url.push_str("&filter=");
            url.push_str(&filters.join(","));
        }

        if request.sort == SortMode::Year {
            url.push_str("&sort=published&order=desc");
        }

        if let Some(mailto) = &self.mailto {
            url.push_str("&mailto=");
            url.push_str(&urlencoding::encode(mailto));
        }

        Ok(url)
    }

    fn parse(&self, raw: &str) -> Result<ParsedPage, SearchError> {
        let data: CrResponse = serde_json::from_str(raw)?;
        let message = data.message;

        let start_index = message.query.map(|q| q.start_index).unwrap_or(0);
        let count = message.items.len();

        let records = message
            .items
            .into_iter()
            .map(|item| {
                let title = item.title.into_iter().next().unwrap_or_default();
                let venue = item.container_title.into_iter().next().unwrap_or_default();
                let doi = item.doi.unwrap_or_default();

                let authors = item
                    .author
                    .iter()
                    .map(|a| {
                        match (&a.given, &a.family) {
                            (Some(g), Some(f)) => format!("{} {}", g, f),
                            (Some(g), None) => g.clone(),
                            (None, Some(f)) => f.clone(),
                            (None, None) => a.name.clone().unwrap_or_default(),
                        }
                    })
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");

                let year = item
                    .issued
                    .and_then(|d| d.date_parts.into_iter().next())
                    .and_then(|parts| parts.into_iter().next().flatten())
                    .unwrap_or(0) as i32;

                let pdf_url = item
                    .link
                    .iter()
                    .find(|l| l.content_type.as_deref() == Some("application/pdf"))
                    .and_then(|l| l.url.clone())
                    .unwrap_or_default();

                let mut builder = RecordBuilder::new(doi.clone(), title, self.id())
                    .authors(authors)
                    .year(year)
                    .venue(venue)
                    .doi(doi)
                    .url(item.url.unwrap_or_default())
                    .abstract_text(item.abstract_text.unwrap_or_default())
                    .pdf_url(pdf_url);

                if let Some(cited) = item.cited_by {
                    builder = builder.extra("cited_by_count", serde_json::json!(cited));
                }

                builder.build()
            })
            .collect();

        let next_cursor = if count > 0 && start_index + count < message.total_results {
            Some(Cursor::Offset(start_index + count))
        } else {
            None
        };

        Ok(ParsedPage {
            records,
            total: Some(message.total_results),
            next_cursor,
        })
    }
}

// ===== Crossref API types =====

#[derive(Debug, Deserialize)]
struct CrResponse {
    message: CrMessage,
}

#[derive(Debug, Deserialize)]
struct CrMessage {
    #[serde(rename = "total-results", default)]
    total_results: usize,
    #[serde(default)]
    items: Vec<CrItem>,
    #[serde(default)]
    query: Option<CrQuery>,
}

#[derive(Debug, Deserialize)]
struct CrQuery {
    #[serde(rename = "start-index", default)]
    start_index: usize,
}

#[derive(Debug, Deserialize, Default)]
struct CrItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(default)]
    author: Vec<CrAuthor>,
    issued: Option<CrDate>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "is-referenced-by-count")]
    cited_by: Option<u64>,
    #[serde(default)]
    link: Vec<CrLink>,
}

#[derive(Debug, Deserialize)]
struct CrAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrDate {
    // date-parts may contain nulls for partial dates
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct CrLink {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "message": {
            "total-results": 120,
            "query": {"start-index": 0},
            "items": [
                {
                    "title": ["Cyber Attribution Challenges"],
                    "container-title": ["ACM Trans. Priv. Secur."],
                    "DOI": "10.1145/3526089",
                    "URL": "https://doi.org/10.1145/3526089",
                    "author": [
                        {"given": "Ada", "family": "Lovelace"},
                        {"given": "Alan", "family": "Turing"}
                    ],
                    "issued": {"date-parts": [[2021, 6]]},
                    "is-referenced-by-count": 17
                }
            ]
        }
    }"#;

    #[test]
    fn test_build_url_is_deterministic() {
        let provider = CrossrefProvider::with_mailto("a@b.org");
        let request = SearchRequest::new("cyber attribution")
            .year_from(2018)
            .year_to(2022);

        let a = provider
            .build_url(&request, 25, &Cursor::Offset(50))
            .unwrap();
        let b = provider
            .build_url(&request, 25, &Cursor::Offset(50))
            .unwrap();

        assert_eq!(a, b);
        assert!(a.contains("query.bibliographic=cyber%20attribution"));
        assert!(a.contains("rows=25"));
        assert!(a.contains("offset=50"));
        assert!(a.contains("filter=from-pub-date:2018-01-01,until-pub-date:2022-12-31"));
        assert!(a.contains("mailto=a%40b.org"));
    }

    #[test]
    fn test_year_sort_param() {
        let provider = CrossrefProvider::with_mailto("a@b.org");
        let request = SearchRequest::new("x").sort(SortMode::Year);
        let url = provider
            .build_url(&request, 10, &Cursor::Offset(0))
            .unwrap();
        assert!(url.contains("sort=published&order=desc"));
    }

    #[test]
    fn test_parse_sample() {
        let provider = CrossrefProvider::with_mailto("a@b.org");
        let page = provider.parse(SAMPLE).unwrap();

        assert_eq!(page.total, Some(120));
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_cursor, Some(Cursor::Offset(1)));

        let record = &page.records[0];
        assert_eq!(record.title, "Cyber Attribution Challenges");
        assert_eq!(record.authors, "Ada Lovelace; Alan Turing");
        assert_eq!(record.year, 2021);
        assert_eq!(record.venue, "ACM Trans. Priv. Secur.");
        assert_eq!(record.doi, "10.1145/3526089");
        assert_eq!(record.source, "crossref");
        assert_eq!(record.extra["cited_by_count"], serde_json::json!(17));
    }

    #[test]
    fn test_parse_empty_result_is_not_an_error() {
        let provider = CrossrefProvider::with_mailto("a@b.org");
        let page = provider
            .parse(r#"{"message": {"total-results": 0, "items": []}}"#)
            .unwrap();

        assert!(page.records.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let provider = CrossrefProvider::with_mailto("a@b.org");
        let raw = r#"{
            "message": {
                "total-results": 1,
                "query": {"start-index": 0},
                "items": [{"title": ["Only Hit"], "DOI": "10.1/x"}]
            }
        }"#;
        let page = provider.parse(raw).unwrap();
        assert!(page.next_cursor.is_none());
    }
}
