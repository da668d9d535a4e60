//! Web of Science Starter API provider implementation.
//!
//! Queries the `documents` endpoint with a `TS=(...)` topic search and
//! page-number pagination. A `PY=(...)` clause is appended only when the
//! user's query does not already constrain publication years.

use serde::Deserialize;

use super::{Cursor, PaginationStyle, ParsedPage, Provider, ProviderCapabilities, SearchError};
use crate::models::{Record, RecordBuilder, SearchRequest};

const WOS_API_BASE: &str = "https://api.clarivate.com/apis/wos-starter/v1";

/// Web of Science metadata provider (Starter API)
#[derive(Debug, Clone)]
pub struct WosProvider {
    api_key: Option<String>,
}

impl WosProvider {
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("WOS_API_KEY").ok(),
        }
    }

    /// Create with a Clarivate API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    fn effective_query(&self, request: &SearchRequest) -> String {
        let upper = request.query.to_uppercase();
        let mut query = if upper.contains("TS=") {
            request.query.clone()
        } else {
            format!("TS=({})", request.query)
        };

        if !query.to_uppercase().contains("PY=") {
            if request.year_from.is_some() || request.year_to.is_some() {
                let from = request.year_from.unwrap_or(1900);
                let to = request.year_to.unwrap_or(2100);
                query.push_str(&format!(" AND PY=({}-{})", from, to));
            }
        }

        query
    }

    fn parse_hit(&self, hit: WosHit) -> Record {
        let authors = hit
            .names
            .map(|n| {
                n.authors
                    .iter()
                    .filter_map(|a| a.display_name.as_deref())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default();

        let (venue, year) = hit
            .source
            .map(|s| {
                (
                    s.source_title.unwrap_or_default(),
                    s.publish_year.unwrap_or(0) as i32,
                )
            })
            .unwrap_or_default();

        let doi = hit
            .identifiers
            .and_then(|ids| ids.doi)
            .unwrap_or_default();

        let url = hit
            .links
            .and_then(|l| l.record)
            .unwrap_or_default();

        RecordBuilder::new(hit.uid.unwrap_or_default(), hit.title.unwrap_or_default(), self.id())
            .authors(authors)
            .year(year)
            .venue(venue)
            .doi(doi)
            .url(url)
            .build()
    }
}

impl Default for WosProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for WosProvider {
    fn id(&self) -> &str {
        "wos"
    }

    fn name(&self) -> &str {
        "Web of Science"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::SEARCH
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::Page
    }

    fn build_url(
        &self,
        request: &SearchRequest,
        page_size: usize,
        cursor: &Cursor,
    ) -> Result<String, SearchError> {
        let page = match cursor {
            Cursor::Page(p) => *p,
            _ => 1,
        };

        Ok(format!(
            "{}/documents?db=WOS&q={}&limit={}&page={}",
            WOS_API_BASE,
            urlencoding::encode(&self.effective_query(request)),
            page_size,
            page
        ))
    }

    fn headers(&self) -> Vec<(String, String)> {
        match &self.api_key {
            Some(key) => vec![("X-ApiKey".to_string(), key.clone())],
            None => Vec::new(),
        }
    }

    fn parse(&self, raw: &str) -> Result<ParsedPage, SearchError> {
        let data: WosResponse = serde_json::from_str(raw)?;

        let records: Vec<Record> = data
            .hits
            .into_iter()
            .map(|hit| self.parse_hit(hit))
            .collect();

        let metadata = data.metadata;
        let page = metadata.page.max(1);
        let per_page = if metadata.limit > 0 {
            metadata.limit
        } else {
            records.len()
        };

        let next_cursor = if !records.is_empty() && page * per_page < metadata.total {
            Some(Cursor::Page(page + 1))
        } else {
            None
        };

        Ok(ParsedPage {
            records,
            total: Some(metadata.total),
            next_cursor,
        })
    }
}

// ===== WoS Starter API types =====

#[derive(Debug, Deserialize)]
struct WosResponse {
    #[serde(default)]
    metadata: WosMetadata,
    #[serde(default)]
    hits: Vec<WosHit>,
}

#[derive(Debug, Deserialize, Default)]
struct WosMetadata {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    page: usize,
    #[serde(default)]
    limit: usize,
}

#[derive(Debug, Deserialize, Default)]
struct WosHit {
    uid: Option<String>,
    title: Option<String>,
    names: Option<WosNames>,
    source: Option<WosSource>,
    identifiers: Option<WosIdentifiers>,
    links: Option<WosLinks>,
}

#[derive(Debug, Deserialize)]
struct WosNames {
    #[serde(default)]
    authors: Vec<WosAuthor>,
}

#[derive(Debug, Deserialize)]
struct WosAuthor {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WosSource {
    #[serde(rename = "sourceTitle")]
    source_title: Option<String>,
    #[serde(rename = "publishYear")]
    publish_year: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WosIdentifiers {
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WosLinks {
    record: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": {"total": 53, "page": 1, "limit": 1},
        "hits": [
            {
                "uid": "WOS:000700000000001",
                "title": "Cyber Attribution Challenges",
                "names": {"authors": [{"displayName": "Lovelace, Ada"}]},
                "source": {"sourceTitle": "IEEE Security & Privacy", "publishYear": 2021},
                "identifiers": {"doi": "10.1109/MSEC.2021.3071721"},
                "links": {"record": "https://www.webofscience.com/wos/woscc/full-record/WOS:000700000000001"}
            }
        ]
    }"#;

    #[test]
    fn test_query_wrapped_in_ts_clause() {
        let provider = WosProvider::with_api_key("k");
        let request = SearchRequest::new("cyber attribution")
            .year_from(2018)
            .year_to(2022);

        let url = provider.build_url(&request, 25, &Cursor::Page(2)).unwrap();
        let decoded = urlencoding::decode(&url).unwrap().into_owned();

        assert!(decoded.contains("TS=(cyber attribution) AND PY=(2018-2022)"));
        assert!(decoded.contains("page=2"));
        assert!(decoded.contains("limit=25"));
    }

    #[test]
    fn test_user_py_clause_is_respected() {
        let provider = WosProvider::with_api_key("k");
        let request = SearchRequest::new("TS=(malware) AND PY=(2020)")
            .year_from(2018)
            .year_to(2022);

        let url = provider.build_url(&request, 25, &Cursor::Page(1)).unwrap();
        let decoded = urlencoding::decode(&url).unwrap().into_owned();

        assert!(decoded.contains("PY=(2020)"));
        assert!(!decoded.contains("PY=(2018-2022)"));
    }

    #[test]
    fn test_api_key_header() {
        let provider = WosProvider::with_api_key("secret");
        assert_eq!(
            provider.headers(),
            vec![("X-ApiKey".to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn test_parse_sample() {
        let provider = WosProvider::with_api_key("k");
        let page = provider.parse(SAMPLE).unwrap();

        assert_eq!(page.total, Some(53));
        assert_eq!(page.next_cursor, Some(Cursor::Page(2)));

        let record = &page.records[0];
        assert_eq!(record.external_id, "WOS:000700000000001");
        assert_eq!(record.authors, "Lovelace, Ada");
        assert_eq!(record.year, 2021);
        assert_eq!(record.venue, "IEEE Security & Privacy");
    }

    #[test]
    fn test_parse_last_page() {
        let provider = WosProvider::with_api_key("k");
        let raw = r#"{"metadata": {"total": 0, "page": 1, "limit": 10}, "hits": []}"#;
        let page = provider.parse(raw).unwrap();

        assert!(page.records.is_empty());
        assert!(page.next_cursor.is_none());
    }
}
