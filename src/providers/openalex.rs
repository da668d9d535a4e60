//! OpenAlex metadata provider implementation.
//!
//! Uses the OpenAlex `works` endpoint with opaque cursor pagination. The
//! abstract comes back as an inverted index and is rebuilt into plain text.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::{Cursor, PaginationStyle, ParsedPage, Provider, ProviderCapabilities, SearchError};
use crate::models::{Record, RecordBuilder, SearchRequest, SortMode};

const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// OpenAlex metadata provider
#[derive(Debug, Clone)]
pub struct OpenAlexProvider {
    mailto: Option<String>,
}

impl OpenAlexProvider {
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

    fn parse_work(&self, work: OaWork) -> Record {
        let authors = work
            .authorships
            .iter()
            .filter_map(|a| a.author.display_name.as_deref())
            .collect::<Vec<_>>()
            .join("; ");

        let venue = work
            .primary_location
            .as_ref()
            .and_then(|l| l.source.as_ref())
            .and_then(|s| s.display_name.clone())
            .unwrap_or_default();

        let pdf_url = work
            .primary_location
            .as_ref()
            .and_then(|l| l.pdf_url.clone())
            .or_else(|| work.open_access.as_ref().and_then(|oa| oa.oa_url.clone()))
            .unwrap_or_default();

        let oa_status = work
            .open_access
            .as_ref()
            .and_then(|oa| oa.oa_status.clone())
            .unwrap_or_default();

        let abstract_text = work
            .abstract_inverted_index
            .as_ref()
            .map(rebuild_abstract)
            .unwrap_or_default();

        let id = work.id.unwrap_or_default();

        let mut builder = RecordBuilder::new(id.clone(), work.display_name.unwrap_or_default(), self.id())
            .authors(authors)
            .year(work.publication_year.unwrap_or(0) as i32)
            .venue(venue)
            .doi(work.doi.unwrap_or_default())
            .url(id)
            .abstract_text(abstract_text)
            .pdf_url(pdf_url)
            .oa_status(oa_status);

        if let Some(cited) = work.cited_by_count {
            builder = builder.extra("cited_by_count", serde_json::json!(cited));
        }
        if !work.concepts.is_empty() {
            let names: Vec<String> = work
                .concepts
                .into_iter()
                .filter_map(|c| c.display_name)
                .collect();
            builder = builder.extra("concepts", serde_json::json!(names));
        }

        builder.build()
    }
}

impl Default for OpenAlexProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for OpenAlexProvider {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::SEARCH | ProviderCapabilities::DOI_LOOKUP
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::Token
    }

    fn build_url(
        &self,
        request: &SearchRequest,
        page_size: usize,
        cursor: &Cursor,
    ) -> Result<String, SearchError> {
        let token = match cursor {
            Cursor::Token(t) => t.as_str(),
            _ => "*",
        };

        let mut url = format!(
            "{}/works?search={}&per-page={}&cursor={}",
            OPENALEX_API_BASE,
            urlencoding::encode(&request.query),
            page_size,
            urlencoding::encode(token)
        );

        let mut filters = Vec::new();
        if let Some(from) = request.year_from {
            filters.push(format!("from_publication_date:{}-01-01", from));
        }
        if let Some(to) = request.year_to {
            filters.push(format!("to_publication_date:{}-12-31", to));
        }
        if !filters.is_empty() {
            url.push_str("&filter=");
            url.push_str(&filters.join(","));
        }

        if request.sort == SortMode::Year {
            url.push_str("&sort=publication_year:desc");
        }

        if let Some(mailto) = &self.mailto {
            url.push_str("&mailto=");
            url.push_str(&urlencoding::encode(mailto));
        }

        Ok(url)
    }

    fn parse(&self, raw: &str) -> Result<ParsedPage, SearchError> {
        let data: OaResponse = serde_json::from_str(raw)?;

        let records = data
            .results
            .into_iter()
            .map(|work| self.parse_work(work))
            .collect();

        let next_cursor = data
            .meta
            .next_cursor
            .filter(|t| !t.is_empty())
            .map(Cursor::Token);

        Ok(ParsedPage {
            records,
            total: Some(data.meta.count),
            next_cursor,
        })
    }
}

/// Rebuild plain abstract text from OpenAlex's inverted index
fn rebuild_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut positions: BTreeMap<usize, &str> = BTreeMap::new();
    for (word, places) in index {
        for &place in places {
            positions.insert(place, word.as_str());
        }
    }
    positions.values().copied().collect::<Vec<_>>().join(" ")
}

// ===== OpenAlex API types =====

#[derive(Debug, Deserialize)]
struct OaResponse {
    #[serde(default)]
    meta: OaMeta,
    #[serde(default)]
    results: Vec<OaWork>,
}

#[derive(Debug, Deserialize, Default)]
struct OaMeta {
    #[serde(default)]
    count: usize,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OaWork {
    id: Option<String>,
    display_name: Option<String>,
    publication_year: Option<i64>,
    doi: Option<String>,
    #[serde(default)]
    authorships: Vec<OaAuthorship>,
    primary_location: Option<OaLocation>,
    open_access: Option<OaOpenAccess>,
    cited_by_count: Option<u64>,
    #[serde(default)]
    concepts: Vec<OaConcept>,
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
}

#[derive(Debug, Deserialize)]
struct OaAuthorship {
    #[serde(default)]
    author: OaAuthor,
}

#[derive(Debug, Deserialize, Default)]
struct OaAuthor {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    source: Option<OaSource>,
    pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaSource {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaOpenAccess {
    oa_status: Option<String>,
    oa_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaConcept {
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "meta": {"count": 2, "next_cursor": "IlsxNjA5MzcyODAw"},
        "results": [
            {
                "id": "https://openalex.org/W2741809807",
                "display_name": "Cyber Attribution Challenges",
                "publication_year": 2021,
                "doi": "https://doi.org/10.1145/3526089",
                "authorships": [
                    {"author": {"display_name": "Ada Lovelace"}}
                ],
                "primary_location": {
                    "source": {"display_name": "ACM Transactions on Privacy and Security"},
                    "pdf_url": "https://example.org/paper.pdf"
                },
                "open_access": {"oa_status": "gold", "oa_url": "https://example.org/oa.pdf"},
                "cited_by_count": 12,
                "abstract_inverted_index": {"Attribution": [1], "Cyber": [0], "is": [2], "hard.": [3]}
            }
        ]
    }"#;

    #[test]
    fn test_build_url_uses_cursor_token() {
        let provider = OpenAlexProvider::with_mailto("a@b.org");
        let request = SearchRequest::new("cyber attribution").year_from(2018);

        let url = provider
            .build_url(&request, 25, &Cursor::Token("abc==".to_string()))
            .unwrap();

        assert!(url.contains("search=cyber%20attribution"));
        assert!(url.contains("per-page=25"));
        assert!(url.contains("cursor=abc%3D%3D"));
        assert!(url.contains("filter=from_publication_date:2018-01-01"));
    }

    #[test]
    fn test_parse_sample() {
        let provider = OpenAlexProvider::with_mailto("a@b.org");
        let page = provider.parse(SAMPLE).unwrap();

        assert_eq!(page.total, Some(2));
        assert_eq!(
            page.next_cursor,
            Some(Cursor::Token("IlsxNjA5MzcyODAw".to_string()))
        );

        let record = &page.records[0];
        assert_eq!(record.title, "Cyber Attribution Challenges");
        assert_eq!(record.doi, "https://doi.org/10.1145/3526089");
        assert_eq!(record.oa_status, "gold");
        assert_eq!(record.pdf_url, "https://example.org/paper.pdf");
        assert_eq!(record.abstract_text, "Cyber Attribution is hard.");
        assert_eq!(record.source, "openalex");
    }

    #[test]
    fn test_parse_final_page_without_cursor() {
        let provider = OpenAlexProvider::with_mailto("a@b.org");
        let page = provider
            .parse(r#"{"meta": {"count": 0, "next_cursor": null}, "results": []}"#)
            .unwrap();

        assert!(page.records.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_rebuild_abstract_orders_words() {
        let mut index = HashMap::new();
        index.insert("world".to_string(), vec![1]);
        index.insert("hello".to_string(), vec![0]);
        assert_eq!(rebuild_abstract(&index), "hello world");
    }
}
