//! Semantic Scholar metadata provider implementation.
//!
//! Uses the Graph API `paper/search` endpoint with limit/offset pagination.
//! An API key is optional; when configured it is sent as `x-api-key`.

use serde::Deserialize;
use std::collections::HashMap;

use super::{Cursor, PaginationStyle, ParsedPage, Provider, ProviderCapabilities, SearchError};
use crate::models::{Record, RecordBuilder, SearchRequest};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

const SEARCH_FIELDS: &str =
    "title,authors,year,venue,abstract,url,externalIds,openAccessPdf,isOpenAccess,citationCount";

/// Semantic Scholar metadata provider
#[derive(Debug, Clone)]
pub struct SemanticScholarProvider {
    api_key: Option<String>,
}

impl SemanticScholarProvider {
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
        }
    }

    /// Create with an API key (optional, for higher rate limits)
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    fn parse_paper(&self, paper: S2Paper) -> Record {
        let authors = paper
            .authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect::<Vec<_>>()
            .join("; ");

        let doi = paper
            .external_ids
            .as_ref()
            .and_then(|ids| ids.get("DOI"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let oa_status = match (&paper.open_access_pdf, paper.is_open_access) {
            (Some(pdf), _) if pdf.status.is_some() => {
                pdf.status.clone().unwrap_or_default().to_lowercase()
            }
            (_, Some(true)) => "open".to_string(),
            _ => String::new(),
        };

        let mut builder = RecordBuilder::new(
            paper.paper_id.unwrap_or_default(),
            paper.title.unwrap_or_default(),
            self.id(),
        )
        .authors(authors)
        .year(paper.year.unwrap_or(0) as i32)
        .venue(paper.venue.unwrap_or_default())
        .doi(doi)
        .url(paper.url.unwrap_or_default())
        .abstract_text(paper.abstract_text.unwrap_or_default())
        .pdf_url(
            paper
                .open_access_pdf
                .and_then(|p| p.url)
                .unwrap_or_default(),
        )
        .oa_status(oa_status);

        if let Some(count) = paper.citation_count {
            builder = builder.extra("cited_by_count", serde_json::json!(count));
        }

        builder.build()
    }
}

impl Default for SemanticScholarProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for SemanticScholarProvider {
    fn id(&self) -> &str {
        "semantic"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
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
            "{}/paper/search?query={}&limit={}&offset={}&fields={}",
            SEMANTIC_API_BASE,
            urlencoding::encode(&request.query),
            page_size,
            offset,
            SEARCH_FIELDS
        );

        match (request.year_from, request.year_to) {
            (Some(from), Some(to)) => url.push_str(&format!("&year={}-{}", from, to)),
            (Some(from), None) => url.push_str(&format!("&year={}-", from)),
            (None, Some(to)) => url.push_str(&format!("&year=-{}", to)),
            (None, None) => {}
        }

        Ok(url)
    }

    fn headers(&self) -> Vec<(String, String)> {
        match &self.api_key {
            Some(key) => vec![("x-api-key".to_string(), key.clone())],
            None => Vec::new(),
        }
    }

    fn parse(&self, raw: &str) -> Result<ParsedPage, SearchError> {
        let data: S2SearchResponse = serde_json::from_str(raw)?;

        let records = data
            .data
            .into_iter()
            .map(|paper| self.parse_paper(paper))
            .collect();

        Ok(ParsedPage {
            records,
            total: Some(data.total),
            next_cursor: data.next.map(Cursor::Offset),
        })
    }
}

// ===== Semantic Scholar API types =====

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    #[serde(default)]
    total: usize,
    next: Option<usize>,
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    venue: Option<String>,
    year: Option<i64>,
    url: Option<String>,
    #[serde(default)]
    authors: Vec<S2Author>,
    external_ids: Option<HashMap<String, serde_json::Value>>,
    open_access_pdf: Option<S2Pdf>,
    is_open_access: Option<bool>,
    citation_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Pdf {
    url: Option<String>,
    status: Option<String>,
}
