//! Mock provider for testing the pagination engine without a network.
//!
//! Pages are scripted as JSON payloads built with [`MockProvider::page`];
//! a scripted transport hands them back and the mock parser turns them into
//! records plus a continuation cursor, exactly like a real provider.

use serde::{Deserialize, Serialize};

use super::{Cursor, PaginationStyle, ParsedPage, Provider, ProviderCapabilities, SearchError};
use crate::models::{Record, SearchRequest};

/// A scriptable provider for tests.
#[derive(Debug, Clone)]
pub struct MockProvider {
    id: String,
    style: PaginationStyle,
    searchable: bool,
}

/// Serialized continuation cursor inside a mock payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockCursor {
    Offset(usize),
    Token(String),
    Page(usize),
}

impl From<MockCursor> for Cursor {
    fn from(cursor: MockCursor) -> Self {
        match cursor {
            MockCursor::Offset(n) => Cursor::Offset(n),
            MockCursor::Token(t) => Cursor::Token(t),
            MockCursor::Page(p) => Cursor::Page(p),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MockPage {
    #[serde(default)]
    records: Vec<Record>,
    next: Option<MockCursor>,
}

impl MockProvider {
    /// Create a searchable mock with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            style: PaginationStyle::Offset,
            searchable: true,
        }
    }

    /// Create a mock using opaque-token pagination
    pub fn with_token_style(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            style: PaginationStyle::Token,
            searchable: true,
        }
    }

    /// Create a mock with no search configuration
    pub fn unsearchable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            style: PaginationStyle::Offset,
            searchable: false,
        }
    }

    /// Build a scripted page payload
    pub fn page(records: Vec<Record>, next: Option<MockCursor>) -> String {
        serde_json::to_string(&MockPage { records, next }).unwrap_or_default()
    }
}

impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        if self.searchable {
            ProviderCapabilities::SEARCH
        } else {
            ProviderCapabilities::empty()
        }
    }

    fn pagination(&self) -> PaginationStyle {
        self.style
    }

    fn build_url(
        &self,
        request: &SearchRequest,
        page_size: usize,
        cursor: &Cursor,
    ) -> Result<String, SearchError> {
        if !self.searchable {
            return Err(SearchError::Config(self.id.clone()));
        }
        Ok(format!(
            "mock://{}/search?q={}&size={}&cursor={}",
            self.id,
            urlencoding::encode(&request.query),
            page_size,
            urlencoding::encode(&cursor.as_param())
        ))
    }

    fn parse(&self, raw: &str) -> Result<ParsedPage, SearchError> {
        if !self.searchable {
            return Err(SearchError::Config(self.id.clone()));
        }
        let page: MockPage = serde_json::from_str(raw)?;

        let records = page
            .records
            .into_iter()
            .map(|mut record| {
                if record.source.is_empty() {
                    record.source = self.id.clone();
                }
                record
            })
            .collect();

        Ok(ParsedPage {
            records,
            total: None,
            next_cursor: page.next.map(Cursor::from),
        })
    }
}

/// Helper to create a small record for tests
pub fn make_record(external_id: &str, title: &str, source: &str) -> Record {
    Record::new(external_id, title, source)
}
