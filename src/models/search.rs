//! Search request model.

use serde::{Deserialize, Serialize};

/// Sort mode for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Relevance,
    Year,
}

/// Parameters for one search execution.
///
/// The same request drives every provider; each provider's URL builder maps
/// these fields onto its own query syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query string
    pub query: String,

    /// Earliest publication year to include
    pub year_from: Option<i32>,

    /// Latest publication year to include
    pub year_to: Option<i32>,

    /// Total result target across all pages; 0 means "fetch all", paging
    /// until the provider is exhausted or another stop condition fires
    pub limit: usize,

    /// Sort mode
    pub sort: SortMode,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            year_from: None,
            year_to: None,
            limit: 20,
            sort: SortMode::Relevance,
        }
    }
}

impl SearchRequest {
    /// Create a new request for a query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the earliest publication year
    pub fn year_from(mut self, year: i32) -> Self {
        self.year_from = Some(year);
        self
    }

    /// Set the latest publication year
    pub fn year_to(mut self, year: i32) -> Self {
        self.year_to = Some(year);
        self
    }

    /// Set the total result target (0 = fetch all)
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the sort mode
    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("cyber attribution")
            .year_from(2018)
            .year_to(2022)
            .limit(50)
            .sort(SortMode::Year);

        assert_eq!(request.query, "cyber attribution");
        assert_eq!(request.year_from, Some(2018));
        assert_eq!(request.year_to, Some(2022));
        assert_eq!(request.limit, 50);
        assert_eq!(request.sort, SortMode::Year);
    }

    #[test]
    fn test_default_is_relevance() {
        let request = SearchRequest::new("test");
        assert_eq!(request.sort, SortMode::Relevance);
        assert!(request.year_from.is_none());
    }
}
