//! Unpaywall open-access lookup provider.
//!
//! Unpaywall only resolves a DOI to open-access locations; it has no search
//! endpoint, so it carries no search triple. The registry keeps it out of
//! the searchable set, and starting a search session on it fails fast.

use super::{Provider, ProviderCapabilities};

const UNPAYWALL_API_BASE: &str = "https://api.unpaywall.org/v2";

/// Unpaywall lookup-only provider
#[derive(Debug, Clone)]
pub struct UnpaywallProvider {
    email: Option<String>,
}

impl UnpaywallProvider {
    pub fn new() -> Self {
        Self {
            email: std::env::var("LITSEARCH_CONTACT_EMAIL").ok(),
        }
    }

    /// Lookup URL for one DOI
    pub fn lookup_url(&self, doi: &str) -> String {
        format!(
            "{}/{}?email={}",
            UNPAYWALL_API_BASE,
            urlencoding::encode(doi.trim()),
            urlencoding::encode(self.email.as_deref().unwrap_or("unpaywall@impactstory.org"))
        )
    }
}

impl Default for UnpaywallProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for UnpaywallProvider {
    fn id(&self) -> &str {
        "unpaywall"
    }

    fn name(&self) -> &str {
        "Unpaywall"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::DOI_LOOKUP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchRequest;
    use crate::providers::{Cursor, SearchError};

    #[test]
    fn test_not_searchable() {
        let provider = UnpaywallProvider::new();
        assert!(!provider.supports_search());
        assert!(matches!(
            provider.build_url(&SearchRequest::new("x"), 10, &Cursor::Offset(0)),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_lookup_url() {
        let provider = UnpaywallProvider {
            email: Some("a@b.org".to_string()),
        };
        assert_eq!(
            provider.lookup_url("10.1145/3526089"),
            "https://api.unpaywall.org/v2/10.1145%2F3526089?email=a%40b.org"
        );
    }
}
