//! Registry for managing metadata provider plugins.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    CrossrefProvider, OpenAlexProvider, Provider, ScopusProvider, SemanticScholarProvider,
    UnpaywallProvider, WosProvider,
};
use crate::config::Config;

bitflags::bitflags! {
    /// Capabilities that a provider can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProviderCapabilities: u32 {
        const SEARCH = 1 << 0;
        const DOI_LOOKUP = 1 << 1;
    }
}

/// Registry for all available metadata providers.
///
/// Providers are kept in registration order; the combined-source search
/// walks them in exactly that order, independent of response latency.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    order: Vec<String>,
}

impl ProviderRegistry {
    /// Create a registry with all providers, wired from configuration
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            order: Vec::new(),
        };

        let crossref = match &config.contact_email {
            Some(email) => CrossrefProvider::with_mailto(email.clone()),
            None => CrossrefProvider::new(),
        };
        let openalex = match &config.contact_email {
            Some(email) => OpenAlexProvider::with_mailto(email.clone()),
            None => OpenAlexProvider::new(),
        };
        let semantic = match &config.api_keys.semantic_scholar {
            Some(key) => SemanticScholarProvider::with_api_key(key.clone()),
            None => SemanticScholarProvider::new(),
        };
        let scopus = match &config.api_keys.scopus {
            Some(key) => ScopusProvider::with_api_key(key.clone()),
            None => ScopusProvider::new(),
        };
        let wos = match &config.api_keys.wos {
            Some(key) => WosProvider::with_api_key(key.clone()),
            None => WosProvider::new(),
        };

        registry.register(Arc::new(crossref));
        registry.register(Arc::new(openalex));
        registry.register(Arc::new(semantic));
        registry.register(Arc::new(scopus));
        registry.register(Arc::new(wos));
        registry.register(Arc::new(UnpaywallProvider::new()));

        registry
    }

    /// Create a registry with default configuration (environment variables)
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create an empty registry (useful for tests with custom providers)
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a provider. Re-registering an id replaces the provider but
    /// keeps its original position.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let id = provider.id().to_string();
        if self.providers.insert(id.clone(), provider).is_none() {
            self.order.push(id);
        }
    }

    /// Get a provider by id
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(id)
    }

    /// Get a provider by id, or a [`super::SearchError::Config`] naming the
    /// unknown id
    pub fn get_required(&self, id: &str) -> Result<Arc<dyn Provider>, super::SearchError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| super::SearchError::Config(id.to_string()))
    }

    /// All providers in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.order.iter().filter_map(|id| self.providers.get(id))
    }

    /// All provider ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Providers that support a specific capability, in registration order
    pub fn with_capability(&self, capability: ProviderCapabilities) -> Vec<&Arc<dyn Provider>> {
        self.all()
            .filter(|p| p.capabilities().contains(capability))
            .collect()
    }

    /// Providers with a complete search configuration. These are the only
    /// providers offered for search; the rest fail fast when invoked.
    pub fn searchable(&self) -> Vec<&Arc<dyn Provider>> {
        self.with_capability(ProviderCapabilities::SEARCH)
    }

    /// Check if a provider exists
    pub fn has(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_basic() {
        let registry = ProviderRegistry::new();

        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_all_providers_registered() {
        let registry = ProviderRegistry::new();

        for id in ["crossref", "openalex", "semantic", "scopus", "wos", "unpaywall"] {
            assert!(registry.has(id), "provider '{}' should be registered", id);
        }
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registration_order_is_stable() {
        let registry = ProviderRegistry::new();

        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(
            ids,
            vec!["crossref", "openalex", "semantic", "scopus", "wos", "unpaywall"]
        );
    }

    #[test]
    fn test_searchable_excludes_lookup_only() {
        let registry = ProviderRegistry::new();

        let searchable: Vec<&str> = registry.searchable().iter().map(|p| p.id()).collect();
        assert_eq!(
            searchable,
            vec!["crossref", "openalex", "semantic", "scopus", "wos"]
        );
        assert!(!searchable.contains(&"unpaywall"));
    }

    #[test]
    fn test_reregistering_keeps_position() {
        let mut registry = ProviderRegistry::new();
        registry.register(std::sync::Arc::new(CrossrefProvider::new()));

        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids[0], "crossref");
        assert_eq!(registry.len(), 6);
    }
}
