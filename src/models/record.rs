//! Canonical bibliographic record shared by all providers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bibliographic work as normalized from one provider response.
///
/// Fixed fields are always present; unknown values are the empty string
/// (or 0 for `year`). Provider-specific data that has no fixed slot goes
/// into the open `extra` map, so a provider can attach any additional key
/// without changing this shape.
///
/// Records are never mutated after merging; the merger always produces a
/// new record from its inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Work title
    pub title: String,

    /// Authors as a display string (semicolon-separated)
    pub authors: String,

    /// Publication year (0 = unknown)
    pub year: i32,

    /// Journal / conference / container name
    pub venue: String,

    /// Digital Object Identifier
    pub doi: String,

    /// Landing page URL
    pub url: String,

    /// Abstract text
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Provider(s) this record was seen from. After merging this becomes a
    /// sorted, comma-joined list of every contributing provider.
    pub source: String,

    /// Provider-native identifier
    pub external_id: String,

    /// Direct PDF URL, when the provider exposes one
    pub pdf_url: String,

    /// Open-access status (provider vocabulary, e.g. "gold", "green")
    pub oa_status: String,

    /// Open provider-specific metadata (citation counts, concepts, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Create a record with the required identity fields
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    /// Returns the author names as a vector
    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Check if the record carries a direct PDF link
    pub fn has_pdf(&self) -> bool {
        !self.pdf_url.is_empty()
    }

    /// The providers this record was seen from
    pub fn source_list(&self) -> Vec<&str> {
        self.source
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Builder for constructing [`Record`]s
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new builder with the required identity fields
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            record: Record::new(external_id, title, source),
        }
    }

    /// Set authors
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.record.authors = authors.into();
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.record.year = year;
        self
    }

    /// Set venue
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.record.venue = venue.into();
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.doi = doi.into();
        self
    }

    /// Set landing page URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.record.url = url.into();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.record.abstract_text = text.into();
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: impl Into<String>) -> Self {
        self.record.pdf_url = url.into();
        self
    }

    /// Set open-access status
    pub fn oa_status(mut self, status: impl Into<String>) -> Self {
        self.record.oa_status = status.into();
        self
    }

    /// Add a provider-specific extension field
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.record.extra.insert(key.into(), value);
        self
    }

    /// Build the record
    pub fn build(self) -> Record {
        self.record
    }
}
