//! Shared plumbing: HTTP transport and record merging.

pub mod http;
pub mod merge;

pub use http::{HttpTransport, Transport};
pub use merge::{dedup_key, merge_records, normalize_doi, normalize_title};
