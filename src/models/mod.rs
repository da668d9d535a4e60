//! Core data models for bibliographic records and search requests.

mod record;
mod search;

pub use record::{Record, RecordBuilder};
pub use search::{SearchRequest, SortMode};
