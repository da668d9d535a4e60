//! Deduplication and field-level merging of records across providers.
//!
//! Records describing the same work are grouped under a dedup key (DOI
//! first, then normalized title plus year, then provider identity) and
//! folded into one record per group. The fold is commutative and
//! idempotent: merging in any order, or merging a record with itself,
//! yields the same result.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::Record;

fn doi_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://(dx\.)?doi\.org/").expect("valid regex literal"))
}

/// Normalize a DOI to its bare, lowercase form.
///
/// Strips the resolver prefix (`https://doi.org/`, `http://dx.doi.org/`),
/// trims whitespace and lowercases, so the same work cited with different
/// resolver styles keys identically.
pub fn normalize_doi(doi: &str) -> String {
    let trimmed = doi.trim();
    doi_prefix_re().replace(trimmed, "").to_lowercase()
}

/// Normalize a title for dedup keying: lowercase, alphanumerics only,
/// single spaces.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_space = true;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// The grouping key for one record.
///
/// Priority: DOI, then normalized title plus year, then provider-native
/// identity. `index` backs the last-resort key for records with no usable
/// identity at all, so they pass through unmerged.
pub fn dedup_key(record: &Record, index: usize) -> String {
    let doi = normalize_doi(&record.doi);
    if !doi.is_empty() {
        return format!("doi:{}", doi);
    }

    let title = normalize_title(&record.title);
    if !title.is_empty() {
        return format!("title:{}|{}", title, record.year);
    }

    if !record.external_id.is_empty() {
        return format!("id:{}:{}", record.source, record.external_id);
    }

    format!("row:{}", index)
}

/// Deduplicate and merge a batch of records, preserving first-seen order
/// of the groups.
pub fn merge_records(records: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, mut record) in records.into_iter().enumerate() {
        record.doi = normalize_doi(&record.doi);

        let key = dedup_key(&record, index);
        match positions.get(&key) {
            Some(&pos) => {
                let existing = std::mem::take(&mut merged[pos]);
                merged[pos] = merge_pair(existing, record);
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// Merge two records describing the same work into one.
///
/// String fields: the richer (longer, after trimming) value wins; on equal
/// length the lexicographically smaller one, which makes the merge
/// commutative. Year: larger known value. Sources: sorted union. Extra
/// maps: recursive value merge.
pub fn merge_pair(a: Record, b: Record) -> Record {
    Record {
        title: pick_string(a.title, b.title),
        authors: pick_string(a.authors, b.authors),
        year: a.year.max(b.year),
        venue: pick_string(a.venue, b.venue),
        doi: pick_string(a.doi, b.doi),
        url: pick_string(a.url, b.url),
        abstract_text: pick_string(a.abstract_text, b.abstract_text),
        source: merge_sources(&a.source, &b.source),
        external_id: pick_string(a.external_id, b.external_id),
        pdf_url: pick_string(a.pdf_url, b.pdf_url),
        oa_status: pick_string(a.oa_status, b.oa_status),
        extra: merge_extra(a.extra, b.extra),
    }
}

fn pick_string(a: String, b: String) -> String {
    let a = a.trim().to_string();
    let b = b.trim().to_string();
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if a <= b {
                a
            } else {
                b
            }
        }
    }
}

fn merge_sources(a: &str, b: &str) -> String {
    let set: BTreeSet<&str> = a
        .split(',')
        .chain(b.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    set.into_iter().collect::<Vec<_>>().join(",")
}

fn merge_extra(a: BTreeMap<String, Value>, mut b: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for (key, value_a) in a {
        match b.remove(&key) {
            Some(value_b) => {
                out.insert(key, merge_value(value_a, value_b));
            }
            None => {
                out.insert(key, value_a);
            }
        }
    }
    out.extend(b);
    out
}

/// Merge two JSON values of the same key.
///
/// Objects merge recursively, arrays union on canonical serialization,
/// numbers take the maximum, strings follow the richer-value rule. Nulls
/// always lose.
fn merge_value(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Null, other) | (other, Value::Null) => other,
        (Value::Object(map_a), Value::Object(map_b)) => {
            let a: BTreeMap<String, Value> = map_a.into_iter().collect();
            let b: BTreeMap<String, Value> = map_b.into_iter().collect();
            Value::Object(merge_extra(a, b).into_iter().collect())
        }
        (Value::Array(items_a), Value::Array(items_b)) => {
            let mut seen: BTreeSet<String> = BTreeSet::new();
            let mut out = Vec::new();
            for item in items_a.into_iter().chain(items_b) {
                let signature = item.to_string();
                if seen.insert(signature) {
                    out.push(item);
                }
            }
            Value::Array(out)
        }
        (Value::Number(num_a), Value::Number(num_b)) => {
            let fa = num_a.as_f64().unwrap_or(f64::MIN);
            let fb = num_b.as_f64().unwrap_or(f64::MIN);
            if fa >= fb {
                Value::Number(num_a)
            } else {
                Value::Number(num_b)
            }
        }
        (Value::String(str_a), Value::String(str_b)) => Value::String(pick_string(str_a, str_b)),
        // Mismatched types (or booleans): keep the value with the smaller
        // canonical serialization, so the result is order-independent.
        (a, b) => {
            if a.to_string() <= b.to_string() {
                a
            } else {
                b
            }
        }
    }
}
