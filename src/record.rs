//! Name records and the collections they are indexed in.
//!
//! A `Collection` carries an opaque handle minted at construction. Index
//! strategies use the handle (not the contents) to decide whether the
//! collection they are asked about is the one they last indexed.
//!
//! CHANGELOG:
//! - 03/02/2026 - Content fingerprint for the CONTENT reuse policy
//! - 02/02/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Prefix of ids given to preprocessed query names.
pub const QUERY_ID_PREFIX: &str = "QUERY_";

/// Prefix of ids generated from line numbers when the input had none.
pub const LINE_ID_PREFIX: &str = "L_";

/// Whether `id` was given to a query by [`Record::query`].
pub fn is_query_id(id: &str) -> bool {
    id.starts_with(QUERY_ID_PREFIX)
}

/// One normalized input name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub original_text: String,
    pub tokens: Vec<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, original_text: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            id: id.into(),
            original_text: original_text.into(),
            tokens,
        }
    }

    /// Build the record used for a search query.
    pub fn query(original_text: &str, tokens: Vec<String>) -> Self {
        Self::new(format!("{}{}", QUERY_ID_PREFIX, original_text), original_text, tokens)
    }

    pub fn is_query(&self) -> bool {
        is_query_id(&self.id)
    }

    /// Last token, lower-cased. `None` when there is no usable token.
    pub fn last_token_key(&self) -> Option<String> {
        self.tokens
            .last()
            .map(|t| t.trim().to_lowercase())
            .filter(|k| !k.is_empty())
    }

    /// All tokens joined by a space, lower-cased. `None` when empty.
    pub fn full_key(&self) -> Option<String> {
        if self.tokens.is_empty() {
            return None;
        }
        let key = self.tokens.join(" ").to_lowercase();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

/// Opaque identity of a collection instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(u64);

impl CollectionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable list of records plus its identity handle.
///
/// Cloning shares both the storage and the handle. Building a new
/// collection from equal records yields a different handle.
#[derive(Debug, Clone)]
pub struct Collection {
    id: CollectionId,
    records: Arc<[Record]>,
}

impl Collection {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            id: CollectionId::next(),
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Hash of ids and tokens, independent of the handle.
    pub fn content_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.records.len().hash(&mut hasher);
        for record in self.records.iter() {
            record.id.hash(&mut hasher);
            record.tokens.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl Deref for Collection {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        &self.records
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// Two records proposed as plausibly the same entity.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a> {
    pub a: &'a Record,
    pub b: &'a Record,
}

impl<'a> CandidatePair<'a> {
    pub fn new(a: &'a Record, b: &'a Record) -> Self {
        Self { a, b }
    }

    /// Ids of both sides, handy for assertions and logging.
    pub fn ids(&self) -> (&'a str, &'a str) {
        (self.a.id.as_str(), self.b.id.as_str())
    }
}

#[cfg(test)]
pub(crate) fn rec(id: &str, text: &str) -> Record {
    Record::new(
        id,
        text,
        text.split_whitespace().map(|t| t.to_lowercase()).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        let r = rec("1", "John Michael SMITH");
        assert_eq!(r.last_token_key().as_deref(), Some("smith"));
        assert_eq!(r.full_key().as_deref(), Some("john michael smith"));

        let empty = Record::new("2", "", vec![]);
        assert_eq!(empty.last_token_key(), None);
        assert_eq!(empty.full_key(), None);
    }

    #[test]
    fn test_clone_shares_identity() {
        let c = Collection::new(vec![rec("1", "john smith")]);
        let shared = c.clone();
        assert_eq!(c.id(), shared.id());
    }

    #[test]
    fn test_equal_content_gets_new_identity() {
        let a = Collection::new(vec![rec("1", "john smith")]);
        let b = Collection::new(vec![rec("1", "john smith")]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.content_fingerprint(), b.content_fingerprint());
    }

    #[test]
    fn test_query_record() {
        let q = Record::query("Jon Smith", vec!["jon".into(), "smith".into()]);
        assert!(q.is_query());
        assert_eq!(q.id, "QUERY_Jon Smith");
    }
}
