//! Candidate index strategies.
//!
//! Each strategy ingests one collection and answers "which records of it are
//! plausibly similar to X" without scoring every pair. The strategies are a
//! closed set ([`CandidateIndex`]) dispatched by `match`.
//!
//! Lifecycle: created empty, populated by [`CandidateIndex::build`], queried
//! any number of times, cleared by [`CandidateIndex::reset`]. Building again
//! with the collection already indexed is a no-op.
//!
//! CHANGELOG:
//! - 05/02/2026 - Content-fingerprint reuse policy
//! - 04/02/2026 - Prefix tree strategy
//! - 02/02/2026 - Initial module structure

pub mod bucket;
pub mod cartesian;
pub mod ordered;
pub mod trie;

pub use bucket::BucketIndex;
pub use cartesian::CartesianIndex;
pub use ordered::OrderedIndex;
pub use trie::TrieIndex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::record::{CandidatePair, Collection, Record};

/// Errors raised when candidates are requested from an index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("{strategy} index has not been built")]
    NotBuilt { strategy: &'static str },
}

/// How `build` decides that a collection is already indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndexReuse {
    /// Same collection handle. Equal but separately built collections miss.
    #[default]
    Handle,
    /// Same ids and tokens, whatever the handle.
    Content,
}

impl IndexReuse {
    pub fn name(&self) -> &'static str {
        match self {
            IndexReuse::Handle => "HANDLE",
            IndexReuse::Content => "CONTENT",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "HANDLE" => Some(IndexReuse::Handle),
            "CONTENT" => Some(IndexReuse::Content),
            _ => None,
        }
    }

    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(choice = name, fallback = fallback.name(), "unknown index reuse policy, using default");
            fallback
        })
    }
}

impl From<String> for IndexReuse {
    fn from(name: String) -> Self {
        Self::parse_or_default(&name)
    }
}

impl From<IndexReuse> for String {
    fn from(reuse: IndexReuse) -> Self {
        reuse.name().to_string()
    }
}

/// Result of a `build` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    Reused,
}

/// Index strategy choice as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndexKind {
    /// Full cross product, no real index.
    #[default]
    Full,
    /// Hash buckets keyed by the lower-cased last token.
    BucketLastToken,
    /// Ordered map keyed by the full lower-cased token string.
    OrderedFullKey,
    /// Prefix tree over the full lower-cased token string.
    PrefixTree,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Full,
        IndexKind::BucketLastToken,
        IndexKind::OrderedFullKey,
        IndexKind::PrefixTree,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::Full => "FULL",
            IndexKind::BucketLastToken => "BUCKET_LAST_TOKEN",
            IndexKind::OrderedFullKey => "ORDERED_FULL_KEY",
            IndexKind::PrefixTree => "PREFIX_TREE",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "FULL" | "CARTESIAN" | "CARTESIAN_FIND_ALL" | "FIND_ALL" => Some(IndexKind::Full),
            "BUCKET_LAST_TOKEN" | "DICTIONARY" | "DICTIONARY_LAST_TOKEN" => {
                Some(IndexKind::BucketLastToken)
            }
            "ORDERED_FULL_KEY" | "RED_BLACK_TREE" | "RBTREE" => Some(IndexKind::OrderedFullKey),
            "PREFIX_TREE" | "TRIE" | "TRIE_FINDER" => Some(IndexKind::PrefixTree),
            _ => None,
        }
    }

    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(choice = name, fallback = fallback.name(), "unknown index strategy, using default");
            fallback
        })
    }
}

impl From<String> for IndexKind {
    fn from(name: String) -> Self {
        Self::parse_or_default(&name)
    }
}

impl From<IndexKind> for String {
    fn from(kind: IndexKind) -> Self {
        kind.name().to_string()
    }
}

/// The collection an index was built from, retained so that retrieval can
/// keep answering from it even when handed a different collection.
#[derive(Debug, Default)]
pub(crate) struct IndexedSource {
    collection: Option<Collection>,
    fingerprint: u64,
    reuse: IndexReuse,
}

impl IndexedSource {
    pub(crate) fn is_same(&self, other: &Collection, reuse: IndexReuse) -> bool {
        match (&self.collection, reuse) {
            (None, _) => false,
            (Some(current), IndexReuse::Handle) => current.id() == other.id(),
            (Some(current), IndexReuse::Content) => {
                current.id() == other.id() || self.fingerprint == other.content_fingerprint()
            }
        }
    }

    pub(crate) fn set(&mut self, collection: &Collection, reuse: IndexReuse) {
        self.fingerprint = match reuse {
            IndexReuse::Handle => 0,
            IndexReuse::Content => collection.content_fingerprint(),
        };
        self.reuse = reuse;
        self.collection = Some(collection.clone());
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// The retained collection, or `NotBuilt`.
    ///
    /// Logs a warning when `supplied` is not the indexed collection; the
    /// retained one is still used.
    pub(crate) fn checked(
        &self,
        supplied: &Collection,
        strategy: &'static str,
        operation: &str,
    ) -> Result<&Collection, IndexError> {
        let Some(retained) = self.collection.as_ref() else {
            warn!(strategy, operation, "candidates requested before the index was built");
            return Err(IndexError::NotBuilt { strategy });
        };
        if !self.is_same(supplied, self.reuse) {
            warn!(
                strategy,
                operation,
                indexed = %retained.id(),
                supplied = %supplied.id(),
                "collection differs from the indexed one, answering from the retained index"
            );
        }
        Ok(retained)
    }

    pub(crate) fn is_built(&self) -> bool {
        self.collection.is_some()
    }
}

/// Emit every `i < j` pair of `positions` against `records`.
pub(crate) fn push_pairs_within<'a>(
    positions: &[usize],
    records: &'a [Record],
    out: &mut Vec<CandidatePair<'a>>,
) {
    for (i, &first) in positions.iter().enumerate() {
        for &second in &positions[i + 1..] {
            if let (Some(a), Some(b)) = (records.get(first), records.get(second)) {
                out.push(CandidatePair::new(a, b));
            }
        }
    }
}

/// One of the four candidate strategies.
#[derive(Debug)]
pub enum CandidateIndex {
    Full(CartesianIndex),
    BucketLastToken(BucketIndex),
    OrderedFullKey(OrderedIndex),
    PrefixTree(TrieIndex),
}

impl CandidateIndex {
    pub fn new(kind: IndexKind) -> Self {
        match kind {
            IndexKind::Full => CandidateIndex::Full(CartesianIndex::default()),
            IndexKind::BucketLastToken => CandidateIndex::BucketLastToken(BucketIndex::default()),
            IndexKind::OrderedFullKey => CandidateIndex::OrderedFullKey(OrderedIndex::default()),
            IndexKind::PrefixTree => CandidateIndex::PrefixTree(TrieIndex::default()),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            CandidateIndex::Full(_) => IndexKind::Full,
            CandidateIndex::BucketLastToken(_) => IndexKind::BucketLastToken,
            CandidateIndex::OrderedFullKey(_) => IndexKind::OrderedFullKey,
            CandidateIndex::PrefixTree(_) => IndexKind::PrefixTree,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Index `collection`, unless it is already the indexed one.
    pub fn build(&mut self, collection: &Collection, reuse: IndexReuse) -> BuildOutcome {
        let already = match self {
            CandidateIndex::Full(index) => index.source().is_same(collection, reuse),
            CandidateIndex::BucketLastToken(index) => index.source().is_same(collection, reuse),
            CandidateIndex::OrderedFullKey(index) => index.source().is_same(collection, reuse),
            CandidateIndex::PrefixTree(index) => index.source().is_same(collection, reuse),
        };
        if already {
            debug!(strategy = self.name(), collection = %collection.id(), "index reused");
            return BuildOutcome::Reused;
        }

        self.reset();
        match self {
            CandidateIndex::Full(index) => index.build(collection, reuse),
            CandidateIndex::BucketLastToken(index) => index.build(collection, reuse),
            CandidateIndex::OrderedFullKey(index) => index.build(collection, reuse),
            CandidateIndex::PrefixTree(index) => index.build(collection, reuse),
        }
        debug!(
            strategy = self.name(),
            collection = %collection.id(),
            records = collection.len(),
            "index built"
        );
        BuildOutcome::Built
    }

    /// Pairs `(query, candidate)` for a single query record.
    pub fn find_for_query<'a>(
        &'a self,
        query: &'a Record,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        match self {
            CandidateIndex::Full(index) => index.find_for_query(query, collection),
            CandidateIndex::BucketLastToken(index) => index.find_for_query(query, collection),
            CandidateIndex::OrderedFullKey(index) => index.find_for_query(query, collection),
            CandidateIndex::PrefixTree(index) => index.find_for_query(query, collection),
        }
    }

    /// Pairs `(item of list_a, candidate of indexed_b)`.
    pub fn find_for_cross<'a>(
        &'a self,
        list_a: &'a [Record],
        indexed_b: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        match self {
            CandidateIndex::Full(index) => index.find_for_cross(list_a, indexed_b),
            CandidateIndex::BucketLastToken(index) => index.find_for_cross(list_a, indexed_b),
            CandidateIndex::OrderedFullKey(index) => index.find_for_cross(list_a, indexed_b),
            CandidateIndex::PrefixTree(index) => index.find_for_cross(list_a, indexed_b),
        }
    }

    /// Unordered pairs `(i, j)`, `i < j`, within the indexed collection.
    pub fn find_for_self_pairs<'a>(
        &'a self,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        match self {
            CandidateIndex::Full(index) => index.find_for_self_pairs(collection),
            CandidateIndex::BucketLastToken(index) => index.find_for_self_pairs(collection),
            CandidateIndex::OrderedFullKey(index) => index.find_for_self_pairs(collection),
            CandidateIndex::PrefixTree(index) => index.find_for_self_pairs(collection),
        }
    }

    pub fn reset(&mut self) {
        match self {
            CandidateIndex::Full(index) => index.reset(),
            CandidateIndex::BucketLastToken(index) => index.reset(),
            CandidateIndex::OrderedFullKey(index) => index.reset(),
            CandidateIndex::PrefixTree(index) => index.reset(),
        }
    }

    pub fn is_built(&self) -> bool {
        match self {
            CandidateIndex::Full(index) => index.source().is_built(),
            CandidateIndex::BucketLastToken(index) => index.source().is_built(),
            CandidateIndex::OrderedFullKey(index) => index.source().is_built(),
            CandidateIndex::PrefixTree(index) => index.source().is_built(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample() -> Collection {
    use crate::record::rec;
    Collection::new(vec![
        rec("L_1", "john smith"),
        rec("L_2", "jane smith"),
        rec("L_3", "peter jones"),
        rec("L_4", "john smith"),
        rec("L_5", "john smithson"),
        rec("L_6", "mary jones"),
    ])
}

#[cfg(test)]
pub(crate) fn id_pairs(pairs: &[CandidatePair<'_>]) -> Vec<(String, String)> {
    let mut ids: Vec<(String, String)> = pairs
        .iter()
        .map(|p| (p.a.id.clone(), p.b.id.clone()))
        .collect();
    ids.sort();
    ids
}
