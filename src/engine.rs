//! Matching engine: candidate retrieval, scoring, ranking and selection.
//!
//! The engine owns a single index slot. A call configured for a different
//! strategy than the cached one replaces it with a fresh index; every call
//! then asks the index to build over its target collection, which is a
//! no-op when that collection is already indexed. Reusing one engine across
//! calls on the same collection therefore skips the build.
//!
//! The engine is not meant to be shared between threads. Use one engine
//! per worker.
//!
//! CHANGELOG:
//! - 05/02/2026 - Result ids and display rendering
//! - 03/02/2026 - Unbuilt index degrades to an empty result
//! - 02/02/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{Config, SelectionMode};
use crate::index::{BuildOutcome, CandidateIndex, IndexError, IndexKind, IndexReuse};
use crate::preprocess::Preprocessor;
use crate::record::{is_query_id, CandidatePair, Collection, Record, LINE_ID_PREFIX};
use crate::scoring::NameScorer;

/// One scored candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id_a: String,
    pub text_a: String,
    pub id_b: String,
    pub text_b: String,
    pub score: f64,
    pub measure_name: String,
}

impl MatchResult {
    fn from_pair(pair: &CandidatePair<'_>, score: f64, measure_name: &str) -> Self {
        Self {
            id_a: pair.a.id.clone(),
            text_a: pair.a.original_text.clone(),
            id_b: pair.b.id.clone(),
            text_b: pair.b.original_text.clone(),
            score,
            measure_name: measure_name.to_string(),
        }
    }
}

/// `id:'text'` for real ids, `'text'` for generated or missing ones.
fn display_side(id: &str, text: &str) -> String {
    if id.trim().is_empty() || id.starts_with(LINE_ID_PREFIX) {
        format!("'{}'", text)
    } else {
        format!("{}:'{}'", id, text)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side_a = if is_query_id(&self.id_a) {
            format!("'{}' (Query)", self.text_a)
        } else {
            display_side(&self.id_a, &self.text_a)
        };
        write!(
            f,
            "Match: ({}, {}), Score: {:.4} ({})",
            side_a,
            display_side(&self.id_b, &self.text_b),
            self.score,
            self.measure_name
        )
    }
}

// ============================================================================
// Ranking and selection
// ============================================================================

/// Sort best first: ascending for distances, descending for similarities.
///
/// The sort is stable, so equal scores keep retrieval order.
pub fn sort_results(results: &mut [MatchResult], is_distance: bool) {
    if is_distance {
        results.sort_by(|a, b| a.score.total_cmp(&b.score));
    } else {
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
    }
}

/// Apply the configured selection policy to a sorted list.
pub fn select_results(
    mut sorted: Vec<MatchResult>,
    mode: SelectionMode,
    threshold: f64,
    max_count: i32,
    is_distance: bool,
) -> Vec<MatchResult> {
    match mode {
        SelectionMode::Threshold => {
            sorted.retain(|r| {
                if is_distance {
                    r.score <= threshold
                } else {
                    r.score >= threshold
                }
            });
            sorted
        }
        SelectionMode::TopN => {
            if max_count > 0 {
                sorted.truncate(max_count as usize);
            }
            sorted
        }
    }
}

fn score_pairs(pairs: &[CandidatePair<'_>], scorer: &NameScorer) -> Vec<MatchResult> {
    let measure = scorer.name();
    pairs
        .iter()
        .map(|pair| MatchResult::from_pair(pair, scorer.score(pair.a, pair.b), &measure))
        .collect()
}

fn rank(pairs: Result<Vec<CandidatePair<'_>>, IndexError>, config: &Config, operation: &str) -> Vec<MatchResult> {
    let pairs = match pairs {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!(operation, error = %e, "no candidates, returning an empty result");
            return Vec::new();
        }
    };

    let scorer = config.name_scorer();
    let is_distance = scorer.is_distance();
    let mut results = score_pairs(&pairs, &scorer);
    sort_results(&mut results, is_distance);
    let selected = select_results(
        results,
        config.selection_mode,
        config.threshold,
        config.max_count,
        is_distance,
    );
    debug!(
        operation,
        candidates = pairs.len(),
        selected = selected.len(),
        measure = %scorer.name(),
        "results ranked"
    );
    selected
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Default)]
pub struct MatchEngine {
    index: Option<CandidateIndex>,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy of the cached index, if any.
    pub fn active_strategy(&self) -> Option<IndexKind> {
        self.index.as_ref().map(CandidateIndex::kind)
    }

    /// Whether the cached index has been built.
    pub fn is_index_built(&self) -> bool {
        self.index.as_ref().is_some_and(CandidateIndex::is_built)
    }

    /// Drop the cached index.
    pub fn reset(&mut self) {
        if let Some(index) = self.index.as_mut() {
            index.reset();
        }
        self.index = None;
    }

    fn ensure_index(
        &mut self,
        kind: IndexKind,
        collection: &Collection,
        reuse: IndexReuse,
    ) -> (&CandidateIndex, BuildOutcome) {
        if self.active_strategy() != Some(kind) {
            if let Some(previous) = self.index.as_ref() {
                debug!(from = previous.name(), to = kind.name(), "index strategy changed");
            }
            self.index = Some(CandidateIndex::new(kind));
        }
        let index = self.index.get_or_insert_with(|| CandidateIndex::new(kind));
        let outcome = index.build(collection, reuse);
        (&*index, outcome)
    }

    /// Preprocess `query_text` the way `names` was preprocessed and search.
    pub fn search(
        &mut self,
        query_text: &str,
        names: &Collection,
        preprocessor: &Preprocessor,
        config: &Config,
    ) -> Vec<MatchResult> {
        let query = Record::query(query_text, preprocessor.preprocess(query_text));
        self.search_record(&query, names, config)
    }

    /// Search with an already preprocessed query record.
    pub fn search_record(&mut self, query: &Record, names: &Collection, config: &Config) -> Vec<MatchResult> {
        let started = Instant::now();
        let (index, outcome) = self.ensure_index(config.index_strategy, names, config.index_reuse);
        let results = rank(index.find_for_query(query, names), config, "search");
        debug!(
            strategy = index.name(),
            ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search done"
        );
        results
    }

    /// Match every record of `list_a` against the indexed `list_b`.
    pub fn compare(&mut self, list_a: &[Record], list_b: &Collection, config: &Config) -> Vec<MatchResult> {
        let started = Instant::now();
        let (index, outcome) = self.ensure_index(config.index_strategy, list_b, config.index_reuse);
        let results = rank(index.find_for_cross(list_a, list_b), config, "compare");
        debug!(
            strategy = index.name(),
            ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compare done"
        );
        results
    }

    /// Likely duplicates within one collection.
    pub fn deduplicate(&mut self, names: &Collection, config: &Config) -> Vec<MatchResult> {
        let started = Instant::now();
        let (index, outcome) = self.ensure_index(config.index_strategy, names, config.index_reuse);
        let results = rank(index.find_for_self_pairs(names), config, "dedupe");
        debug!(
            strategy = index.name(),
            ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dedupe done"
        );
        results
    }
}
