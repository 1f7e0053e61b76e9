//! Name scorers: compare two records.
//!
//! Pass-through delegates to a string scorer on the original text. The
//! positional and bag-of-words scorers work on tokens and always report a
//! similarity in [0, 1], converting the wrapped scorer's distance if needed.
//!
//! CHANGELOG:
//! - 04/02/2026 - Bag-of-words greedy matching with a per-call used mask
//! - 03/02/2026 - Positional weighting renormalized over applicable components
//! - 02/02/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use super::{distance_to_similarity, StringScorer};
use crate::record::Record;

/// Name scorer choice as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NameScorerKind {
    #[default]
    PassThrough,
    PositionalWeighted,
    BagOfWords,
    Jaccard,
}

impl NameScorerKind {
    pub const ALL: [NameScorerKind; 4] = [
        NameScorerKind::PassThrough,
        NameScorerKind::PositionalWeighted,
        NameScorerKind::BagOfWords,
        NameScorerKind::Jaccard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NameScorerKind::PassThrough => "PASS_THROUGH",
            NameScorerKind::PositionalWeighted => "POSITIONAL_WEIGHTED",
            NameScorerKind::BagOfWords => "BAG_OF_WORDS",
            NameScorerKind::Jaccard => "JACCARD_TOKEN_SET",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "PASS_THROUGH" | "PASS_THROUGH_NAME" => Some(NameScorerKind::PassThrough),
            "POSITIONAL_WEIGHTED" | "POSITIONAL" => Some(NameScorerKind::PositionalWeighted),
            "BAG_OF_WORDS" => Some(NameScorerKind::BagOfWords),
            "JACCARD" | "JACCARD_TOKEN_SET" => Some(NameScorerKind::Jaccard),
            _ => None,
        }
    }

    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(choice = name, fallback = fallback.name(), "unknown name scorer, using default");
            fallback
        })
    }
}

impl From<String> for NameScorerKind {
    fn from(name: String) -> Self {
        Self::parse_or_default(&name)
    }
}

impl From<NameScorerKind> for String {
    fn from(kind: NameScorerKind) -> Self {
        kind.name().to_string()
    }
}

/// Weights of the first / last / middle name components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionalWeights {
    pub first: f64,
    pub last: f64,
    pub middle: f64,
}

impl Default for PositionalWeights {
    fn default() -> Self {
        Self {
            first: 0.4,
            last: 0.5,
            middle: 0.1,
        }
    }
}

/// A ready-to-use name scorer.
#[derive(Debug, Clone, PartialEq)]
pub enum NameScorer {
    PassThrough(StringScorer),
    PositionalWeighted {
        scorer: StringScorer,
        weights: PositionalWeights,
    },
    BagOfWords {
        scorer: StringScorer,
        token_threshold: f64,
    },
    Jaccard,
}

impl NameScorer {
    pub fn new(
        kind: NameScorerKind,
        scorer: StringScorer,
        weights: PositionalWeights,
        token_threshold: f64,
    ) -> Self {
        match kind {
            NameScorerKind::PassThrough => NameScorer::PassThrough(scorer),
            NameScorerKind::PositionalWeighted => NameScorer::PositionalWeighted { scorer, weights },
            NameScorerKind::BagOfWords => NameScorer::BagOfWords {
                scorer,
                token_threshold,
            },
            NameScorerKind::Jaccard => NameScorer::Jaccard,
        }
    }

    pub fn score(&self, a: &Record, b: &Record) -> f64 {
        match self {
            NameScorer::PassThrough(scorer) => scorer.score(&a.original_text, &b.original_text),
            NameScorer::PositionalWeighted { scorer, weights } => {
                positional_score(*scorer, weights, &a.tokens, &b.tokens)
            }
            NameScorer::BagOfWords {
                scorer,
                token_threshold,
            } => bag_of_words_score(*scorer, *token_threshold, &a.tokens, &b.tokens),
            NameScorer::Jaccard => jaccard_score(&a.tokens, &b.tokens),
        }
    }

    /// Only pass-through can report a distance, inherited from its scorer.
    pub fn is_distance(&self) -> bool {
        match self {
            NameScorer::PassThrough(scorer) => scorer.is_distance(),
            _ => false,
        }
    }

    pub fn kind(&self) -> NameScorerKind {
        match self {
            NameScorer::PassThrough(_) => NameScorerKind::PassThrough,
            NameScorer::PositionalWeighted { .. } => NameScorerKind::PositionalWeighted,
            NameScorer::BagOfWords { .. } => NameScorerKind::BagOfWords,
            NameScorer::Jaccard => NameScorerKind::Jaccard,
        }
    }

    /// Measure label attached to results, e.g. `BAG_OF_WORDS(LEVENSHTEIN)`.
    pub fn name(&self) -> String {
        match self {
            NameScorer::PassThrough(scorer)
            | NameScorer::PositionalWeighted { scorer, .. }
            | NameScorer::BagOfWords { scorer, .. } => {
                format!("{}({})", self.kind().name(), scorer.name())
            }
            NameScorer::Jaccard => self.kind().name().to_string(),
        }
    }
}

/// Similarity in [0, 1] between two name components.
fn component_similarity(scorer: StringScorer, a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let raw = scorer.score(a, b);
    if scorer.is_distance() {
        distance_to_similarity(raw, a.chars().count(), b.chars().count())
    } else {
        raw
    }
}

/// Tokens between the first and the last, joined by a space.
fn middle(tokens: &[String]) -> String {
    if tokens.len() > 2 {
        tokens[1..tokens.len() - 1].join(" ")
    } else {
        String::new()
    }
}

fn positional_score(
    scorer: StringScorer,
    weights: &PositionalWeights,
    a: &[String],
    b: &[String],
) -> f64 {
    let sim = |x: &str, y: &str| component_similarity(scorer, x, y);

    match (a, b) {
        ([], []) => 1.0,
        ([], _) | (_, []) => 0.0,
        ([only_a], [only_b]) => sim(only_a, only_b),
        ([single], [first, .., last]) | ([first, .., last], [single]) => {
            sim(single, first).max(sim(single, last))
        }
        ([first_a, .., last_a], [first_b, .., last_b]) => {
            let mut combined = weights.first * sim(first_a, first_b) + weights.last * sim(last_a, last_b);
            let mut total = weights.first + weights.last;

            let (middle_a, middle_b) = (middle(a), middle(b));
            if !middle_a.is_empty() && !middle_b.is_empty() {
                combined += weights.middle * sim(&middle_a, &middle_b);
                total += weights.middle;
            }

            if total > 0.0 {
                (combined / total).clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
    }
}

fn bag_of_words_score(scorer: StringScorer, token_threshold: f64, a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }

    let distance = scorer.is_distance();
    let mut used = vec![false; b.len()];
    let mut matches = 0usize;

    for token_a in a {
        let mut best: Option<(usize, f64)> = None;
        for (j, token_b) in b.iter().enumerate() {
            if used[j] {
                continue;
            }
            let score = scorer.score(token_a, token_b);
            let better = match best {
                None => true,
                Some((_, best_score)) if distance => score < best_score,
                Some((_, best_score)) => score > best_score,
            };
            if better {
                best = Some((j, score));
            }
        }

        let Some((j, score)) = best else {
            continue;
        };
        let similarity = if distance {
            distance_to_similarity(score, token_a.chars().count(), b[j].chars().count())
        } else {
            score
        };
        if similarity >= token_threshold {
            matches += 1;
            used[j] = true;
        }
    }

    (2 * matches) as f64 / (a.len() + b.len()) as f64
}

fn jaccard_score(a: &[String], b: &[String]) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}
