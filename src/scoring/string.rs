//! String scorers: compare two raw strings.
//!
//! CHANGELOG:
//! - 03/02/2026 - Optional-input scoring with per-scorer absent semantics
//! - 02/02/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use tracing::warn;

use super::keyboard;
use super::ScoreError;

/// Scorers that operate on two plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StringScorer {
    /// 1.0 when equal, else 0.0.
    #[default]
    Exact,
    /// Case-insensitive unit-cost edit distance.
    Levenshtein,
    /// Edit distance with QWERTY-adjacency substitution costs.
    Keyboard,
    /// Jaro-Winkler similarity (strsim).
    JaroWinkler,
}

impl StringScorer {
    pub const ALL: [StringScorer; 4] = [
        StringScorer::Exact,
        StringScorer::Levenshtein,
        StringScorer::Keyboard,
        StringScorer::JaroWinkler,
    ];

    /// Score two present strings.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            StringScorer::Exact => {
                if a == b {
                    1.0
                } else {
                    0.0
                }
            }
            StringScorer::Levenshtein => levenshtein(a, b) as f64,
            StringScorer::Keyboard => keyboard::keyboard_distance(a, b),
            StringScorer::JaroWinkler => jaro_winkler(a, b),
        }
    }

    /// Score inputs that may be absent.
    ///
    /// Exact treats two absent values as equal. The edit distances return the
    /// length of the present side. Jaro-Winkler refuses absent input.
    pub fn score_optional(&self, a: Option<&str>, b: Option<&str>) -> Result<f64, ScoreError> {
        match (a, b) {
            (Some(a), Some(b)) => Ok(self.score(a, b)),
            (None, None) => match self {
                StringScorer::Exact => Ok(1.0),
                StringScorer::Levenshtein | StringScorer::Keyboard => Ok(0.0),
                StringScorer::JaroWinkler => Err(ScoreError::MissingInput { scorer: self.name() }),
            },
            (Some(present), None) | (None, Some(present)) => match self {
                StringScorer::Exact => Ok(0.0),
                StringScorer::Levenshtein => Ok(present.chars().count() as f64),
                StringScorer::Keyboard => {
                    Ok(present.chars().count() as f64 * keyboard::INSERT_DELETE_COST)
                }
                StringScorer::JaroWinkler => Err(ScoreError::MissingInput { scorer: self.name() }),
            },
        }
    }

    /// Lower is better when true.
    pub fn is_distance(&self) -> bool {
        matches!(self, StringScorer::Levenshtein | StringScorer::Keyboard)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StringScorer::Exact => "EXACT",
            StringScorer::Levenshtein => "LEVENSHTEIN",
            StringScorer::Keyboard => "KEYBOARD_DISTANCE",
            StringScorer::JaroWinkler => "JARO_WINKLER",
        }
    }

    /// Parse a scorer name (case-insensitive, a few legacy aliases accepted).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "EXACT" | "EXACT_STRING" => Some(StringScorer::Exact),
            "LEVENSHTEIN" => Some(StringScorer::Levenshtein),
            "KEYBOARD" | "KEYBOARD_DISTANCE" => Some(StringScorer::Keyboard),
            "JARO_WINKLER" | "JAROWINKLER" => Some(StringScorer::JaroWinkler),
            _ => None,
        }
    }

    /// Parse, falling back to the default scorer on unknown names.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(choice = name, fallback = fallback.name(), "unknown string scorer, using default");
            fallback
        })
    }
}

impl From<String> for StringScorer {
    fn from(name: String) -> Self {
        Self::parse_or_default(&name)
    }
}

impl From<StringScorer> for String {
    fn from(scorer: StringScorer) -> Self {
        scorer.name().to_string()
    }
}

/// Levenshtein distance after lower-casing both sides.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[m][n]
}
