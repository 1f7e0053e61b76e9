//! Scoring strategies: string scorers and name scorers.
//!
//! Every scorer reports whether its raw output is a distance (lower is
//! better) or a similarity (higher is better). Name scorers that wrap a
//! distance-based string scorer convert it to a [0, 1] similarity with
//! [`distance_to_similarity`].
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial module structure

pub mod keyboard;
pub mod name;
pub mod string;

pub use name::{NameScorer, NameScorerKind, PositionalWeights};
pub use string::StringScorer;

use thiserror::Error;

/// Errors raised by scorers that refuse absent input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("{scorer} requires both inputs to be present")]
    MissingInput { scorer: &'static str },
}

/// Convert a distance into a similarity in [0, 1].
///
/// `max(0, 1 - distance / max(len_a, len_b))`, or 1.0 when both lengths are 0.
pub fn distance_to_similarity(distance: f64, len_a: usize, len_b: usize) -> f64 {
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    (1.0 - distance / max_len as f64).max(0.0)
}

#[cfg(test)]
pub(crate) fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_similarity() {
        assert!(approx(distance_to_similarity(0.0, 5, 5), 1.0));
        assert!(approx(distance_to_similarity(1.0, 4, 5), 0.8));
        assert!(approx(distance_to_similarity(10.0, 2, 3), 0.0));
        assert!(approx(distance_to_similarity(0.0, 0, 0), 1.0));
    }
}
