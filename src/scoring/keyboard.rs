//! Keyboard-aware edit distance.
//!
//! Same recurrence as Levenshtein, but substituting a key with one of its
//! QWERTY neighbours is cheaper than an arbitrary substitution.

/// Lower-case QWERTY rows; column = index within the row.
const KEY_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

pub const ADJACENT_COST: f64 = 0.5;
pub const DIAGONAL_COST: f64 = 0.75;
pub const SUBSTITUTION_COST: f64 = 1.0;
pub const INSERT_DELETE_COST: f64 = 1.0;

fn key_position(c: char) -> Option<(usize, usize)> {
    KEY_ROWS
        .iter()
        .enumerate()
        .find_map(|(row, keys)| keys.chars().position(|k| k == c).map(|col| (row, col)))
}

/// Cost of replacing `a` with `b`.
pub fn substitution_cost(a: char, b: char) -> f64 {
    if a == b {
        return 0.0;
    }
    let (Some((r1, c1)), Some((r2, c2))) = (key_position(a), key_position(b)) else {
        return SUBSTITUTION_COST;
    };

    match (r1.abs_diff(r2), c1.abs_diff(c2)) {
        (0, 1) | (1, 0) => ADJACENT_COST,
        (1, 1) => DIAGONAL_COST,
        _ => SUBSTITUTION_COST,
    }
}

/// Keyboard distance after lower-casing both sides.
pub fn keyboard_distance(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut dp = vec![vec![0.0f64; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i as f64 * INSERT_DELETE_COST;
    }
    for j in 0..=n {
        dp[0][j] = j as f64 * INSERT_DELETE_COST;
    }

    for i in 1..=m {
        for j in 1..=n {
            let delete = dp[i - 1][j] + INSERT_DELETE_COST;
            let insert = dp[i][j - 1] + INSERT_DELETE_COST;
            let substitute = dp[i - 1][j - 1] + substitution_cost(a[i - 1], b[j - 1]);
            dp[i][j] = delete.min(insert).min(substitute);
        }
    }
    dp[m][n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::approx;

    #[test]
    fn test_substitution_costs() {
        assert_eq!(substitution_cost('a', 'a'), 0.0);
        // same row neighbour
        assert_eq!(substitution_cost('q', 'w'), ADJACENT_COST);
        // same column neighbour
        assert_eq!(substitution_cost('q', 'a'), ADJACENT_COST);
        // diagonal
        assert_eq!(substitution_cost('q', 's'), DIAGONAL_COST);
        assert_eq!(substitution_cost('q', 'p'), SUBSTITUTION_COST);
        assert_eq!(substitution_cost('1', 'q'), SUBSTITUTION_COST);
        assert_eq!(substitution_cost('-', '.'), SUBSTITUTION_COST);
    }

    #[test]
    fn test_typo_is_cheaper_than_levenshtein() {
        // "jihn" -> "john": i/o are row neighbours
        assert!(approx(keyboard_distance("jihn", "john"), 0.5));
        // "smitj" -> "smith": j/h are row neighbours
        assert!(approx(keyboard_distance("smitj", "smith"), 0.5));
        // p/a are nowhere near each other
        assert!(approx(keyboard_distance("pat", "aat"), 1.0));
    }

    #[test]
    fn test_insert_delete_and_case() {
        assert!(approx(keyboard_distance("", "abc"), 3.0));
        assert!(approx(keyboard_distance("smith", "smiths"), 1.0));
        assert!(approx(keyboard_distance("SMITH", "smith"), 0.0));
    }
}
