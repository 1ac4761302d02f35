//! Ratcliff/Obershelp similarity used to rank approximate title matches.
//!
//! The score is `2 * M / (|a| + |b|)` where `M` is the number of characters in
//! the matching blocks found by repeatedly taking the longest common substring
//! and recursing on both sides of it.

use std::collections::{HashMap, HashSet};

/// Sequences at least this long get their very frequent characters
/// ("popular" elements) excluded from match seeding.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity of `a` and `b` in `[0, 1]`. Two empty strings score 1.
pub fn ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(b).ratio(a)
}

/// Matcher with a fixed second sequence, so one query can be scored against
/// many titles without re-indexing it.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(b: &str) -> Self {
        let b: Vec<char> = b.chars().collect();
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            let popular: HashSet<char> = b2j
                .iter()
                .filter(|(_, indices)| indices.len() > threshold)
                .map(|(c, _)| *c)
                .collect();
            b2j.retain(|c, _| !popular.contains(c));
        }

        Self { b, b2j }
    }

    pub fn ratio(&self, a: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let total = a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }

        2.0 * self.matched_len(&a) as f64 / total as f64
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges. Among
    /// equally long blocks the one starting earliest in `a` wins.
    pub fn find_longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let b = &self.b;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(indices) = self.b2j.get(&a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Grow the block over popular characters that were left out of b2j.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total length of all matching blocks between `a` and `b`.
    pub fn matched_len(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.find_longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_identical_and_disjoint() {
        assert_close(ratio("Dune", "Dune"), 1.0);
        assert_close(ratio("abc", "xyz"), 0.0);
        assert_close(ratio("", ""), 1.0);
        assert_close(ratio("Dune", ""), 0.0);
    }

    #[test]
    fn test_shifted_overlap() {
        assert_close(ratio("abcd", "bcde"), 0.75);
    }

    #[test]
    fn test_transposed_letters() {
        // "Du" + "n" match, the swapped "e" does not
        assert_close(ratio("Dune", "Duen"), 0.75);
        assert_close(ratio("Dune Messiah", "Duen"), 0.375);
        assert_close(ratio("Foundation", "Duen"), 4.0 / 14.0);
    }

    #[test]
    fn test_recurses_on_both_sides() {
        // "b" | "cd" | "f" are found as three separate blocks
        let a: Vec<char> = "abxcdyf".chars().collect();
        assert_eq!(SequenceMatcher::new("bcdf").matched_len(&a), 4);
    }

    #[test]
    fn test_case_sensitive_and_unicode() {
        assert_close(ratio("dune", "DUNE"), 0.0);
        assert_close(ratio("café", "cafe"), 0.75);
    }

    #[test]
    fn test_longest_match_prefers_earliest_in_a() {
        let a: Vec<char> = "xabyab".chars().collect();
        let matcher = SequenceMatcher::new("ab");
        assert_eq!(matcher.find_longest_match(&a, 0, a.len(), 0, 2), (1, 0, 2));
    }

    #[test]
    fn test_long_query_drops_popular_characters() {
        // 250 chars, so every character of "Dune " is too frequent to seed a
        // match. Only the extension from the block start can still match.
        let query = "Dune ".repeat(50);

        assert_close(ratio("Dune Messiah", &query), 5.0 / 131.0);
        assert_close(ratio("Children of Dune", &query), 0.0);
        assert_close(ratio("Dune", &query), 4.0 / 127.0);
    }

    #[test]
    fn test_short_query_keeps_every_character() {
        let query = "Dune ".repeat(39);

        assert!(query.chars().count() < AUTOJUNK_MIN_LEN);
        assert!(ratio("Children of Dune", &query) > 0.0);
    }

    #[test]
    fn test_matcher_reused_across_titles() {
        let matcher = SequenceMatcher::new("Duen");
        assert_close(matcher.ratio("Dune"), ratio("Dune", "Duen"));
        assert_close(matcher.ratio("Foundation"), ratio("Foundation", "Duen"));
    }
}
