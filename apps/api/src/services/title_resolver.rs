use crate::{ml::similarity::SequenceMatcher, models::Book, services::payload::ModelPayload};
use std::sync::Arc;
use tracing::debug;

/// Default minimum similarity for an approximate title match.
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.4;

/// One way of turning a free-text query into catalog rows.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// At most `max_results` rows, best first. Empty when nothing matches.
    fn candidates(&self, catalog: &[Book], query: &str, max_results: usize) -> Vec<usize>;
}

/// Case-insensitive substring containment, in catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringStrategy;

impl ResolutionStrategy for SubstringStrategy {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn candidates(&self, catalog: &[Book], query: &str, max_results: usize) -> Vec<usize> {
        let needle = query.trim().to_lowercase();

        catalog
            .iter()
            .enumerate()
            .filter(|(_, book)| book.title.to_lowercase().contains(&needle))
            .map(|(row, _)| row)
            .take(max_results)
            .collect()
    }
}

/// Approximate matching on the raw query, best score first, equal scores in
/// catalog order.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyStrategy {
    cutoff: f64,
}

impl FuzzyStrategy {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }
}

impl Default for FuzzyStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_CUTOFF)
    }
}

impl ResolutionStrategy for FuzzyStrategy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn candidates(&self, catalog: &[Book], query: &str, max_results: usize) -> Vec<usize> {
        let matcher = SequenceMatcher::new(query);

        let mut scored: Vec<(usize, f64)> = catalog
            .iter()
            .enumerate()
            .map(|(row, book)| (row, matcher.ratio(&book.title)))
            .filter(|(_, score)| *score >= self.cutoff)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(max_results);

        if tracing::enabled!(tracing::Level::DEBUG) {
            for (row, score) in &scored {
                debug!("Fuzzy candidate row {} scored {:.3}", row, score);
            }
        }

        scored.into_iter().map(|(row, _)| row).collect()
    }
}

/// Tries each strategy in order; the first non-empty answer wins.
pub struct TitleResolver {
    payload: Arc<ModelPayload>,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl TitleResolver {
    /// Substring containment first, then fuzzy matching.
    pub fn new(payload: Arc<ModelPayload>) -> Self {
        Self::with_strategies(
            payload,
            vec![
                Box::new(SubstringStrategy),
                Box::new(FuzzyStrategy::default()),
            ],
        )
    }

    pub fn with_strategies(
        payload: Arc<ModelPayload>,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            payload,
            strategies,
        }
    }

    pub fn resolve(&self, query: &str, max_results: usize) -> Vec<usize> {
        if max_results == 0 {
            return Vec::new();
        }

        let catalog = self.payload.catalog();
        for strategy in &self.strategies {
            let rows = strategy.candidates(catalog, query, max_results);
            if !rows.is_empty() {
                debug!(
                    "Resolved '{}' with {} strategy to {} rows",
                    query,
                    strategy.name(),
                    rows.len()
                );
                return rows;
            }
        }

        debug!("No title matches '{}'", query);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payload::fixtures::{dune_payload, feature_columns, payload_for};

    fn titled(titles: &[&str]) -> Arc<ModelPayload> {
        let catalog = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let rating = 3.0 + i as f64 * 0.3;
                Book::new(*title, rating, 10 * (i as u64 + 1), Some(100), Some("eng"))
            })
            .collect();
        payload_for(catalog, &feature_columns())
    }

    #[test]
    fn test_substring_is_case_insensitive_in_catalog_order() {
        let resolver = TitleResolver::new(dune_payload());

        assert_eq!(resolver.resolve("  DUNE ", 5), vec![0, 1]);
        assert_eq!(resolver.resolve("dune", 1), vec![0]);
    }

    #[test]
    fn test_substring_wins_over_fuzzy() {
        let payload = titled(&["The Long Dune Saga", "Dune"]);
        let resolver = TitleResolver::new(payload.clone());

        let fuzzy = FuzzyStrategy::default().candidates(payload.catalog(), "dune", 5);
        assert_eq!(fuzzy, vec![1]);

        assert_eq!(resolver.resolve("dune", 5), vec![0, 1]);
    }

    #[test]
    fn test_fuzzy_fallback_for_misspelling() {
        let resolver = TitleResolver::new(dune_payload());

        // "Dune" scores 0.75, "Dune Messiah" 0.375 and "Foundation" 0.29
        assert_eq!(resolver.resolve("Duen", 5), vec![0]);
    }

    #[test]
    fn test_fuzzy_orders_by_score_then_row() {
        let payload = titled(&["Emma", "Dune Messiah", "Dune", "Dune"]);

        let rows = FuzzyStrategy::default().candidates(payload.catalog(), "Dunes", 5);
        assert_eq!(rows, vec![2, 3, 1]);
    }

    #[test]
    fn test_below_cutoff_is_empty() {
        let resolver = TitleResolver::new(dune_payload());

        assert!(resolver.resolve("zzzz", 5).is_empty());
    }

    #[test]
    fn test_zero_max_results() {
        let resolver = TitleResolver::new(dune_payload());

        assert!(resolver.resolve("Dune", 0).is_empty());
    }

    #[test]
    fn test_custom_strategy_order() {
        let payload = titled(&["The Long Dune Saga", "Dune"]);
        let resolver =
            TitleResolver::with_strategies(payload, vec![Box::new(FuzzyStrategy::default())]);

        assert_eq!(resolver.resolve("dune", 5), vec![1]);
    }
}
