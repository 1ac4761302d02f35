use serde::{Deserialize, Serialize};

// Re-export types from book.rs
pub use book::Book;

mod book;

/// Which book to find neighbours for: a catalog row or a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookIdentifier {
    Row(usize),
    Title(String),
}

impl From<usize> for BookIdentifier {
    fn from(row: usize) -> Self {
        BookIdentifier::Row(row)
    }
}

impl From<&str> for BookIdentifier {
    fn from(title: &str) -> Self {
        BookIdentifier::Title(title.to_string())
    }
}

/// Request structure for similar-book recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Exact title, approximate title or catalog row index
    pub identifier: BookIdentifier,
    /// Number of recommendations to return; the configured default when absent
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Response structure for recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Book>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<Book>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub title: String,
    pub k: Option<usize>,
}

/// A resolved book and its neighbours. `book` is `None` when the title
/// could not be resolved at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDetailResponse {
    pub book: Option<Book>,
    pub recommendations: Vec<Book>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopRatedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopRatedResponse {
    pub books: Vec<Book>,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    pub catalog_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_accepts_row_or_title() {
        let by_row: RecommendationRequest =
            serde_json::from_value(json!({ "identifier": 2, "top_k": 3 })).unwrap();
        assert_eq!(by_row.identifier, BookIdentifier::Row(2));
        assert_eq!(by_row.top_k, Some(3));

        let by_title: RecommendationRequest =
            serde_json::from_value(json!({ "identifier": "Dune" })).unwrap();
        assert_eq!(by_title.identifier, BookIdentifier::Title("Dune".to_string()));
        assert_eq!(by_title.top_k, None);
    }
}
