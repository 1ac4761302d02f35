use crate::error::{ApiError, Result};
use crate::{
    ml::FeatureEncoder,
    models::{Book, BookDetailResponse, BookIdentifier},
    services::{payload::ModelPayload, title_resolver::TitleResolver},
};
use ndarray::Array2;
use std::sync::Arc;
use tracing::{debug, info};

/// Similar-book recommendations over the loaded model payload.
///
/// Nothing here is mutable: clones share the payload and the resolver, so one
/// instance can serve every worker thread.
#[derive(Clone)]
pub struct RecommendationService {
    payload: Arc<ModelPayload>,
    resolver: Arc<TitleResolver>,
}

impl RecommendationService {
    pub fn new(payload: Arc<ModelPayload>) -> Self {
        let resolver = TitleResolver::new(payload.clone());
        Self::with_resolver(payload, resolver)
    }

    pub fn with_resolver(payload: Arc<ModelPayload>, resolver: TitleResolver) -> Self {
        Self {
            payload,
            resolver: Arc::new(resolver),
        }
    }

    pub fn payload(&self) -> &ModelPayload {
        &self.payload
    }

    /// Catalog row for an identifier. A title not known verbatim goes through
    /// the title resolver and takes its best candidate; `None` means nothing
    /// matched.
    pub fn resolve_row(&self, identifier: &BookIdentifier) -> Result<Option<usize>> {
        match identifier {
            BookIdentifier::Row(row) if *row >= self.payload.len() => {
                Err(ApiError::IndexOutOfRange {
                    index: *row,
                    len: self.payload.len(),
                })
            }
            BookIdentifier::Row(row) => Ok(Some(*row)),
            BookIdentifier::Title(title) => match self.payload.row_for_title(title) {
                Some(row) => Ok(Some(row)),
                None => {
                    let row = self.resolver.resolve(title, 1).first().copied();
                    debug!("'{}' is not an exact title, resolved to {:?}", title, row);
                    Ok(row)
                }
            },
        }
    }

    /// Up to `k` books closest to the identified one, nearest first. An
    /// identifier that resolves to nothing yields an empty list.
    pub fn recommend(&self, identifier: &BookIdentifier, k: usize) -> Result<Vec<Book>> {
        if k == 0 {
            return Err(ApiError::InvalidInput(
                "number of recommendations must be positive".to_string(),
            ));
        }

        match self.resolve_row(identifier)? {
            Some(row) => self.recommend_row(row, k),
            None => {
                info!("No book matches {:?}, returning no recommendations", identifier);
                Ok(Vec::new())
            }
        }
    }

    pub fn recommend_row(&self, row: usize, k: usize) -> Result<Vec<Book>> {
        let features = self.normalized_features()?;
        let neighbors = self.payload.model().neighbors(&features, row, k)?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            for neighbor in &neighbors {
                debug!(
                    "Neighbour of row {}: row {} at distance {:.4}",
                    row, neighbor.row, neighbor.distance
                );
            }
        }

        let recommendations: Vec<Book> = neighbors
            .into_iter()
            .filter(|neighbor| neighbor.row != row)
            .take(k)
            .filter_map(|neighbor| self.payload.book(neighbor.row).cloned())
            .collect();

        info!(
            "Returning {} recommendations for row {}. First book: {:?}",
            recommendations.len(),
            row,
            recommendations.first().map(|b| b.title.as_str())
        );

        Ok(recommendations)
    }

    /// Re-encodes and scales the whole catalog so the rows line up with the
    /// fitted index.
    fn normalized_features(&self) -> Result<Array2<f64>> {
        let features = FeatureEncoder::new(self.payload.schema()).encode(self.payload.catalog());
        self.payload.scaler().transform(&features)
    }

    /// Books whose titles match a free-text query.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<Book> {
        self.resolver
            .resolve(query, max_results)
            .into_iter()
            .filter_map(|row| self.payload.book(row).cloned())
            .collect()
    }

    /// The book a title resolves to, plus its recommendations.
    pub fn book_detail(&self, title: &str, k: usize) -> Result<BookDetailResponse> {
        let identifier = BookIdentifier::Title(title.to_string());

        let Some(row) = self.resolve_row(&identifier)? else {
            return Ok(BookDetailResponse {
                book: None,
                recommendations: Vec::new(),
            });
        };

        Ok(BookDetailResponse {
            book: self.payload.book(row).cloned(),
            recommendations: self.recommend_row(row, k)?,
        })
    }

    /// Highest `average_rating` first; equal ratings keep catalog order.
    pub fn top_rated(&self, limit: usize) -> Vec<Book> {
        let mut rows: Vec<usize> = (0..self.payload.len()).collect();
        let catalog = self.payload.catalog();
        rows.sort_by(|a, b| {
            catalog[*b]
                .average_rating
                .total_cmp(&catalog[*a].average_rating)
        });

        rows.into_iter()
            .take(limit)
            .map(|row| catalog[row].clone())
            .collect()
    }
}
