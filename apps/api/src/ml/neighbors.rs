use crate::error::{ApiError, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
}

/// Exact Euclidean nearest-neighbour search over the normalised catalog
/// matrix the model was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborIndex {
    points: Array2<f64>,
}

impl NeighborIndex {
    pub fn fit(points: Array2<f64>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// The `n_neighbors` fitted rows closest to `query`, nearest first. Equal
    /// distances are ordered by row index.
    pub fn kneighbors(&self, query: ArrayView1<'_, f64>, n_neighbors: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim() {
            return Err(ApiError::SchemaMismatch {
                expected: self.dim(),
                got: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .points
            .rows()
            .into_iter()
            .enumerate()
            .map(|(row, point)| Neighbor {
                row,
                distance: squared_distance(point, query),
            })
            .collect();

        neighbors.sort_by(by_distance_then_row);
        neighbors.truncate(n_neighbors);
        for neighbor in &mut neighbors {
            neighbor.distance = neighbor.distance.sqrt();
        }

        Ok(neighbors)
    }

    /// Up to `k + 1` neighbours of catalog row `row`, taken from the freshly
    /// normalised `features` matrix. The row itself is normally the first
    /// entry at distance zero; removing it is the caller's job.
    pub fn neighbors(&self, features: &Array2<f64>, row: usize, k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(ApiError::InvalidInput(
                "number of neighbours must be positive".to_string(),
            ));
        }
        if row >= features.nrows() {
            return Err(ApiError::IndexOutOfRange {
                index: row,
                len: features.nrows(),
            });
        }

        self.kneighbors(features.row(row), k.saturating_add(1))
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn by_distance_then_row(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.row.cmp(&b.row))
}
