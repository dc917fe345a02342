//! Neighbor index over the feature matrix
//!
//! [`CosineIndex`] answers "k nearest rows" by scoring every row against the
//! query row under cosine distance. Rows are scored in parallel; the fitted
//! index is immutable and shared across requests.


use rayon::prelude::*;
use sprs::CsVecView;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::FeatureMatrix;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("Cannot fit a neighbor index over an empty matrix")]
    EmptyMatrix,
    #[error("Row {row} is out of range for an index of {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("Title index has {titles} rows but the neighbor index has {rows}")]
    SizeMismatch { titles: usize, rows: usize },
}

/// A single neighbor returned by an index query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
}

/// k-nearest-neighbor queries keyed by matrix row
pub trait NeighborIndex: Send + Sync {
    /// Number of indexed rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` rows nearest to `row`, ascending by distance, ties by row.
    /// The queried row is part of the candidate set. `k` is clamped to `len()`.
    fn kneighbors(&self, row: usize, k: usize) -> Result<Vec<Neighbor>, IndexError>;
}

/// Brute-force cosine index over sparse rows
#[derive(Debug)]
pub struct CosineIndex {
    features: FeatureMatrix,
    norms: Vec<f64>,
}

impl CosineIndex {
    #[inline]
    pub fn fit(features: FeatureMatrix) -> Result<Self, IndexError> {
        if features.rows() == 0 {
            return Err(IndexError::EmptyMatrix);
        }

        let norms: Vec<f64> = features
            .as_inner()
            .outer_iterator()
            .map(|row| row_norm(&row))
            .collect();

        info!(
            "Fitted cosine index over {} rows x {} columns",
            features.rows(),
            features.cols()
        );

        Ok(Self { features, norms })
    }

    fn row(&self, row: usize) -> Result<CsVecView<'_, f64>, IndexError> {
        self.features
            .row(row)
            .ok_or(IndexError::RowOutOfRange {
                row,
                rows: self.len(),
            })
    }
}

impl NeighborIndex for CosineIndex {
    #[inline]
    fn len(&self) -> usize {
        self.norms.len()
    }

    #[inline]
    fn kneighbors(&self, row: usize, k: usize) -> Result<Vec<Neighbor>, IndexError> {
        let query = self.row(row)?;
        let query_norm = self.norms[row];
        let k = k.min(self.len());

        let mut scored: Vec<Neighbor> = (0..self.len())
            .into_par_iter()
            .filter_map(|candidate| {
                let other = self.features.row(candidate)?;
                Some(Neighbor {
                    row: candidate,
                    distance: cosine_distance(
                        query.dot(&other),
                        query_norm,
                        self.norms[candidate],
                    ),
                })
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k, compare_neighbors);
            scored.truncate(k);
        }
        scored.sort_unstable_by(compare_neighbors);

        debug!("kneighbors(row={}, k={}) -> {} rows", row, k, scored.len());
        Ok(scored)
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.row.cmp(&b.row))
}

fn row_norm(row: &CsVecView<'_, f64>) -> f64 {
    let norm = row.data().iter().map(|v| v * v).sum::<f64>().sqrt();
    // Zero rows keep similarity 0 to everything
    if norm == 0.0 { 1.0 } else { norm }
}

fn cosine_distance(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    1.0 - dot / (norm_a * norm_b)
}
