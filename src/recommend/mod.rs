//! Title recommendations
//!
//! A request resolves the title to its row, asks the neighbor index for the
//! nearest rows and drops the title itself. Results are ordered farthest
//! first: the least similar of the near set leads, the most similar is last.

#[cfg(test)]
mod tests;

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::RecommendConfig;
use crate::dataset::{Dataset, TitleIndex};
use crate::neighbors::{CosineIndex, IndexError, Neighbor, NeighborIndex};

/// Decimal places kept in reported distances
pub const DISTANCE_DECIMALS: i32 = 4;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecommendError {
    /// The title is not in the title index
    #[error("'{title}' not found in the dataset")]
    NotFound { title: String },

    /// Anything that went wrong after the title was resolved
    #[error("{message}")]
    Internal { message: String },
}

impl From<IndexError> for RecommendError {
    #[inline]
    fn from(error: IndexError) -> Self {
        Self::Internal {
            message: error.to_string(),
        }
    }
}

/// One recommended title and its cosine distance to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub input_book: String,
    pub recommendations: Vec<Recommendation>,
}

/// Read-only recommendation state shared by every request
pub struct Recommender {
    titles: TitleIndex,
    index: Arc<dyn NeighborIndex>,
    neighbor_count: usize,
}

impl Recommender {
    /// Pair a title index with a neighbor index of the same row count
    #[inline]
    pub fn new(
        titles: TitleIndex,
        index: Arc<dyn NeighborIndex>,
        config: &RecommendConfig,
    ) -> Result<Self, IndexError> {
        if titles.len() != index.len() {
            return Err(IndexError::SizeMismatch {
                titles: titles.len(),
                rows: index.len(),
            });
        }
        Ok(Self {
            titles,
            index,
            neighbor_count: config.neighbor_count,
        })
    }

    /// Fit a cosine index over the dataset's feature matrix
    #[inline]
    pub fn from_dataset(dataset: Dataset, config: &RecommendConfig) -> Result<Self, IndexError> {
        let Dataset { titles, features } = dataset;
        let index = CosineIndex::fit(features)?;
        Self::new(titles, Arc::new(index), config)
    }

    #[inline]
    pub fn titles(&self) -> &TitleIndex {
        &self.titles
    }

    /// Recommend titles similar to `title`.
    ///
    /// `search_type` is accepted for compatibility with existing clients and
    /// does not change the result.
    #[inline]
    pub fn recommend(
        &self,
        title: &str,
        search_type: &str,
    ) -> Result<RecommendationResult, RecommendError> {
        debug!("Recommending for '{}' (search_type={})", title, search_type);

        let row = self
            .titles
            .lookup(title)
            .ok_or_else(|| RecommendError::NotFound {
                title: title.to_string(),
            })?;

        let k = self.neighbor_count.min(self.titles.len());
        let neighbors = self.index.kneighbors(row, k)?;

        let recommendations = farthest_first_excluding(neighbors, row)
            .into_iter()
            .map(|neighbor| {
                let title = self.titles.title(neighbor.row).ok_or_else(|| {
                    RecommendError::Internal {
                        message: format!(
                            "Neighbor row {} has no title (title index has {} rows)",
                            neighbor.row,
                            self.titles.len()
                        ),
                    }
                })?;
                if !neighbor.distance.is_finite() {
                    return Err(RecommendError::Internal {
                        message: format!(
                            "Distance to '{}' is not a finite number",
                            title
                        ),
                    });
                }
                Ok(Recommendation {
                    title: title.to_string(),
                    distance: round_distance(neighbor.distance),
                })
            })
            .collect::<Result<Vec<_>, RecommendError>>()?;

        Ok(RecommendationResult {
            input_book: title.to_string(),
            recommendations,
        })
    }
}

/// Reverse ascending neighbors and drop the query row.
///
/// When the query row is missing from the set (exact ties, zero rows) the
/// nearest entry is dropped instead, so the count stays `len - 1`.
fn farthest_first_excluding(mut neighbors: Vec<Neighbor>, query_row: usize) -> Vec<Neighbor> {
    if let Some(pos) = neighbors.iter().position(|n| n.row == query_row) {
        neighbors.remove(pos);
    } else if !neighbors.is_empty() {
        neighbors.remove(0);
    }
    neighbors.reverse();
    neighbors
}

fn round_distance(distance: f64) -> f64 {
    let scale = 10_f64.powi(DISTANCE_DECIMALS);
    let rounded = (distance * scale).round() / scale;
    // Drops negative noise and -0.0
    if rounded > 0.0 { rounded } else { 0.0 }
}
