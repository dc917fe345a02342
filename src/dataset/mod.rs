//! Precomputed artifacts: the title table and the sparse feature matrix
//!
//! Row `i` of the [`TitleIndex`] and row `i` of the [`FeatureMatrix`] describe
//! the same book. [`Dataset`] only hands out the pair once that holds.


use serde_json::{Map, Value};
use sprs::{CsMat, CsVecView, TriMat};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse metadata table {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to parse feature matrix {path}: {message}")]
    Matrix { path: PathBuf, message: String },
    #[error("Row {row} has no string value in column '{column}'")]
    MissingTitle { row: usize, column: String },
    #[error("Metadata table has {titles} rows but the feature matrix has {rows}")]
    RowMismatch { titles: usize, rows: usize },
    #[error("Title '{title}' appears at rows {first} and {duplicate}")]
    DuplicateTitle {
        title: String,
        first: usize,
        duplicate: usize,
    },
    #[error("Feature matrix row {row} holds a non-finite value")]
    NonFiniteValue { row: usize },
    #[error("Dataset is empty")]
    Empty,
}

/// Title to row lookup, built once from the metadata table
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    titles: Vec<String>,
    rows: HashMap<String, usize>,
}

impl TitleIndex {
    /// Titles must be unique; a repeated title is an error naming both rows
    #[inline]
    pub fn new(titles: Vec<String>) -> Result<Self, DatasetError> {
        let mut rows = HashMap::with_capacity(titles.len());
        for (row, title) in titles.iter().enumerate() {
            if let Some(&first) = rows.get(title) {
                return Err(DatasetError::DuplicateTitle {
                    title: title.clone(),
                    first,
                    duplicate: row,
                });
            }
            rows.insert(title.clone(), row);
        }
        Ok(Self { titles, rows })
    }

    /// Row position for `title`, or `None` when the title is unknown
    #[inline]
    pub fn lookup(&self, title: &str) -> Option<usize> {
        self.rows.get(title).copied()
    }

    #[inline]
    pub fn title(&self, row: usize) -> Option<&str> {
        self.titles.get(row).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Sparse feature rows in CSR layout
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    inner: CsMat<f64>,
}

impl FeatureMatrix {
    #[inline]
    pub fn new(inner: CsMat<f64>) -> Self {
        // Row views are only cheap on CSR storage
        let inner = if inner.is_csr() { inner } else { inner.to_csr() };
        Self { inner }
    }

    /// Build from `(row, col, value)` triplets
    #[inline]
    pub fn from_triplets(shape: (usize, usize), triplets: &[(usize, usize, f64)]) -> Self {
        let mut tri = TriMat::new(shape);
        for &(row, col, value) in triplets {
            tri.add_triplet(row, col, value);
        }
        Self::new(tri.to_csr())
    }

    /// Read a Matrix Market coordinate file
    #[inline]
    pub fn read_matrix_market(path: &Path) -> Result<Self, DatasetError> {
        let tri: TriMat<f64> =
            sprs::io::read_matrix_market(path).map_err(|e| DatasetError::Matrix {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self::new(tri.to_csr()))
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.inner.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.inner.cols()
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    #[inline]
    pub fn row(&self, row: usize) -> Option<CsVecView<'_, f64>> {
        self.inner.outer_view(row)
    }

    /// First row holding a NaN or infinite value, if any
    #[inline]
    pub fn first_non_finite_row(&self) -> Option<usize> {
        self.inner
            .outer_iterator()
            .position(|row| row.data().iter().any(|value| !value.is_finite()))
    }

    #[inline]
    pub fn as_inner(&self) -> &CsMat<f64> {
        &self.inner
    }
}

/// Row-aligned title table and feature matrix
#[derive(Debug, Clone)]
pub struct Dataset {
    pub titles: TitleIndex,
    pub features: FeatureMatrix,
}

impl Dataset {
    #[inline]
    pub fn from_parts(titles: Vec<String>, features: FeatureMatrix) -> Result<Self, DatasetError> {
        if titles.is_empty() || features.rows() == 0 {
            return Err(DatasetError::Empty);
        }
        if titles.len() != features.rows() {
            return Err(DatasetError::RowMismatch {
                titles: titles.len(),
                rows: features.rows(),
            });
        }

        if let Some(row) = features.first_non_finite_row() {
            return Err(DatasetError::NonFiniteValue { row });
        }

        Ok(Self {
            titles: TitleIndex::new(titles)?,
            features,
        })
    }

    /// Load both artifacts from the locations named in `config`
    #[inline]
    pub fn load(config: &Config) -> Result<Self, DatasetError> {
        let metadata_path = config.metadata_path();
        let features_path = config.features_path();

        info!("Loading metadata table from {}", metadata_path.display());
        let titles = read_titles(&metadata_path, &config.data.title_column)?;

        info!("Loading feature matrix from {}", features_path.display());
        let features = FeatureMatrix::read_matrix_market(&features_path)?;
        debug!(
            "Feature matrix: {}x{} with {} stored values",
            features.rows(),
            features.cols(),
            features.nnz()
        );

        let dataset = Self::from_parts(titles, features)?;
        info!(
            "Dataset loaded: {} titles, {} feature columns",
            dataset.titles.len(),
            dataset.features.cols()
        );
        Ok(dataset)
    }
}

/// Read the title column of a JSON array-of-objects metadata table
#[inline]
pub fn read_titles(path: &Path, column: &str) -> Result<Vec<String>, DatasetError> {
    let content = fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let records: Vec<Map<String, Value>> =
        serde_json::from_str(&content).map_err(|source| DatasetError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;

    records
        .iter()
        .enumerate()
        .map(|(row, record)| match record.get(column) {
            Some(Value::String(title)) => Ok(title.clone()),
            _ => Err(DatasetError::MissingTitle {
                row,
                column: column.to_string(),
            }),
        })
        .collect()
}
