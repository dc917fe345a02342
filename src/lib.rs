use thiserror::Error;

pub type Result<T> = std::result::Result<T, BookmindError>;

#[derive(Error, Debug)]
pub enum BookmindError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] dataset::DatasetError),

    #[error("Index error: {0}")]
    Index(#[from] neighbors::IndexError),

    #[error("Recommendation error: {0}")]
    Recommend(#[from] recommend::RecommendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod api;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod neighbors;
pub mod recommend;
