use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

use crate::Result;
use crate::api;
use crate::config::{Config, get_config_dir};
use crate::dataset::Dataset;
use crate::recommend::Recommender;

/// Command line settings that take precedence over `config.toml`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub metadata: Option<PathBuf>,
    pub features: Option<PathBuf>,
}

/// Load the configuration from `config_dir`, or the default directory
#[inline]
pub fn load_config(config_dir: Option<PathBuf>) -> Result<Config> {
    let config_dir = match config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };
    Ok(Config::load(&config_dir)?)
}

/// Apply command line overrides and re-validate
#[inline]
pub fn apply_overrides(config: &mut Config, overrides: ServeOverrides) -> Result<()> {
    if let Some(host) = overrides.host {
        config.server.set_host(host)?;
    }
    if let Some(port) = overrides.port {
        config.server.set_port(port)?;
    }
    if let Some(metadata) = overrides.metadata {
        config.data.metadata_path = metadata;
    }
    if let Some(features) = overrides.features {
        config.data.features_path = features;
    }
    config.validate()?;
    Ok(())
}

/// Load the artifacts and fit the neighbor index
#[inline]
pub fn build_recommender(config: &Config) -> Result<Recommender> {
    let started = Instant::now();
    let dataset = Dataset::load(config)?;
    let recommender = Recommender::from_dataset(dataset, &config.recommend)?;
    info!(
        "Recommender ready with {} titles in {:?}",
        recommender.titles().len(),
        started.elapsed()
    );
    Ok(recommender)
}

/// Load everything, then serve the HTTP API until shutdown
#[inline]
pub async fn serve_api(config: &Config) -> Result<()> {
    let recommender = Arc::new(build_recommender(config)?);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    api::serve(listener, recommender).await?;
    info!("Server stopped");
    Ok(())
}
