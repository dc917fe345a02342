// Configuration management module
// TOML settings for the listener, artifact locations and neighbor queries

pub mod settings;


pub use settings::{Config, ConfigError, DataConfig, RecommendConfig, ServerConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}

/// Print the effective configuration as TOML
#[inline]
pub fn show_config(config: &Config) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    println!("# {}", config.config_file_path().display());
    print!("{}", content);
    Ok(())
}
