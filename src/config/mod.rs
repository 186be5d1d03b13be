mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./rentpv.toml",
        "./config.toml",
        "~/.config/rentpv/config.toml",
        "/etc/rentpv/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let bucket = &config.storage.default_bucket;
    if bucket.is_empty() || bucket.contains('/') {
        anyhow::bail!("Invalid default bucket '{}'", bucket);
    }

    if config.storage.public_base_url.is_empty() {
        anyhow::bail!("Storage public_base_url cannot be empty");
    }

    if config.photos.max_upload_bytes == 0 {
        anyhow::bail!("Photo max_upload_bytes must be greater than 0");
    }

    if config.photos.allowed_content_types.is_empty() {
        anyhow::bail!("Photo allowed_content_types cannot be empty");
    }

    Ok(())
}
