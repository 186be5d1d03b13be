use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::photos::UploadPolicy;
use rentpv_common::DEFAULT_PHOTO_BUCKET;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Upload limits applied to every new photo.
    #[serde(default)]
    pub photos: UploadPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database and the object store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Prefix of public photo URLs; objects are served below it as
    /// `{bucket}/{key}`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Bucket for new uploads and for rows stored without one.
    #[serde(default = "default_bucket")]
    pub default_bucket: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/storage".to_string()
}

fn default_bucket() -> String {
    DEFAULT_PHOTO_BUCKET.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            public_base_url: default_public_base_url(),
            default_bucket: default_bucket(),
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rentpv.db")
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir.join("objects")
    }
}
