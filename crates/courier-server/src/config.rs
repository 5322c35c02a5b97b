//! Broker configuration
//!
//! Configuration comes from two places, environment first:
//!
//! - Environment variables: `PORT`, `BROKER_ID`, `DATA_STORAGE_VOLUME`,
//!   `INGRESS_LOG_FILE`, `INGRESS_METADATA_FILE`.
//! - A JSON config file (path in `BROKER_CONFIG`) carrying the topic layout
//!   and the reboot flag:
//!
//! ```json
//! {
//!   "brokerId": "broker-1",
//!   "reboot": false,
//!   "topics": [ { "id": "orders", "partitions": 4 } ]
//! }
//! ```
//!
//! The topic layout only matters on first boot; after that, `config.log`
//! under the data root is the source of truth (see `bootstrap`).

use std::path::PathBuf;

use courier_metadata::TopicSpec;
use courier_storage::StorageConfig;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BROKER_ID: &str = "courier-1";
const DEFAULT_DATA_ROOT: &str = "./data";

/// On-disk JSON config file shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub broker_id: Option<String>,
    #[serde(default)]
    pub reboot: bool,
    #[serde(default)]
    pub topics: Vec<TopicSpec>,
}

/// Fully resolved broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub broker_id: String,
    pub port: u16,
    /// Delete the data root before starting (destructive; config-file only).
    pub reboot: bool,
    pub topics: Vec<TopicSpec>,
    pub data_root: PathBuf,
    pub ingress_log_file: String,
    pub ingress_metadata_file: String,
}

impl BrokerConfig {
    /// Resolve configuration from the environment plus the optional
    /// `BROKER_CONFIG` JSON file.
    pub async fn load_from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let file = match std::env::var("BROKER_CONFIG") {
            Ok(path) => {
                let text = tokio::fs::read_to_string(&path).await?;
                serde_json::from_str::<ConfigFile>(&text)?
            }
            Err(_) => ConfigFile::default(),
        };

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse()?,
            Err(_) => DEFAULT_PORT,
        };

        let broker_id = std::env::var("BROKER_ID")
            .ok()
            .or(file.broker_id)
            .unwrap_or_else(|| DEFAULT_BROKER_ID.to_string());

        let data_root = std::env::var("DATA_STORAGE_VOLUME")
            .unwrap_or_else(|_| DEFAULT_DATA_ROOT.to_string())
            .into();

        let defaults = StorageConfig::default();
        let ingress_log_file =
            std::env::var("INGRESS_LOG_FILE").unwrap_or(defaults.ingress_log_file);
        let ingress_metadata_file =
            std::env::var("INGRESS_METADATA_FILE").unwrap_or(defaults.ingress_metadata_file);

        Ok(Self {
            broker_id,
            port,
            reboot: file.reboot,
            topics: file.topics,
            data_root,
            ingress_log_file,
            ingress_metadata_file,
        })
    }

    /// Storage-layer view of this configuration.
    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            data_root: self.data_root.clone(),
            ingress_log_file: self.ingress_log_file.clone(),
            ingress_metadata_file: self.ingress_metadata_file.clone(),
            ..StorageConfig::default()
        }
    }
}
