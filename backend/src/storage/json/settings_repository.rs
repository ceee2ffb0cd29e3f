use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

use super::connection::JsonConnection;
use crate::storage::traits::SettingsStorage;

const CONFIG_FILE: &str = "config.yaml";
const DATA_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GlobalConfig {
    #[serde(default)]
    current_group_id: Option<String>,
    #[serde(default)]
    data_format_version: String,
}

/// Installation-wide settings stored in a small YAML file, currently just
/// the active-group pointer.
#[derive(Clone)]
pub struct SettingsRepository {
    connection: Arc<JsonConnection>,
}

impl SettingsRepository {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self { connection }
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.connection.base_directory().join(CONFIG_FILE)
    }

    fn load_config(&self) -> GlobalConfig {
        let path = self.config_path();
        if !path.exists() {
            return GlobalConfig::default();
        }
        match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_yaml::from_str::<GlobalConfig>(&s).map_err(Into::into))
        {
            Ok(config) => config,
            Err(e) => {
                warn!("Corrupt config document, falling back to defaults: {}", e);
                GlobalConfig::default()
            }
        }
    }

    fn save_config(&self, config: &GlobalConfig) -> Result<()> {
        let contents = serde_yaml::to_string(config)?;
        self.connection.write_atomic(&self.config_path(), &contents)?;
        Ok(())
    }
}

impl SettingsStorage for SettingsRepository {
    fn get_current_group_id(&self) -> Result<Option<String>> {
        Ok(self.load_config().current_group_id)
    }

    fn set_current_group_id(&self, group_id: Option<&str>) -> Result<()> {
        let mut config = self.load_config();
        config.current_group_id = group_id.map(str::to_string);
        config.data_format_version = DATA_FORMAT_VERSION.to_string();
        self.save_config(&config)?;
        info!("Set current group to {:?}", group_id);
        Ok(())
    }
}
