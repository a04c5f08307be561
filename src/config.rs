use crate::error::{Result, SlotsError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const STORE_ENV: &str = "PHOTO_SLOTS_STORE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ローカル保存先ディレクトリ（未設定時はデータディレクトリ）
    pub store_dir: Option<PathBuf>,
    pub save_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SlotsError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-slots").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            store_dir: None,
            save_timeout_seconds: 30,
        }
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_seconds.max(1))
    }

    /// 保存先ディレクトリ（環境変数 > 設定ファイル > データディレクトリ）
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(STORE_ENV) {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        if let Some(dir) = &self.store_dir {
            return Ok(dir.clone());
        }

        let data = dirs::data_dir()
            .ok_or_else(|| SlotsError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data.join("photo-slots"))
    }
}
