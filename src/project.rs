//! プロジェクト設定（写真枠定義）
//!
//! レポートごとの写真グループ定義をJSONから読み込む。読み取り専用。

use crate::error::{Result, SlotsError};
use photo_slots_common::GroupDef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub report_id: u64,
    pub groups: Vec<GroupDef>,
}

impl ProjectConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SlotsError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.max_slots_per_list == 0 {
                return Err(SlotsError::Config(format!(
                    "グループ{}の枠数が0です",
                    group.id
                )));
            }
            if !seen.insert(group.id) {
                return Err(SlotsError::Config(format!("グループ{}が重複しています", group.id)));
            }
        }
        Ok(())
    }
}
