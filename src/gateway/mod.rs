//! 保存先との境界
//!
//! 保存要求は1回の論理的な保存としてまとめて送り、
//! 保存先は 削除 → アップロード → 更新 の順に適用する。
//! 一部だけ適用されることはない前提で扱う。

mod json_store;

pub use json_store::JsonStoreGateway;

use crate::error::Result;
use chrono::{DateTime, Utc};
use photo_slots_common::{PersistedPhoto, PhotoId, SaveRequest};
use serde::{Deserialize, Serialize};

/// 保存結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    /// アップロードで採番されたID（要求の順）
    pub created: Vec<PhotoId>,
    pub updated: usize,
    pub deleted: usize,
    pub saved_at: DateTime<Utc>,
}

#[allow(async_fn_in_trait)]
pub trait PersistenceGateway {
    /// レポートの保存済み写真を取得
    async fn fetch(&self, report_id: u64) -> Result<Vec<PersistedPhoto>>;

    /// 保存要求を適用
    async fn apply(&self, report_id: u64, request: &SaveRequest) -> Result<SaveReceipt>;
}
