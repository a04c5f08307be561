use photo_slots_common as common;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotsError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("操作できません: {0}")]
    Validation(#[from] common::Error),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("保存に失敗しました（再試行できます）: {0}")]
    Persistence(String),

    #[error("保存がタイムアウトしました（{0}秒）。再試行できます")]
    SaveTimeout(u64),

    #[error("保存処理中です。完了まで待ってください")]
    SaveInProgress,

    #[error("保存済みの状態を再読み込みしてください（`photo-slots open`）")]
    StaleSession,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl SlotsError {
    /// 編集内容を保持したまま再試行できるエラーか
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlotsError::Persistence(_) | SlotsError::SaveTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SlotsError>;
