//! スロットの型定義
//!
//! - Category: ビフォー/アフターの区分
//! - Blob: 未保存ファイルの生データ
//! - SlotIdentity: スロットの中身（保存済み/未保存/空）
//! - Slot: 順序付きリストの1枠

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// サーバ側で採番される写真ID（uploadedPhotoId）
pub type PhotoId = u64;

/// 写真グループID（advancedPhotoId）
pub type GroupId = u64;

/// ビフォー/アフター区分
///
/// 並び順は Before < After（保存命令の決定的な順序に使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Before,
    After,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Before, Category::After];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Before => "before",
            Category::After => "after",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" | "b" => Ok(Category::Before),
            "after" | "a" => Ok(Category::After),
            _ => Err(format!("Unknown category: {}. Use before or after", s)),
        }
    }
}

/// 未保存ファイルの生データ
///
/// セッションファイルにはbase64で書き出す
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(#[serde(with = "crate::wire::base64_bytes")] Vec<u8>);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256ダイジェスト（16進）
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.0))
    }

    /// ローカル参照ID（ダイジェスト先頭16文字）
    pub fn local_ref(&self) -> String {
        let mut hash = self.content_hash();
        hash.truncate(16);
        hash
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes)", self.0.len())
    }
}

/// スロットの中身
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SlotIdentity {
    /// サーバに保存済み
    Persisted { id: PhotoId },
    /// 選択済み・未保存
    #[serde(rename_all = "camelCase")]
    Pending {
        local_ref: String,
        file_name: String,
        blob: Blob,
    },
    #[default]
    Empty,
}

impl SlotIdentity {
    pub fn pending(file_name: impl Into<String>, blob: Blob) -> Self {
        SlotIdentity::Pending {
            local_ref: blob.local_ref(),
            file_name: file_name.into(),
            blob,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotIdentity::Empty)
    }

    pub fn persisted_id(&self) -> Option<PhotoId> {
        match self {
            SlotIdentity::Persisted { id } => Some(*id),
            _ => None,
        }
    }

    pub fn local_ref(&self) -> Option<&str> {
        match self {
            SlotIdentity::Pending { local_ref, .. } => Some(local_ref),
            _ => None,
        }
    }
}

/// 順序付きリストの1枠
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub identity: SlotIdentity,
    pub label: Option<String>,
    pub category: Category,
    pub position: usize,
    pub group_id: GroupId,
}

impl Slot {
    pub fn empty(group_id: GroupId, category: Category, position: usize, label: Option<String>) -> Self {
        Self {
            identity: SlotIdentity::Empty,
            label,
            category,
            position,
            group_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }

    pub fn persisted_id(&self) -> Option<PhotoId> {
        self.identity.persisted_id()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            SlotIdentity::Persisted { id } => write!(f, "#{}", id)?,
            SlotIdentity::Pending { file_name, .. } => write!(f, "+{}", file_name)?,
            SlotIdentity::Empty => write!(f, "(empty)")?,
        }
        if let Some(label) = &self.label {
            write!(f, " \"{}\"", label)?;
        }
        Ok(())
    }
}
