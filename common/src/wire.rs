//! 保存APIの入出力形式
//!
//! 削除 → アップロード → 更新 の順にサーバが適用する1回分の保存要求と、
//! サーバが保持する写真の記録。

use crate::slot::{Category, GroupId, PhotoId};
use serde::{Deserialize, Serialize};

/// サーバに保存済みの写真
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPhoto {
    pub uploaded_photo_id: PhotoId,
    pub advanced_photo_id: GroupId,
    pub before_after_type: Category,
    pub label: Option<String>,
    pub order: usize,
    #[serde(default)]
    pub file_name: String,
}

/// 既存写真の区分・ラベル・順の上書き
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    pub uploaded_photo_id: PhotoId,
    pub advanced_photo_id: GroupId,
    pub before_after_type: Category,
    pub label: Option<String>,
    pub order: usize,
}

/// 新規ファイル1件（IDはサーバが採番）
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadItem {
    #[serde(with = "base64_bytes")]
    pub file: Vec<u8>,
    pub advanced_photo_id: GroupId,
    pub before_after_type: Category,
    pub label: Option<String>,
    pub order: usize,
    pub file_name: String,
}

impl std::fmt::Debug for UploadItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadItem")
            .field("file", &format_args!("{} bytes", self.file.len()))
            .field("advanced_photo_id", &self.advanced_photo_id)
            .field("before_after_type", &self.before_after_type)
            .field("label", &self.label)
            .field("order", &self.order)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// 1回分の保存要求
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// 削除するuploadedPhotoId
    #[serde(default)]
    pub deletes: Vec<PhotoId>,
    #[serde(default)]
    pub uploads: Vec<UploadItem>,
    #[serde(default)]
    pub updates: Vec<UpdateItem>,
}

impl SaveRequest {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.uploads.is_empty() && self.updates.is_empty()
    }
}

/// バイト列をbase64文字列としてシリアライズ
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
