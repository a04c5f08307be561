//! JSONファイルによるローカル保存先
//!
//! `store.json` に写真の記録を、`blobs/` にファイル本体（SHA-256名）を置く。
//! 保存要求は複製に対して適用し、すべて成功した場合のみ書き戻す。

use super::{PersistenceGateway, SaveReceipt};
use crate::error::{Result, SlotsError};
use photo_slots_common::{Blob, Category, GroupId, PersistedPhoto, PhotoId, SaveRequest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STORE_FILE_NAME: &str = "store.json";
const BLOB_DIR_NAME: &str = "blobs";

/// ストアファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    /// バージョン（互換性チェック用）
    version: u32,
    next_id: PhotoId,
    /// レポートID → 写真の記録
    reports: BTreeMap<u64, Vec<StoredPhoto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPhoto {
    #[serde(flatten)]
    photo: PersistedPhoto,
    blob_hash: String,
}

impl StoreFile {
    const CURRENT_VERSION: u32 = 1;
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            next_id: 1,
            reports: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonStoreGateway {
    root: PathBuf,
}

impl JsonStoreGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILE_NAME)
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.root.join(BLOB_DIR_NAME).join(hash)
    }

    /// 保存済み写真のファイル本体を読み込み
    pub fn read_blob(&self, report_id: u64, photo_id: PhotoId) -> Result<Vec<u8>> {
        let store = self.load()?;
        let stored = store
            .reports
            .get(&report_id)
            .and_then(|photos| photos.iter().find(|p| p.photo.uploaded_photo_id == photo_id))
            .ok_or_else(|| SlotsError::Persistence(format!("写真{}が存在しません", photo_id)))?;
        Ok(std::fs::read(self.blob_path(&stored.blob_hash))?)
    }

    fn load(&self) -> Result<StoreFile> {
        let path = self.store_path();
        if !path.exists() {
            return Ok(StoreFile::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let store: StoreFile = serde_json::from_str(&content)
            .map_err(|e| SlotsError::Persistence(format!("ストアの読み込みに失敗: {}", e)))?;
        if store.version != StoreFile::CURRENT_VERSION {
            return Err(SlotsError::Persistence(format!(
                "ストアのバージョンが不一致です: {}",
                store.version
            )));
        }
        Ok(store)
    }

    /// 一時ファイルに書いてから置き換える
    fn write(&self, store: &StoreFile) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.store_path();
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(store)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn write_blobs(&self, blobs: &[(String, Vec<u8>)]) -> Result<()> {
        if blobs.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(self.root.join(BLOB_DIR_NAME))?;
        for (hash, bytes) in blobs {
            let path = self.blob_path(hash);
            if !path.exists() {
                std::fs::write(path, bytes)?;
            }
        }
        Ok(())
    }
}

impl PersistenceGateway for JsonStoreGateway {
    async fn fetch(&self, report_id: u64) -> Result<Vec<PersistedPhoto>> {
        let store = self.load()?;
        let photos = store
            .reports
            .get(&report_id)
            .map(|photos| photos.iter().map(|p| p.photo.clone()).collect())
            .unwrap_or_default();
        Ok(photos)
    }

    async fn apply(&self, report_id: u64, request: &SaveRequest) -> Result<SaveReceipt> {
        let store = self.load()?;
        let (next, blobs, receipt) = apply_request(&store, report_id, request)?;

        self.write_blobs(&blobs)?;
        self.write(&next)?;

        info!(
            report_id,
            deleted = receipt.deleted,
            created = receipt.created.len(),
            updated = receipt.updated,
            "save applied to store"
        );
        Ok(receipt)
    }
}

/// 削除 → アップロード → 更新 の順に適用した新しいストアを返す
fn apply_request(
    store: &StoreFile,
    report_id: u64,
    request: &SaveRequest,
) -> Result<(StoreFile, Vec<(String, Vec<u8>)>, SaveReceipt)> {
    let mut next = store.clone();
    let photos = next.reports.entry(report_id).or_default();

    for id in &request.deletes {
        let index = photos
            .iter()
            .position(|p| p.photo.uploaded_photo_id == *id)
            .ok_or_else(|| SlotsError::Persistence(format!("削除対象の写真{}が存在しません", id)))?;
        photos.remove(index);
        debug!(photo_id = id, "deleted");
    }

    let mut blobs = Vec::new();
    let mut created = Vec::new();
    for item in &request.uploads {
        let id = next.next_id;
        next.next_id += 1;

        let blob_hash = Blob::new(item.file.clone()).content_hash();
        blobs.push((blob_hash.clone(), item.file.clone()));
        photos.push(StoredPhoto {
            photo: PersistedPhoto {
                uploaded_photo_id: id,
                advanced_photo_id: item.advanced_photo_id,
                before_after_type: item.before_after_type,
                label: item.label.clone(),
                order: item.order,
                file_name: item.file_name.clone(),
            },
            blob_hash,
        });
        created.push(id);
        debug!(photo_id = id, file_name = %item.file_name, "uploaded");
    }

    for item in &request.updates {
        let stored = photos
            .iter_mut()
            .find(|p| p.photo.uploaded_photo_id == item.uploaded_photo_id)
            .ok_or_else(|| {
                SlotsError::Persistence(format!("更新対象の写真{}が存在しません", item.uploaded_photo_id))
            })?;
        stored.photo.advanced_photo_id = item.advanced_photo_id;
        stored.photo.before_after_type = item.before_after_type;
        stored.photo.label = item.label.clone();
        stored.photo.order = item.order;
    }

    check_unique_labels(photos)?;

    let receipt = SaveReceipt {
        created,
        updated: request.updates.len(),
        deleted: request.deletes.len(),
        saved_at: chrono::Utc::now(),
    };
    Ok((next, blobs, receipt))
}

/// (グループ, 区分, ラベル) は一意。ラベルなしは対象外
fn check_unique_labels(photos: &[StoredPhoto]) -> Result<()> {
    let mut seen: HashSet<(GroupId, Category, &str)> = HashSet::new();
    for p in photos {
        if let Some(label) = p.photo.label.as_deref() {
            if !seen.insert((p.photo.advanced_photo_id, p.photo.before_after_type, label)) {
                return Err(SlotsError::Persistence(format!(
                    "グループ{}の{}にラベル「{}」が重複しています",
                    p.photo.advanced_photo_id, p.photo.before_after_type, label
                )));
            }
        }
    }
    Ok(())
}
