//! 置換検出
//!
//! 新しく選択したファイルと同じラベルの保存済み写真が同じリストにあれば、
//! その枠の中身を差し替え、古い写真を削除対象にする。

use crate::error::{Error, Result};
use crate::list::OrderedSlotList;
use crate::slot::{Blob, Category, GroupId, PhotoId, SlotIdentity};
use crate::state::{ListsState, SlotRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// 保存待ちのアップロード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpload {
    pub blob: Blob,
    pub file_name: String,
    pub label: Option<String>,
    pub group_id: GroupId,
    pub category: Category,
    pub order: usize,
}

impl PendingUpload {
    pub fn new(target: SlotRef, file_name: impl Into<String>, blob: Blob, label: Option<String>) -> Self {
        Self {
            blob,
            file_name: file_name.into(),
            label,
            group_id: target.group_id,
            category: target.category,
            order: target.position,
        }
    }

    pub fn target(&self) -> SlotRef {
        SlotRef::new(self.group_id, self.category, self.order)
    }

    /// ドラッグで枠が動いたときに追従させる
    pub(crate) fn retarget(&mut self, at: SlotRef) {
        self.group_id = at.group_id;
        self.category = at.category;
        self.order = at.position;
    }

    pub fn local_ref(&self) -> String {
        self.blob.local_ref()
    }

    fn identity(&self) -> SlotIdentity {
        SlotIdentity::pending(self.file_name.clone(), self.blob.clone())
    }
}

/// 置換される保存済みID → 差し替えるアップロード
pub type ReplacementMap = BTreeMap<PhotoId, PendingUpload>;

/// 削除対象の保存済みID
pub type DeletionSet = BTreeSet<PhotoId>;

/// アップロードの配置結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 指定した枠に配置
    Placed { position: usize },
    /// 同じラベルの保存済み写真を置換
    Replaced { replaced_id: PhotoId, position: usize },
}

/// 同じラベルの保存済み枠を検索（ラベルなしは一致しない）
pub fn detect_replacement(list: &OrderedSlotList, label: Option<&str>) -> Option<(usize, PhotoId)> {
    list.find_persisted_by_label(label?)
}

/// アップロードを適用した新しい状態を返す（不正な操作は無変更）
pub fn add_upload(mut state: ListsState, upload: PendingUpload) -> ListsState {
    if let Err(err) = try_add_upload(&mut state, upload) {
        debug!(%err, "upload rejected");
    }
    state
}

/// 選択されたファイルを枠に配置
///
/// ラベル未指定の場合は対象枠の現在のラベルを使う。
pub fn try_add_upload(state: &mut ListsState, mut upload: PendingUpload) -> Result<UploadOutcome> {
    let target = upload.target();
    let target_slot = state.slot(target)?.clone();
    if upload.label.is_none() {
        upload.label = target_slot.label.clone();
    }

    let list = state.list(target.group_id, target.category)?;
    if let Some((position, replaced_id)) = detect_replacement(list, upload.label.as_deref()) {
        upload.order = position;
        let identity = upload.identity();
        let label = upload.label.clone();

        let list = state.list_mut(target.group_id, target.category)?;
        list.put(position, identity, label);
        state.deletions_mut().insert(replaced_id);
        state.replacements_mut().insert(replaced_id, upload);

        info!(replaced_id, position, "photo queued to replace stored photo");
        return Ok(UploadOutcome::Replaced { replaced_id, position });
    }

    match &target_slot.identity {
        SlotIdentity::Persisted { .. } => {
            return Err(Error::SlotOccupied {
                group_id: target.group_id,
                category: target.category,
                position: target.position,
            })
        }
        SlotIdentity::Pending { local_ref, .. } => retarget_replacements(state, local_ref, &upload),
        SlotIdentity::Empty => {}
    }

    let identity = upload.identity();
    let label = upload.label.clone();
    state
        .list_mut(target.group_id, target.category)?
        .put(target.position, identity, label);

    debug!(?target, file_name = %upload.file_name, "photo queued for upload");
    Ok(UploadOutcome::Placed {
        position: target.position,
    })
}

/// 上書きされる未保存ファイルが置換中だった場合、新しいファイルに付け替える
fn retarget_replacements(state: &mut ListsState, old_ref: &str, upload: &PendingUpload) {
    for pending in state.replacements_mut().values_mut() {
        if pending.local_ref() == old_ref && pending.target() == upload.target() {
            *pending = upload.clone();
        }
    }
}
