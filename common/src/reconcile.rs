//! 保存時の差分計算
//!
//! 全グループ・全リストを走査し、サーバ状態をクライアント状態に一致させる
//! 削除・アップロード・更新の命令を作る。
//! 命令は (グループ, 区分, 位置) 順、削除はID順で決定的に並ぶ。

use crate::replacement::ReplacementMap;
use crate::slot::{Blob, Category, GroupId, PhotoId, SlotIdentity};
use crate::state::{ListsState, SlotRef};
use crate::wire::{PersistedPhoto, SaveRequest, UpdateItem, UploadItem};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 保存済み写真の配置スナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub group_id: GroupId,
    pub category: Category,
    pub label: Option<String>,
    pub position: usize,
}

/// 読み込み時点のサーバ状態（変更のない保存済み枠を省くために使う）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baseline(BTreeMap<PhotoId, Placement>);

impl Baseline {
    /// サーバの記録から作成
    pub fn from_records(records: &[PersistedPhoto]) -> Self {
        Self(
            records
                .iter()
                .map(|r| {
                    let placement = Placement {
                        group_id: r.advanced_photo_id,
                        category: r.before_after_type,
                        label: r.label.clone(),
                        position: r.order,
                    };
                    (r.uploaded_photo_id, placement)
                })
                .collect(),
        )
    }

    /// 現在の状態をそのまま基準にする
    pub fn capture(state: &ListsState) -> Self {
        let mut placements = BTreeMap::new();
        for list in state.groups().flat_map(|g| g.lists()) {
            for slot in list {
                if let Some(id) = slot.persisted_id() {
                    placements.insert(
                        id,
                        Placement {
                            group_id: slot.group_id,
                            category: slot.category,
                            label: slot.label.clone(),
                            position: slot.position,
                        },
                    );
                }
            }
        }
        Self(placements)
    }

    pub fn get(&self, id: PhotoId) -> Option<&Placement> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstruction {
    pub id: PhotoId,
    pub group_id: GroupId,
    pub category: Category,
    pub label: Option<String>,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInstruction {
    pub blob: Blob,
    pub file_name: String,
    pub group_id: GroupId,
    pub category: Category,
    pub label: Option<String>,
    pub order: usize,
    /// 置換する保存済みID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<PhotoId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteInstruction {
    pub id: PhotoId,
}

/// 1回分の保存命令
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePlan {
    pub deletes: Vec<DeleteInstruction>,
    pub uploads: Vec<UploadInstruction>,
    pub updates: Vec<UpdateInstruction>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.uploads.is_empty() && self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.uploads.len() + self.updates.len()
    }

    /// サーバに送る形式に変換
    pub fn to_request(&self) -> SaveRequest {
        SaveRequest {
            deletes: self.deletes.iter().map(|d| d.id).collect(),
            uploads: self
                .uploads
                .iter()
                .map(|u| UploadItem {
                    file: u.blob.as_bytes().to_vec(),
                    advanced_photo_id: u.group_id,
                    before_after_type: u.category,
                    label: u.label.clone(),
                    order: u.order,
                    file_name: u.file_name.clone(),
                })
                .collect(),
            updates: self
                .updates
                .iter()
                .map(|u| UpdateItem {
                    uploaded_photo_id: u.id,
                    advanced_photo_id: u.group_id,
                    before_after_type: u.category,
                    label: u.label.clone(),
                    order: u.order,
                })
                .collect(),
        }
    }
}

/// 現在の状態と基準から保存命令を作る
pub fn reconcile(state: &ListsState, baseline: &Baseline) -> SavePlan {
    let mut plan = SavePlan::default();
    let mut present = BTreeSet::new();

    for group in state.groups() {
        for list in group.lists() {
            for slot in list {
                match &slot.identity {
                    SlotIdentity::Empty => {}
                    SlotIdentity::Persisted { id } => {
                        present.insert(*id);
                        let current = Placement {
                            group_id: slot.group_id,
                            category: slot.category,
                            label: slot.label.clone(),
                            position: slot.position,
                        };
                        if baseline.get(*id) == Some(&current) {
                            continue;
                        }
                        plan.updates.push(UpdateInstruction {
                            id: *id,
                            group_id: slot.group_id,
                            category: slot.category,
                            label: slot.label.clone(),
                            order: slot.position,
                        });
                    }
                    SlotIdentity::Pending {
                        local_ref,
                        file_name,
                        blob,
                    } => {
                        plan.uploads.push(UploadInstruction {
                            blob: blob.clone(),
                            file_name: file_name.clone(),
                            group_id: slot.group_id,
                            category: slot.category,
                            label: slot.label.clone(),
                            order: slot.position,
                            replaces: replaced_by(
                                state.replacements(),
                                local_ref,
                                SlotRef::new(slot.group_id, slot.category, slot.position),
                            ),
                        });
                    }
                }
            }
        }
    }

    plan.deletes = state
        .deletions()
        .iter()
        .filter(|id| !present.contains(id))
        .map(|&id| DeleteInstruction { id })
        .collect();

    debug!(
        deletes = plan.deletes.len(),
        uploads = plan.uploads.len(),
        updates = plan.updates.len(),
        "save plan reconciled"
    );
    plan
}

fn replaced_by(
    replacements: &ReplacementMap,
    local_ref: &str,
    at: SlotRef,
) -> Option<PhotoId> {
    replacements
        .iter()
        .find(|(_, u)| u.target() == at && u.local_ref() == local_ref)
        .map(|(id, _)| *id)
}
