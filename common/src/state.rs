//! 1レポート分の編集状態
//!
//! 全グループのリストと、保存まで保持する置換マップ・削除セット。

use crate::error::{Error, Result};
use crate::group::{GroupDef, PhotoGroup};
use crate::list::OrderedSlotList;
use crate::replacement::{DeletionSet, ReplacementMap};
use crate::slot::{Category, GroupId, PhotoId, Slot};
use crate::wire::PersistedPhoto;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// スロットの位置指定 (グループ, 区分, 位置)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRef {
    pub group_id: GroupId,
    pub category: Category,
    pub position: usize,
}

impl SlotRef {
    pub fn new(group_id: GroupId, category: Category, position: usize) -> Self {
        Self {
            group_id,
            category,
            position,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsState {
    groups: BTreeMap<GroupId, PhotoGroup>,
    #[serde(default)]
    replacements: ReplacementMap,
    #[serde(default)]
    deletions: DeletionSet,
}

impl ListsState {
    /// グループ定義から空き枠のみの状態を作成
    pub fn from_defs(defs: &[GroupDef]) -> Result<Self> {
        let mut groups = BTreeMap::new();
        for def in defs {
            let group = PhotoGroup::from_def(def)?;
            if groups.insert(def.id, group).is_some() {
                return Err(Error::InvalidGroup(format!("duplicate group id {}", def.id)));
            }
        }
        Ok(Self {
            groups,
            ..Default::default()
        })
    }

    /// グループ定義とサーバの記録から状態を構築
    ///
    /// 記録は (グループ, 配置先の区分, 順, ID) 順に配置する。
    /// アフターのみのグループでは、ビフォーの記録は本来のアフターの記録より後に置く。
    /// 枠が足りない記録・未定義グループの記録は警告して読み飛ばす。
    pub fn load(defs: &[GroupDef], records: &[PersistedPhoto]) -> Result<Self> {
        let mut state = Self::from_defs(defs)?;

        let mut sorted: Vec<&PersistedPhoto> = records.iter().collect();
        sorted.sort_by_key(|r| {
            let category = state
                .groups
                .get(&r.advanced_photo_id)
                .map_or(r.before_after_type, |g| g.effective_category(r.before_after_type));
            let misplaced = category != r.before_after_type;
            (r.advanced_photo_id, category, misplaced, r.order, r.uploaded_photo_id)
        });

        for record in sorted {
            let Some(group) = state.groups.get_mut(&record.advanced_photo_id) else {
                warn!(
                    photo_id = record.uploaded_photo_id,
                    group_id = record.advanced_photo_id,
                    "photo belongs to an unknown group, skipped"
                );
                continue;
            };

            let category = group.effective_category(record.before_after_type);
            if category != record.before_after_type {
                warn!(
                    photo_id = record.uploaded_photo_id,
                    group_id = record.advanced_photo_id,
                    "before photo in an after-only group, placed in after list"
                );
            }

            let placed = group
                .list_mut(category)
                .and_then(|list| list.place_persisted(record.uploaded_photo_id, record.label.clone(), record.order));
            if placed.is_none() {
                warn!(
                    photo_id = record.uploaded_photo_id,
                    group_id = record.advanced_photo_id,
                    %category,
                    "no free slot for photo, skipped"
                );
            }
        }

        Ok(state)
    }

    pub fn group(&self, id: GroupId) -> Option<&PhotoGroup> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut PhotoGroup> {
        self.groups.get_mut(&id)
    }

    /// グループID順に列挙
    pub fn groups(&self) -> impl Iterator<Item = &PhotoGroup> {
        self.groups.values()
    }

    pub fn list(&self, group_id: GroupId, category: Category) -> Result<&OrderedSlotList> {
        let group = self.group(group_id).ok_or(Error::UnknownGroup(group_id))?;
        group.list(category).ok_or(Error::MissingList { group_id, category })
    }

    pub fn list_mut(&mut self, group_id: GroupId, category: Category) -> Result<&mut OrderedSlotList> {
        let group = self.groups.get_mut(&group_id).ok_or(Error::UnknownGroup(group_id))?;
        group.list_mut(category).ok_or(Error::MissingList { group_id, category })
    }

    pub fn slot(&self, at: SlotRef) -> Result<&Slot> {
        let list = self.list(at.group_id, at.category)?;
        list.get(at.position).ok_or(Error::PositionOutOfRange {
            group_id: at.group_id,
            category: at.category,
            position: at.position,
            len: list.len(),
        })
    }

    /// 位置指定が有効かを検証
    pub fn check(&self, at: SlotRef) -> Result<()> {
        self.slot(at).map(|_| ())
    }

    pub fn replacements(&self) -> &ReplacementMap {
        &self.replacements
    }

    pub fn deletions(&self) -> &DeletionSet {
        &self.deletions
    }

    pub(crate) fn replacements_mut(&mut self) -> &mut ReplacementMap {
        &mut self.replacements
    }

    pub(crate) fn deletions_mut(&mut self) -> &mut DeletionSet {
        &mut self.deletions
    }

    /// いずれかのリストに保存済みIDが残っているか
    pub fn contains_persisted(&self, id: PhotoId) -> bool {
        self.groups
            .values()
            .flat_map(|g| g.lists())
            .any(|l| l.contains_persisted(id))
    }

    /// 保存成功後に置換マップ・削除セットを破棄
    pub fn clear_committed(&mut self) {
        self.replacements.clear();
        self.deletions.clear();
    }
}
