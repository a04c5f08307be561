//! 順序付きスロットリスト
//!
//! (グループ, 区分) ごとに1つ。長さはグループの枠数で固定され、
//! 空き枠も含めて position は常に 0..len-1 に詰まっている。

use crate::slot::{Category, GroupId, PhotoId, Slot, SlotIdentity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedSlotList {
    group_id: GroupId,
    category: Category,
    slots: Vec<Slot>,
}

impl OrderedSlotList {
    /// 空き枠のみのリストを作成（既定ラベルは枠ごとに割り当て）
    pub fn new(
        group_id: GroupId,
        category: Category,
        capacity: usize,
        default_labels: &[Option<String>],
    ) -> Self {
        let slots = (0..capacity)
            .map(|i| {
                let label = default_labels.get(i).cloned().flatten();
                Slot::empty(group_id, category, i, label)
            })
            .collect();
        Self {
            group_id,
            category,
            slots,
        }
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Slot> {
        self.slots.get(position)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    /// 各枠のラベル（position順）
    pub fn labels(&self) -> Vec<Option<String>> {
        self.slots.iter().map(|s| s.label.clone()).collect()
    }

    /// 各枠の中身（position順）
    pub fn identities(&self) -> Vec<SlotIdentity> {
        self.slots.iter().map(|s| s.identity.clone()).collect()
    }

    /// 指定ラベルを持つ保存済み枠を検索
    pub fn find_persisted_by_label(&self, label: &str) -> Option<(usize, PhotoId)> {
        self.slots.iter().find_map(|slot| match (&slot.identity, &slot.label) {
            (SlotIdentity::Persisted { id }, Some(l)) if l == label => Some((slot.position, *id)),
            _ => None,
        })
    }

    pub fn contains_persisted(&self, id: PhotoId) -> bool {
        self.slots.iter().any(|s| s.persisted_id() == Some(id))
    }

    pub(crate) fn slots_mut(&mut self) -> &mut Vec<Slot> {
        &mut self.slots
    }

    pub(crate) fn slot_mut(&mut self, position: usize) -> Option<&mut Slot> {
        self.slots.get_mut(position)
    }

    /// 枠の中身を取り出し、ラベルなしの空き枠を残す
    pub(crate) fn take(&mut self, position: usize) -> Slot {
        let empty = Slot::empty(self.group_id, self.category, position, None);
        std::mem::replace(&mut self.slots[position], empty)
    }

    /// 中身とラベルを枠に置く（区分・グループはこのリストのものになる）
    pub(crate) fn put(&mut self, position: usize, identity: SlotIdentity, label: Option<String>) {
        self.slots[position] = Slot {
            identity,
            label,
            category: self.category,
            position,
            group_id: self.group_id,
        };
    }

    /// サーバの記録を配置。希望順が埋まっていれば最初の空き枠へ
    pub(crate) fn place_persisted(
        &mut self,
        id: PhotoId,
        label: Option<String>,
        preferred: usize,
    ) -> Option<usize> {
        let position = match self.slots.get(preferred) {
            Some(slot) if slot.is_empty() => preferred,
            _ => self.slots.iter().position(|s| s.is_empty())?,
        };
        self.put(position, SlotIdentity::Persisted { id }, label);
        Some(position)
    }

    /// position を現在の添字に振り直す
    pub(crate) fn renumber(&mut self) {
        let (group_id, category) = (self.group_id, self.category);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.position = i;
            slot.category = category;
            slot.group_id = group_id;
        }
    }
}

impl<'a> IntoIterator for &'a OrderedSlotList {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
