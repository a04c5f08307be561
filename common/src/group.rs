//! 写真グループ
//!
//! プロジェクト設定の写真枠定義（GroupDef）と、
//! その定義から作られるビフォー/アフターのリスト組（PhotoGroup）。

use crate::error::{Error, Result};
use crate::list::OrderedSlotList;
use crate::slot::{Category, GroupId};
use serde::{Deserialize, Serialize};

/// 写真枠の定義（プロジェクト設定から読み取り専用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDef {
    #[serde(rename = "advancedPhotoId")]
    pub id: GroupId,
    #[serde(default)]
    pub supports_before_after: bool,
    pub max_slots_per_list: usize,
    /// 枠ごとの既定ラベル（ビフォー/アフター共通）
    #[serde(default)]
    pub default_labels: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoGroup {
    id: GroupId,
    supports_before_after: bool,
    max_slots_per_list: usize,
    before: Option<OrderedSlotList>,
    after: OrderedSlotList,
}

impl PhotoGroup {
    pub fn from_def(def: &GroupDef) -> Result<Self> {
        if def.max_slots_per_list == 0 {
            return Err(Error::InvalidGroup(format!(
                "group {} must have at least one slot per list",
                def.id
            )));
        }

        let before = def.supports_before_after.then(|| {
            OrderedSlotList::new(def.id, Category::Before, def.max_slots_per_list, &def.default_labels)
        });
        let after = OrderedSlotList::new(def.id, Category::After, def.max_slots_per_list, &def.default_labels);

        Ok(Self {
            id: def.id,
            supports_before_after: def.supports_before_after,
            max_slots_per_list: def.max_slots_per_list,
            before,
            after,
        })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn supports_before_after(&self) -> bool {
        self.supports_before_after
    }

    pub fn max_slots_per_list(&self) -> usize {
        self.max_slots_per_list
    }

    pub fn list(&self, category: Category) -> Option<&OrderedSlotList> {
        match category {
            Category::Before => self.before.as_ref(),
            Category::After => Some(&self.after),
        }
    }

    pub fn list_mut(&mut self, category: Category) -> Option<&mut OrderedSlotList> {
        match category {
            Category::Before => self.before.as_mut(),
            Category::After => Some(&mut self.after),
        }
    }

    /// 区分順（Before → After）に存在するリストを列挙
    pub fn lists(&self) -> impl Iterator<Item = &OrderedSlotList> {
        self.before.iter().chain(std::iter::once(&self.after))
    }

    /// 移動元・移動先のリストを同時に可変借用
    pub(crate) fn split_lists_mut(
        &mut self,
        from: Category,
    ) -> Option<(&mut OrderedSlotList, &mut OrderedSlotList)> {
        let before = self.before.as_mut()?;
        match from {
            Category::Before => Some((before, &mut self.after)),
            Category::After => Some((&mut self.after, before)),
        }
    }

    /// サーバ記録の区分をこのグループで扱える区分に揃える
    pub(crate) fn effective_category(&self, category: Category) -> Category {
        if self.supports_before_after {
            category
        } else {
            Category::After
        }
    }
}
