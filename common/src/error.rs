//! エラー型定義
//!
//! ドラッグ・アップロード・削除操作の検証エラー。
//! いずれも状態を変更する前に検出される。

use crate::slot::{Category, GroupId};
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown photo group: {0}")]
    UnknownGroup(GroupId),

    #[error("Photo group {group_id} has no {category} list")]
    MissingList { group_id: GroupId, category: Category },

    #[error("Position {position} is out of range for {category} list of group {group_id} (len {len})")]
    PositionOutOfRange {
        group_id: GroupId,
        category: Category,
        position: usize,
        len: usize,
    },

    #[error("No photo at {category}:{position} in group {group_id}")]
    EmptySource {
        group_id: GroupId,
        category: Category,
        position: usize,
    },

    #[error("Cannot move photos between groups {from_group} and {to_group}")]
    CrossGroup { from_group: GroupId, to_group: GroupId },

    #[error("Slot {category}:{position} in group {group_id} already holds a stored photo")]
    SlotOccupied {
        group_id: GroupId,
        category: Category,
        position: usize,
    },

    #[error("Invalid group definition: {0}")]
    InvalidGroup(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
