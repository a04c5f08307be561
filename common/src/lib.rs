//! Photo Slots Common Library
//!
//! ビフォー/アフター写真枠の編集エンジン（I/Oなし）
//!
//! - slot / list / group / state: 写真枠のデータモデル
//! - drag: 並べ替え・ビフォー⇔アフター移動
//! - replacement / edit: ファイル選択時の置換検出、削除・ラベル変更
//! - reconcile: 保存時の削除・アップロード・更新命令の計算
//! - wire: 保存APIの入出力形式

pub mod drag;
pub mod edit;
pub mod error;
pub mod group;
pub mod list;
pub mod reconcile;
pub mod replacement;
pub mod slot;
pub mod state;
pub mod wire;

pub use drag::{apply_drag, try_drag, DragEvent};
pub use edit::{remove_slot, try_relabel, try_remove};
pub use error::{Error, Result};
pub use group::{GroupDef, PhotoGroup};
pub use list::OrderedSlotList;
pub use reconcile::{reconcile, Baseline, SavePlan};
pub use replacement::{add_upload, try_add_upload, DeletionSet, PendingUpload, ReplacementMap, UploadOutcome};
pub use slot::{Blob, Category, GroupId, PhotoId, Slot, SlotIdentity};
pub use state::{ListsState, SlotRef};
pub use wire::{PersistedPhoto, SaveRequest, UpdateItem, UploadItem};
