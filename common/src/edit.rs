//! 枠の削除・ラベル変更

use crate::error::Result;
use crate::slot::SlotIdentity;
use crate::state::{ListsState, SlotRef};
use tracing::debug;

/// 枠を空にする
///
/// 保存済み写真は削除対象へ。未保存ファイルは破棄し、
/// そのファイルを指していた置換エントリも外す（置換元の削除は維持）。
/// 取り除いた中身を返す。
pub fn try_remove(state: &mut ListsState, at: SlotRef) -> Result<SlotIdentity> {
    state.check(at)?;

    let list = state.list_mut(at.group_id, at.category)?;
    let removed = list.take(at.position).identity;

    match &removed {
        SlotIdentity::Persisted { id } => {
            state.deletions_mut().insert(*id);
            debug!(photo_id = id, ?at, "stored photo marked for deletion");
        }
        SlotIdentity::Pending { local_ref, .. } => {
            state
                .replacements_mut()
                .retain(|_, upload| !(upload.target() == at && &upload.local_ref() == local_ref));
            debug!(?at, "pending photo discarded");
        }
        SlotIdentity::Empty => {}
    }

    Ok(removed)
}

/// 削除を適用した新しい状態を返す（不正な操作は無変更）
pub fn remove_slot(mut state: ListsState, at: SlotRef) -> ListsState {
    if let Err(err) = try_remove(&mut state, at) {
        debug!(%err, "remove rejected");
    }
    state
}

/// 枠のラベルを変更（None で消去）。置換検出は行わない
pub fn try_relabel(state: &mut ListsState, at: SlotRef, label: Option<String>) -> Result<()> {
    state.check(at)?;
    let list = state.list_mut(at.group_id, at.category)?;
    if let Some(slot) = list.slot_mut(at.position) {
        slot.label = label;
    }
    Ok(())
}
