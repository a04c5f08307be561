//! ドラッグ＆ドロップによる並べ替え・移動
//!
//! - 同一リスト内: 取り出して挿入し、間の枠のラベルを1つずつずらす
//! - ビフォー⇔アフター間: 移動先の枠と位置同士で入れ替える
//!
//! 検証は変更前にすべて行う。検証に通らないジェスチャーは何もしない。

use crate::error::{Error, Result};
use crate::list::OrderedSlotList;
use crate::state::{ListsState, SlotRef};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// ドラッグ操作 (移動元 → 移動先)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEvent {
    pub from: SlotRef,
    pub to: SlotRef,
}

impl DragEvent {
    pub fn new(from: SlotRef, to: SlotRef) -> Self {
        Self { from, to }
    }

    pub fn is_intra_list(&self) -> bool {
        self.from.category == self.to.category
    }
}

/// ドラッグを適用した新しい状態を返す
///
/// 不正な操作は状態をそのまま返す（UIでは起こり得ない操作として扱う）。
pub fn apply_drag(mut state: ListsState, event: &DragEvent) -> ListsState {
    if let Err(err) = try_drag(&mut state, event) {
        debug!(?event, %err, "drag rejected");
    }
    state
}

/// ドラッグを適用。不正な操作は何も変更せずにエラーを返す
pub fn try_drag(state: &mut ListsState, event: &DragEvent) -> Result<()> {
    validate(state, event)?;

    let DragEvent { from, to } = *event;
    if event.is_intra_list() {
        if from.position == to.position {
            return Ok(());
        }
        let list = state.list_mut(from.group_id, from.category)?;
        move_within(list, from.position, to.position);
    } else {
        let group = state.group_mut(from.group_id).ok_or(Error::UnknownGroup(from.group_id))?;
        let (source, target) = group.split_lists_mut(from.category).ok_or(Error::MissingList {
            group_id: from.group_id,
            category: to.category,
        })?;
        transfer(source, from.position, target, to.position);
    }

    for upload in state.replacements_mut().values_mut() {
        upload.retarget(relocate(event, upload.target()));
    }

    debug!(?from, ?to, "drag applied");
    Ok(())
}

fn validate(state: &ListsState, event: &DragEvent) -> Result<()> {
    let DragEvent { from, to } = *event;
    if from.group_id != to.group_id {
        return Err(Error::CrossGroup {
            from_group: from.group_id,
            to_group: to.group_id,
        });
    }

    let source = state.slot(from)?;
    state.check(to)?;

    if source.is_empty() {
        return Err(Error::EmptySource {
            group_id: from.group_id,
            category: from.category,
            position: from.position,
        });
    }
    Ok(())
}

/// 同一リスト内の移動
///
/// 移動した枠は元のラベルを持ったまま移動先へ。
/// 間にある枠は、移動前に1つ移動先側にあった位置のラベルを受け取る。
/// 範囲外の枠は変更しない。
fn move_within(list: &mut OrderedSlotList, from: usize, to: usize) {
    let labels = list.labels();

    let slots = list.slots_mut();
    let moved = slots.remove(from);
    slots.insert(to, moved);

    if from < to {
        for i in from..to {
            slots[i].label = labels[i + 1].clone();
        }
    } else {
        for i in (to + 1..=from).rev() {
            slots[i].label = labels[i - 1].clone();
        }
    }
    slots[to].label = labels[from].clone();

    list.renumber();
}

/// 移動前の枠位置が移動後にどこへ行ったか
fn relocate(event: &DragEvent, at: SlotRef) -> SlotRef {
    let DragEvent { from, to } = *event;
    if at.group_id != from.group_id {
        return at;
    }
    if !event.is_intra_list() {
        return if at == from {
            to
        } else if at == to {
            from
        } else {
            at
        };
    }
    if at.category != from.category {
        return at;
    }

    let p = at.position;
    let position = if p == from.position {
        to.position
    } else if from.position < to.position && p > from.position && p <= to.position {
        p - 1
    } else if to.position < from.position && p >= to.position && p < from.position {
        p + 1
    } else {
        p
    };
    SlotRef::new(at.group_id, at.category, position)
}

/// リスト間の移動（位置同士の入れ替え）
fn transfer(source: &mut OrderedSlotList, from: usize, target: &mut OrderedSlotList, to: usize) {
    let dragged = source.take(from);
    let occupant = target.take(to);

    target.put(to, dragged.identity, dragged.label);
    if !occupant.is_empty() {
        source.put(from, occupant.identity, occupant.label);
    }

    source.renumber();
    target.renumber();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupDef;
    use crate::slot::{Category, SlotIdentity};
    use crate::wire::PersistedPhoto;
    use proptest::prelude::*;

    fn persisted(id: u64, group: u64, category: Category, order: usize, label: Option<&str>) -> PersistedPhoto {
        PersistedPhoto {
            uploaded_photo_id: id,
            advanced_photo_id: group,
            before_after_type: category,
            label: label.map(String::from),
            order,
            file_name: format!("{}.jpg", id),
        }
    }

    fn def(id: u64, slots: usize) -> GroupDef {
        GroupDef {
            id,
            supports_before_after: true,
            max_slots_per_list: slots,
            default_labels: vec![],
        }
    }

    fn ids(state: &ListsState, group: u64, category: Category) -> Vec<Option<u64>> {
        state
            .list(group, category)
            .expect("リストなし")
            .iter()
            .map(|s| s.persisted_id())
            .collect()
    }

    fn labels(state: &ListsState, group: u64, category: Category) -> Vec<Option<String>> {
        state.list(group, category).expect("リストなし").labels()
    }

    fn at(group: u64, category: Category, position: usize) -> SlotRef {
        SlotRef::new(group, category, position)
    }

    /// G1: Before=[A("Front"), B("Side")], After=[C("Front-done"), 空]
    fn scenario_g1() -> ListsState {
        let records = vec![
            persisted(1, 1, Category::Before, 0, Some("Front")),
            persisted(2, 1, Category::Before, 1, Some("Side")),
            persisted(3, 1, Category::After, 0, Some("Front-done")),
        ];
        ListsState::load(&[def(1, 2)], &records).expect("読み込み失敗")
    }

    #[test]
    fn test_cross_list_drop_on_empty_slot() {
        let state = scenario_g1();
        let event = DragEvent::new(at(1, Category::Before, 0), at(1, Category::After, 1));
        let state = apply_drag(state, &event);

        assert_eq!(ids(&state, 1, Category::Before), vec![None, Some(2)]);
        assert_eq!(labels(&state, 1, Category::Before), vec![None, Some("Side".to_string())]);
        assert_eq!(ids(&state, 1, Category::After), vec![Some(3), Some(1)]);
        assert_eq!(
            labels(&state, 1, Category::After),
            vec![Some("Front-done".to_string()), Some("Front".to_string())]
        );

        let moved = state.slot(at(1, Category::After, 1)).expect("枠なし");
        assert_eq!(moved.category, Category::After);
        assert_eq!(moved.position, 1);
    }

    #[test]
    fn test_cross_list_swap_with_occupant() {
        let state = scenario_g1();
        let event = DragEvent::new(at(1, Category::Before, 1), at(1, Category::After, 0));
        let state = apply_drag(state, &event);

        // B は after:0 へ、C は before:1 へ。それぞれ自分のラベルを保持
        assert_eq!(ids(&state, 1, Category::Before), vec![Some(1), Some(3)]);
        assert_eq!(ids(&state, 1, Category::After), vec![Some(2), None]);
        let swapped = state.slot(at(1, Category::Before, 1)).expect("枠なし");
        assert_eq!(swapped.label.as_deref(), Some("Front-done"));
        assert_eq!(swapped.category, Category::Before);
        let dragged = state.slot(at(1, Category::After, 0)).expect("枠なし");
        assert_eq!(dragged.label.as_deref(), Some("Side"));
    }

    #[test]
    fn test_intra_list_forward_move() {
        let records = vec![
            persisted(1, 1, Category::After, 0, Some("a")),
            persisted(2, 1, Category::After, 1, Some("b")),
            persisted(3, 1, Category::After, 2, Some("c")),
            persisted(4, 1, Category::After, 3, Some("d")),
        ];
        let mut state = ListsState::load(&[def(1, 4)], &records).expect("読み込み失敗");
        try_drag(&mut state, &DragEvent::new(at(1, Category::After, 0), at(1, Category::After, 2)))
            .expect("移動失敗");

        assert_eq!(ids(&state, 1, Category::After), vec![Some(2), Some(3), Some(1), Some(4)]);
        let expected: Vec<Option<String>> = ["b", "c", "a", "d"].iter().map(|s| Some(s.to_string())).collect();
        assert_eq!(labels(&state, 1, Category::After), expected);
    }

    #[test]
    fn test_intra_list_backward_move() {
        let records = vec![
            persisted(1, 1, Category::After, 0, Some("a")),
            persisted(2, 1, Category::After, 1, Some("b")),
            persisted(3, 1, Category::After, 2, None),
        ];
        let mut state = ListsState::load(&[def(1, 3)], &records).expect("読み込み失敗");
        try_drag(&mut state, &DragEvent::new(at(1, Category::After, 2), at(1, Category::After, 0)))
            .expect("移動失敗");

        assert_eq!(ids(&state, 1, Category::After), vec![Some(3), Some(1), Some(2)]);
        assert_eq!(
            labels(&state, 1, Category::After),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn test_intra_list_move_onto_empty_slot() {
        let records = vec![persisted(1, 1, Category::After, 0, Some("a"))];
        let mut state = ListsState::load(&[def(1, 3)], &records).expect("読み込み失敗");
        try_drag(&mut state, &DragEvent::new(at(1, Category::After, 0), at(1, Category::After, 2)))
            .expect("移動失敗");

        assert_eq!(ids(&state, 1, Category::After), vec![None, None, Some(1)]);
        assert_eq!(labels(&state, 1, Category::After)[2].as_deref(), Some("a"));
    }

    #[test]
    fn test_cross_group_drag_is_noop() {
        let state = ListsState::load(&[def(1, 2), def(2, 2)], &[persisted(1, 1, Category::After, 0, Some("a"))])
            .expect("読み込み失敗");
        let before = state.clone();

        let event = DragEvent::new(at(1, Category::After, 0), at(2, Category::After, 0));
        let mut mutable = state.clone();
        assert_eq!(
            try_drag(&mut mutable, &event),
            Err(Error::CrossGroup { from_group: 1, to_group: 2 })
        );
        assert_eq!(mutable, before);
        assert_eq!(apply_drag(state, &event), before);
    }

    #[test]
    fn test_drag_from_empty_slot_rejected() {
        let mut state = scenario_g1();
        let before = state.clone();
        let event = DragEvent::new(at(1, Category::After, 1), at(1, Category::After, 0));
        assert!(matches!(try_drag(&mut state, &event), Err(Error::EmptySource { .. })));
        assert_eq!(state, before);
    }

    #[test]
    fn test_cross_list_in_after_only_group_rejected() {
        let defs = [GroupDef {
            id: 5,
            supports_before_after: false,
            max_slots_per_list: 2,
            default_labels: vec![],
        }];
        let mut state = ListsState::load(&defs, &[persisted(1, 5, Category::After, 0, None)]).expect("読み込み失敗");
        let event = DragEvent::new(at(5, Category::After, 0), at(5, Category::Before, 0));
        assert!(matches!(try_drag(&mut state, &event), Err(Error::MissingList { .. })));
    }

    #[test]
    fn test_out_of_range_target_rejected() {
        let mut state = scenario_g1();
        let event = DragEvent::new(at(1, Category::Before, 0), at(1, Category::Before, 5));
        assert!(matches!(try_drag(&mut state, &event), Err(Error::PositionOutOfRange { .. })));
    }

    // =============================================
    // 性質テスト
    // =============================================

    const LABELS: [&str; 4] = ["Front", "Side", "Back", "Top"];

    /// 枠数・中身（保存済みIDまたは空）・ラベルのランダムなリスト
    fn arb_list() -> impl Strategy<Value = Vec<(bool, Option<usize>)>> {
        prop::collection::vec((any::<bool>(), prop::option::of(0..LABELS.len())), 1..7)
    }

    fn build_state(before: &[(bool, Option<usize>)], after: &[(bool, Option<usize>)]) -> ListsState {
        let slots = before.len().max(after.len());
        let mut records = Vec::new();
        let mut next_id = 100;
        for (category, cells) in [(Category::Before, before), (Category::After, after)] {
            for (order, (occupied, label)) in cells.iter().enumerate() {
                if *occupied {
                    records.push(persisted(next_id, 1, category, order, label.map(|i| LABELS[i])));
                    next_id += 1;
                }
            }
        }
        ListsState::load(&[def(1, slots)], &records).expect("読み込み失敗")
    }

    fn sorted(mut v: Vec<SlotIdentity>) -> Vec<String> {
        let mut out: Vec<String> = v.drain(..).map(|i| format!("{:?}", i)).collect();
        out.sort();
        out
    }

    proptest! {
        #[test]
        fn prop_intra_list_move_keeps_contents_and_shifts_labels(
            cells in arb_list(),
            from_seed in any::<usize>(),
            to_seed in any::<usize>(),
        ) {
            let mut state = build_state(&[], &cells);
            let len = cells.len();
            let (from, to) = (from_seed % len, to_seed % len);
            prop_assume!(cells[from].0);

            let list_before = state.list(1, Category::After).unwrap().clone();
            let labels_before = list_before.labels();

            try_drag(&mut state, &DragEvent::new(at(1, Category::After, from), at(1, Category::After, to))).unwrap();
            let list_after = state.list(1, Category::After).unwrap();

            // 中身の多重集合は不変
            prop_assert_eq!(sorted(list_before.identities()), sorted(list_after.identities()));
            prop_assert_eq!(list_after.len(), len);

            // 移動した枠は移動前のラベルを保持
            prop_assert_eq!(&list_after.slots()[to].label, &labels_before[from]);
            prop_assert_eq!(&list_after.slots()[to].identity, &list_before.slots()[from].identity);

            // 間の枠は1つ移動先側の位置にあったラベルを受け取る。範囲外は不変
            for (i, slot) in list_after.iter().enumerate() {
                prop_assert_eq!(slot.position, i);
                if from < to && i >= from && i < to {
                    prop_assert_eq!(&slot.label, &labels_before[i + 1]);
                } else if from > to && i > to && i <= from {
                    prop_assert_eq!(&slot.label, &labels_before[i - 1]);
                } else if i != to {
                    prop_assert_eq!(&slot.label, &labels_before[i]);
                    prop_assert_eq!(&slot.identity, &list_before.slots()[i].identity);
                }
            }
        }

        #[test]
        fn prop_cross_list_move_swaps_position_for_position(
            before in arb_list(),
            after in arb_list(),
            from_seed in any::<usize>(),
            to_seed in any::<usize>(),
        ) {
            let state = build_state(&before, &after);
            let len = state.group(1).unwrap().max_slots_per_list();
            let (from, to) = (from_seed % len, to_seed % len);
            let source = state.slot(at(1, Category::Before, from)).unwrap().clone();
            prop_assume!(!source.is_empty());
            let occupant = state.slot(at(1, Category::After, to)).unwrap().clone();

            let next = apply_drag(state, &DragEvent::new(at(1, Category::Before, from), at(1, Category::After, to)));

            prop_assert_eq!(next.list(1, Category::Before).unwrap().len(), len);
            prop_assert_eq!(next.list(1, Category::After).unwrap().len(), len);

            let landed = next.slot(at(1, Category::After, to)).unwrap();
            prop_assert_eq!(&landed.identity, &source.identity);
            prop_assert_eq!(&landed.label, &source.label);
            prop_assert_eq!(landed.category, Category::After);

            let vacated = next.slot(at(1, Category::Before, from)).unwrap();
            if occupant.is_empty() {
                prop_assert!(vacated.is_empty());
            } else {
                prop_assert_eq!(&vacated.identity, &occupant.identity);
                prop_assert_eq!(&vacated.label, &occupant.label);
                prop_assert_eq!(vacated.category, Category::Before);
            }
        }
    }
}
