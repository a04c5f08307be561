//! 編集セッションの保存テスト
//!
//! ローカル保存先を使い、編集 → 保存 → 読み直し の流れを検証

use photo_slots::error::{Result, SlotsError};
use photo_slots::gateway::{JsonStoreGateway, PersistenceGateway, SaveReceipt};
use photo_slots::project::ProjectConfig;
use photo_slots::session::{EditSession, SaveOutcome};
use photo_slots_common::{
    Category, DragEvent, GroupDef, PersistedPhoto, SaveRequest, SlotIdentity, SlotRef, UploadItem, UploadOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::tempdir;

const REPORT: u64 = 1;
const GROUP: u64 = 10;
const TIMEOUT: Duration = Duration::from_secs(5);

fn project() -> ProjectConfig {
    ProjectConfig {
        report_id: REPORT,
        groups: vec![
            GroupDef {
                id: GROUP,
                supports_before_after: true,
                max_slots_per_list: 2,
                default_labels: vec![],
            },
            GroupDef {
                id: 20,
                supports_before_after: false,
                max_slots_per_list: 3,
                default_labels: vec![Some("Overview".into())],
            },
        ],
    }
}

fn seed_item(category: Category, order: usize, label: &str) -> UploadItem {
    UploadItem {
        file: format!("{}-bytes", label).into_bytes(),
        advanced_photo_id: GROUP,
        before_after_type: category,
        label: Some(label.to_string()),
        order,
        file_name: format!("{}.jpg", label),
    }
}

/// G1: Before=[A("Front"), B("Side")], After=[C("Front-done"), 空] → ID 1, 2, 3
async fn seeded_store(dir: &std::path::Path) -> JsonStoreGateway {
    let gateway = JsonStoreGateway::new(dir);
    let request = SaveRequest {
        uploads: vec![
            seed_item(Category::Before, 0, "Front"),
            seed_item(Category::Before, 1, "Side"),
            seed_item(Category::After, 0, "Front-done"),
        ],
        ..Default::default()
    };
    gateway.apply(REPORT, &request).await.expect("初期データ作成失敗");
    gateway
}

fn find(records: &[PersistedPhoto], id: u64) -> &PersistedPhoto {
    records
        .iter()
        .find(|r| r.uploaded_photo_id == id)
        .expect("記録が見つからない")
}

/// ドラッグで空き枠へ移動 → 保存で更新1件
#[tokio::test]
async fn test_cross_list_move_is_saved_as_update() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gateway = seeded_store(dir.path()).await;
    let mut session = EditSession::open_from(&gateway, &project()).await.expect("セッション作成失敗");

    let event = DragEvent::new(
        SlotRef::new(GROUP, Category::Before, 0),
        SlotRef::new(GROUP, Category::After, 1),
    );
    session.drag(&event).expect("移動失敗");

    let plan = session.plan();
    assert!(plan.deletes.is_empty());
    assert!(plan.uploads.is_empty());
    assert_eq!(plan.updates.len(), 1);

    let outcome = session.save(&gateway, TIMEOUT).await.expect("保存失敗");
    let SaveOutcome::Saved(receipt) = outcome else {
        panic!("保存されていない");
    };
    assert_eq!(receipt.updated, 1);

    let records = gateway.fetch(REPORT).await.expect("取得失敗");
    let moved = find(&records, 1);
    assert_eq!(moved.before_after_type, Category::After);
    assert_eq!(moved.order, 1);
    assert_eq!(moved.label.as_deref(), Some("Front"));

    // 読み直し後は差分なし
    assert!(!session.is_stale());
    assert!(session.plan().is_empty());
}

/// 同じラベルのファイル選択 → [Delete, Upload] の順で保存
#[tokio::test]
async fn test_replacement_is_saved_as_delete_then_upload() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gateway = seeded_store(dir.path()).await;
    let mut session = EditSession::open_from(&gateway, &project()).await.expect("セッション作成失敗");

    let outcome = session
        .add_file(SlotRef::new(GROUP, Category::Before, 0), "f.jpg", b"new front".to_vec(), None)
        .expect("追加失敗");
    assert_eq!(
        outcome,
        UploadOutcome::Replaced {
            replaced_id: 1,
            position: 0
        }
    );

    let request = session.plan().to_request();
    assert_eq!(request.deletes, vec![1]);
    assert_eq!(request.uploads.len(), 1);
    assert_eq!(request.uploads[0].file_name, "f.jpg");
    assert_eq!(request.uploads[0].label.as_deref(), Some("Front"));
    assert_eq!(request.uploads[0].order, 0);
    assert!(request.updates.is_empty());

    session.save(&gateway, TIMEOUT).await.expect("保存失敗");

    let records = gateway.fetch(REPORT).await.expect("取得失敗");
    assert!(records.iter().all(|r| r.uploaded_photo_id != 1));
    let new_front = find(&records, 4);
    assert_eq!(new_front.label.as_deref(), Some("Front"));
    assert_eq!(gateway.read_blob(REPORT, 4).expect("ファイル取得失敗"), b"new front".to_vec());

    let slot = session.state().slot(SlotRef::new(GROUP, Category::Before, 0)).expect("枠なし");
    assert_eq!(slot.identity, SlotIdentity::Persisted { id: 4 });
    assert!(session.state().deletions().is_empty());
    assert!(session.state().replacements().is_empty());
}

/// ラベルが入れ替わる移動もまとめて適用される
#[tokio::test]
async fn test_label_swap_between_lists() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gateway = JsonStoreGateway::new(dir.path());
    let request = SaveRequest {
        uploads: vec![seed_item(Category::Before, 0, "Front"), seed_item(Category::After, 0, "Front")],
        ..Default::default()
    };
    gateway.apply(REPORT, &request).await.expect("初期データ作成失敗");

    let mut session = EditSession::open_from(&gateway, &project()).await.expect("セッション作成失敗");
    let event = DragEvent::new(
        SlotRef::new(GROUP, Category::Before, 0),
        SlotRef::new(GROUP, Category::After, 0),
    );
    session.drag(&event).expect("移動失敗");
    assert_eq!(session.plan().updates.len(), 2);

    session.save(&gateway, TIMEOUT).await.expect("保存失敗");
    let records = gateway.fetch(REPORT).await.expect("取得失敗");
    assert_eq!(find(&records, 1).before_after_type, Category::After);
    assert_eq!(find(&records, 2).before_after_type, Category::Before);
}

/// 変更がなければ保存先に送らない
#[tokio::test]
async fn test_nothing_to_save() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gateway = JsonStoreGateway::new(dir.path().join("store"));
    let mut session = EditSession::open_from(&gateway, &project()).await.expect("セッション作成失敗");

    let outcome = session.save(&gateway, TIMEOUT).await.expect("保存失敗");
    assert_eq!(outcome, SaveOutcome::NothingToSave);
    assert!(!gateway.store_path().exists());
    assert!(session.can_save());
}

/// 空き枠の既定ラベルが新規ファイルに付く
#[tokio::test]
async fn test_default_label_applies_to_new_upload() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gateway = JsonStoreGateway::new(dir.path());
    let mut session = EditSession::open_from(&gateway, &project()).await.expect("セッション作成失敗");

    session
        .add_file(SlotRef::new(20, Category::After, 0), "o.jpg", vec![1, 2, 3], None)
        .expect("追加失敗");
    session.save(&gateway, TIMEOUT).await.expect("保存失敗");

    let records = gateway.fetch(REPORT).await.expect("取得失敗");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label.as_deref(), Some("Overview"));
    assert_eq!(records[0].advanced_photo_id, 20);
}

// =============================================
// 保存失敗・再試行
// =============================================

/// 最初の保存だけ失敗する保存先
struct FlakyGateway {
    inner: JsonStoreGateway,
    fail_next: AtomicBool,
}

impl PersistenceGateway for FlakyGateway {
    async fn fetch(&self, report_id: u64) -> Result<Vec<PersistedPhoto>> {
        self.inner.fetch(report_id).await
    }

    async fn apply(&self, report_id: u64, request: &SaveRequest) -> Result<SaveReceipt> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SlotsError::Persistence("503 Service Unavailable".into()));
        }
        self.inner.apply(report_id, request).await
    }
}

/// 応答しない保存先
struct HangingGateway;

impl PersistenceGateway for HangingGateway {
    async fn fetch(&self, _report_id: u64) -> Result<Vec<PersistedPhoto>> {
        Ok(Vec::new())
    }

    async fn apply(&self, _report_id: u64, _request: &SaveRequest) -> Result<SaveReceipt> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(SlotsError::Persistence("unreachable".into()))
    }
}

#[tokio::test]
async fn test_failed_save_can_be_retried_without_redoing_edits() {
    let dir = tempdir().expect("Failed to create temp dir");
    let inner = seeded_store(dir.path()).await;
    let gateway = FlakyGateway {
        inner,
        fail_next: AtomicBool::new(true),
    };
    let mut session = EditSession::open_from(&gateway, &project()).await.expect("セッション作成失敗");

    session
        .add_file(SlotRef::new(GROUP, Category::Before, 1), "side.jpg", b"side v2".to_vec(), None)
        .expect("追加失敗");
    session.remove(SlotRef::new(GROUP, Category::After, 0)).expect("削除失敗");
    let plan = session.plan();

    let err = session.save(&gateway, TIMEOUT).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(session.can_save());
    assert_eq!(session.plan(), plan);
    // 保存先は変わっていない
    assert_eq!(gateway.fetch(REPORT).await.expect("取得失敗").len(), 3);

    session.save(&gateway, TIMEOUT).await.expect("再試行失敗");
    let records = gateway.fetch(REPORT).await.expect("取得失敗");
    let ids: Vec<u64> = records.iter().map(|r| r.uploaded_photo_id).collect();
    assert!(!ids.contains(&2));
    assert!(!ids.contains(&3));
    assert!(ids.contains(&4));
}

#[tokio::test]
async fn test_timeout_keeps_edits() {
    let mut session = EditSession::open(&project(), &[]).expect("セッション作成失敗");
    session
        .add_file(SlotRef::new(GROUP, Category::After, 0), "a.jpg", vec![7], Some("Done".into()))
        .expect("追加失敗");

    let err = session
        .save(&HangingGateway, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotsError::SaveTimeout(_)));
    assert!(session.can_save());
    assert_eq!(session.plan().uploads.len(), 1);
}
