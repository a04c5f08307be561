//! 編集セッション
//!
//! 1レポート分の写真枠の編集状態と、保存の流れを管理する。
//!
//! - 編集操作は同期的に状態を書き換える
//! - 保存は1件ずつ。保存中は編集・保存とも受け付けない
//! - 保存失敗時は未保存ファイル・置換・削除をすべて保持し、そのまま再試行できる
//! - 保存成功後は保存先から正規の状態を読み直す

use crate::error::{Result, SlotsError};
use crate::gateway::{PersistenceGateway, SaveReceipt};
use crate::project::ProjectConfig;
use photo_slots_common::{
    reconcile, try_add_upload, try_drag, try_relabel, try_remove, Baseline, Blob, DragEvent, GroupDef,
    ListsState, PendingUpload, PersistedPhoto, SavePlan, SaveRequest, SlotIdentity, SlotRef, UploadOutcome,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    report_id: u64,
    definitions: Vec<GroupDef>,
    state: ListsState,
    baseline: Baseline,
    /// 保存は適用済みだが正規の状態をまだ読み直していない
    #[serde(default)]
    stale: bool,
    #[serde(skip)]
    save_in_flight: bool,
}

/// 保存中の1回分の要求
#[derive(Debug)]
pub struct SaveTicket {
    plan: SavePlan,
    request: SaveRequest,
}

impl SaveTicket {
    pub fn plan(&self) -> &SavePlan {
        &self.plan
    }

    pub fn request(&self) -> &SaveRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 変更なし（保存先には送らない）
    NothingToSave,
    Saved(SaveReceipt),
}

impl EditSession {
    /// プロジェクト設定と保存済み写真からセッションを作成
    pub fn open(project: &ProjectConfig, records: &[PersistedPhoto]) -> Result<Self> {
        let state = ListsState::load(&project.groups, records)?;
        Ok(Self {
            report_id: project.report_id,
            definitions: project.groups.clone(),
            state,
            baseline: Baseline::from_records(records),
            stale: false,
            save_in_flight: false,
        })
    }

    pub async fn open_from<G: PersistenceGateway>(gateway: &G, project: &ProjectConfig) -> Result<Self> {
        let records = gateway.fetch(project.report_id).await?;
        Self::open(project, &records)
    }

    /// セッションファイルから読み込み
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SlotsError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn report_id(&self) -> u64 {
        self.report_id
    }

    pub fn state(&self) -> &ListsState {
        &self.state
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_saving(&self) -> bool {
        self.save_in_flight
    }

    /// 保存ボタンを押せる状態か
    pub fn can_save(&self) -> bool {
        !self.save_in_flight && !self.stale
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.save_in_flight {
            return Err(SlotsError::SaveInProgress);
        }
        if self.stale {
            return Err(SlotsError::StaleSession);
        }
        Ok(())
    }

    // ── 編集操作 ─────────────────────────────────────────

    pub fn drag(&mut self, event: &DragEvent) -> Result<()> {
        self.ensure_editable()?;
        try_drag(&mut self.state, event)?;
        Ok(())
    }

    /// ファイルを選択して枠に置く（同じラベルの保存済み写真は置換）
    pub fn add_file(
        &mut self,
        target: SlotRef,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        label: Option<String>,
    ) -> Result<UploadOutcome> {
        self.ensure_editable()?;
        let upload = PendingUpload::new(target, file_name, Blob::new(bytes), label);
        Ok(try_add_upload(&mut self.state, upload)?)
    }

    pub fn remove(&mut self, at: SlotRef) -> Result<SlotIdentity> {
        self.ensure_editable()?;
        Ok(try_remove(&mut self.state, at)?)
    }

    pub fn relabel(&mut self, at: SlotRef, label: Option<String>) -> Result<()> {
        self.ensure_editable()?;
        try_relabel(&mut self.state, at, label)?;
        Ok(())
    }

    /// 現在の保存命令
    pub fn plan(&self) -> SavePlan {
        reconcile(&self.state, &self.baseline)
    }

    // ── 保存 ─────────────────────────────────────────────

    /// 保存を開始（以降 finish_save まで編集・保存は不可）
    pub fn begin_save(&mut self) -> Result<SaveTicket> {
        self.ensure_editable()?;
        let plan = self.plan();
        let request = plan.to_request();
        self.save_in_flight = true;
        info!(report_id = self.report_id, instructions = plan.len(), "save started");
        Ok(SaveTicket { plan, request })
    }

    /// 保存先の応答を反映
    ///
    /// 成功: 置換・削除を破棄し、正規の状態を読み直すまで stale にする。
    /// 失敗: 編集内容はすべて保持する。
    pub fn finish_save(&mut self, ticket: SaveTicket, outcome: Result<SaveReceipt>) -> Result<SaveReceipt> {
        self.save_in_flight = false;
        match outcome {
            Ok(receipt) => {
                self.state.clear_committed();
                self.stale = true;
                info!(
                    report_id = self.report_id,
                    created = receipt.created.len(),
                    updated = receipt.updated,
                    deleted = receipt.deleted,
                    "save acknowledged"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(
                    report_id = self.report_id,
                    instructions = ticket.plan.len(),
                    %err,
                    "save failed, edits kept for retry"
                );
                Err(err)
            }
        }
    }

    /// 保存先の正規の状態で置き換える（未保存の編集は破棄）
    pub fn reload(&mut self, records: &[PersistedPhoto]) -> Result<()> {
        self.state = ListsState::load(&self.definitions, records)?;
        self.baseline = Baseline::from_records(records);
        self.stale = false;
        Ok(())
    }

    pub async fn refresh<G: PersistenceGateway>(&mut self, gateway: &G) -> Result<()> {
        if self.save_in_flight {
            return Err(SlotsError::SaveInProgress);
        }
        let records = gateway.fetch(self.report_id).await?;
        self.reload(&records)
    }

    /// 保存して正規の状態を読み直す
    ///
    /// タイムアウトは失敗として扱い、編集内容を保持する。
    pub async fn save<G: PersistenceGateway>(&mut self, gateway: &G, timeout: Duration) -> Result<SaveOutcome> {
        let ticket = self.begin_save()?;
        if ticket.request.is_empty() {
            self.save_in_flight = false;
            return Ok(SaveOutcome::NothingToSave);
        }

        let applied = match tokio::time::timeout(timeout, gateway.apply(self.report_id, &ticket.request)).await {
            Ok(result) => result,
            Err(_) => Err(SlotsError::SaveTimeout(timeout.as_secs())),
        };
        let receipt = self.finish_save(ticket, applied)?;

        self.refresh(gateway).await?;
        Ok(SaveOutcome::Saved(receipt))
    }
}
