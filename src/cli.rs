use clap::{Parser, Subcommand};
use photo_slots_common::{Category, GroupId, SlotRef};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-slots")]
#[command(about = "ビフォー/アフター写真枠の編集・保存ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 保存済みの状態から編集セッションを作成
    Open {
        /// プロジェクト設定JSON（写真枠定義）
        #[arg(required = true)]
        project: PathBuf,

        /// 出力するセッションファイル
        #[arg(short, long, default_value = "session.json")]
        output: PathBuf,

        /// 保存先ディレクトリ（省略時は設定値）
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// セッションの写真枠を表示
    Show {
        #[arg(required = true)]
        session: PathBuf,
    },

    /// 写真をドラッグ（並べ替え・ビフォー⇔アフター移動）
    Move {
        #[arg(required = true)]
        session: PathBuf,

        /// 写真グループID
        #[arg(short, long)]
        group: GroupId,

        /// 移動元 (before:0 / after:1)
        #[arg(long)]
        from: SlotArg,

        /// 移動先 (before:0 / after:1)
        #[arg(long)]
        to: SlotArg,
    },

    /// ファイルを選択して枠に置く（同じラベルの写真は置換）
    Add {
        #[arg(required = true)]
        session: PathBuf,

        /// 写真グループID
        #[arg(short, long)]
        group: GroupId,

        /// 対象の枠 (before:0 / after:1)
        #[arg(long)]
        slot: SlotArg,

        /// 画像ファイル
        #[arg(short, long)]
        file: PathBuf,

        /// ラベル（省略時は枠のラベル）
        #[arg(short, long)]
        label: Option<String>,
    },

    /// 枠を空にする
    Remove {
        #[arg(required = true)]
        session: PathBuf,

        /// 写真グループID
        #[arg(short, long)]
        group: GroupId,

        /// 対象の枠 (before:0 / after:1)
        #[arg(long)]
        slot: SlotArg,
    },

    /// 枠のラベルを変更
    Label {
        #[arg(required = true)]
        session: PathBuf,

        /// 写真グループID
        #[arg(short, long)]
        group: GroupId,

        /// 対象の枠 (before:0 / after:1)
        #[arg(long)]
        slot: SlotArg,

        /// 新しいラベル（省略時は消去）
        #[arg(short, long)]
        label: Option<String>,
    },

    /// 保存命令を表示（保存はしない）
    Plan {
        #[arg(required = true)]
        session: PathBuf,

        /// 保存APIの形式(JSON)で出力
        #[arg(long)]
        json: bool,
    },

    /// 保存して正規の状態を読み直す
    Save {
        #[arg(required = true)]
        session: PathBuf,

        /// 保存先ディレクトリ（省略時は設定値）
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 保存先ディレクトリを設定
        #[arg(long)]
        set_store: Option<PathBuf>,

        /// 保存タイムアウト（秒）を設定
        #[arg(long)]
        set_timeout: Option<u64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 枠の指定 `区分:位置`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotArg {
    pub category: Category,
    pub position: usize,
}

impl SlotArg {
    pub fn in_group(&self, group_id: GroupId) -> SlotRef {
        SlotRef::new(group_id, self.category, self.position)
    }
}

impl std::str::FromStr for SlotArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, position) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid slot: {}. Use before:0 or after:1", s))?;
        let category = category.trim().parse::<Category>()?;
        let position = position
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid position: {}", position))?;
        Ok(SlotArg { category, position })
    }
}

impl std::fmt::Display for SlotArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.position)
    }
}
