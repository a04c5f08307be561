//! ビフォー/アフター写真枠の編集セッションと保存
//!
//! 編集エンジン本体は `photo_slots_common`。
//! このクレートは保存先との境界、セッション管理、設定、CLIを持つ。

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod project;
pub mod session;
