use anyhow::{Context, Result};
use clap::Parser;
use photo_slots::cli::{Cli, Commands};
use photo_slots::config::Config;
use photo_slots::gateway::JsonStoreGateway;
use photo_slots::project::ProjectConfig;
use photo_slots::session::{EditSession, SaveOutcome};
use photo_slots_common::{DragEvent, ListsState, SavePlan, SlotIdentity, UploadOutcome};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn store_gateway(config: &Config, store: Option<PathBuf>) -> Result<JsonStoreGateway> {
    let dir = match store {
        Some(dir) => dir,
        None => config.store_dir()?,
    };
    Ok(JsonStoreGateway::new(dir))
}

fn load_session(path: &Path) -> Result<EditSession> {
    EditSession::load_file(path).with_context(|| format!("read session {}", path.display()))
}

fn print_state(state: &ListsState) {
    for group in state.groups() {
        println!(
            "グループ {} (枠数 {}{})",
            group.id(),
            group.max_slots_per_list(),
            if group.supports_before_after() { ", ビフォー/アフター" } else { "" }
        );
        for list in group.lists() {
            let cells: Vec<String> = list.iter().map(|slot| format!("[{}] {}", slot.position, slot)).collect();
            println!("  {:<6} {}", list.category(), cells.join("  "));
        }
    }
    let deletions = state.deletions();
    if !deletions.is_empty() {
        let ids: Vec<String> = deletions.iter().map(|id| format!("#{}", id)).collect();
        println!("削除予定: {}", ids.join(", "));
    }
}

fn print_plan(plan: &SavePlan) {
    if plan.is_empty() {
        println!("変更はありません");
        return;
    }
    for d in &plan.deletes {
        println!("  削除     #{}", d.id);
    }
    for u in &plan.uploads {
        let replaces = u.replaces.map(|id| format!(" (#{}を置換)", id)).unwrap_or_default();
        println!(
            "  追加     {} → グループ{} {}:{} {:?}{}",
            u.file_name, u.group_id, u.category, u.order, u.label, replaces
        );
    }
    for u in &plan.updates {
        println!(
            "  更新     #{} → グループ{} {}:{} {:?}",
            u.id, u.group_id, u.category, u.order, u.label
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Open { project, output, store } => {
            let project = ProjectConfig::from_file(&project)?;
            let gateway = store_gateway(&config, store)?;
            let session = EditSession::open_from(&gateway, &project).await?;
            session.save_file(&output)?;

            print_state(session.state());
            println!("\n✔ セッションを作成: {}", output.display());
        }

        Commands::Show { session } => {
            let session = load_session(&session)?;
            print_state(session.state());
            if session.is_stale() {
                println!("\n⚠ 保存済みです。`photo-slots open` で読み直してください");
            }
        }

        Commands::Move { session: path, group, from, to } => {
            let mut session = load_session(&path)?;
            let event = DragEvent::new(from.in_group(group), to.in_group(group));
            session.drag(&event)?;
            session.save_file(&path)?;

            print_state(session.state());
            println!("\n✔ {} → {} に移動しました", from, to);
        }

        Commands::Add { session: path, group, slot, file, label } => {
            let mut session = load_session(&path)?;
            let bytes = std::fs::read(&file).with_context(|| format!("read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let outcome = session.add_file(slot.in_group(group), file_name.clone(), bytes, label)?;
            session.save_file(&path)?;

            match outcome {
                UploadOutcome::Placed { position } => {
                    println!("✔ {} を {}:{} に置きました", file_name, slot.category, position)
                }
                UploadOutcome::Replaced { replaced_id, position } => println!(
                    "✔ {} で #{} を置換します ({}:{})",
                    file_name, replaced_id, slot.category, position
                ),
            }
        }

        Commands::Remove { session: path, group, slot } => {
            let mut session = load_session(&path)?;
            let removed = session.remove(slot.in_group(group))?;
            session.save_file(&path)?;

            match removed {
                SlotIdentity::Persisted { id } => println!("✔ #{} を削除予定にしました", id),
                SlotIdentity::Pending { file_name, .. } => println!("✔ {} を取り消しました", file_name),
                SlotIdentity::Empty => println!("枠はすでに空です"),
            }
        }

        Commands::Label { session: path, group, slot, label } => {
            let mut session = load_session(&path)?;
            session.relabel(slot.in_group(group), label.clone())?;
            session.save_file(&path)?;

            match label {
                Some(label) => println!("✔ {} のラベルを「{}」にしました", slot, label),
                None => println!("✔ {} のラベルを消去しました", slot),
            }
        }

        Commands::Plan { session, json } => {
            let session = load_session(&session)?;
            let plan = session.plan();
            if json {
                println!("{}", serde_json::to_string_pretty(&plan.to_request())?);
            } else {
                println!("保存命令 (削除 → 追加 → 更新):");
                print_plan(&plan);
            }
        }

        Commands::Save { session: path, store } => {
            let mut session = load_session(&path)?;
            let gateway = store_gateway(&config, store)?;

            println!("保存中...");
            print_plan(&session.plan());
            let result = session.save(&gateway, config.save_timeout()).await;
            // 失敗時も編集内容を残したセッションを書き戻す
            session.save_file(&path)?;

            match result {
                Ok(SaveOutcome::NothingToSave) => println!("変更はありません"),
                Ok(SaveOutcome::Saved(receipt)) => {
                    println!(
                        "\n✅ 保存完了: 追加 {} / 更新 {} / 削除 {} ({})",
                        receipt.created.len(),
                        receipt.updated,
                        receipt.deleted,
                        receipt.saved_at.format("%Y-%m-%d %H:%M:%S")
                    );
                    print_state(session.state());
                }
                Err(err) if err.is_retryable() => {
                    println!("編集内容は保持しています。`photo-slots save` で再試行できます");
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        Commands::Config { set_store, set_timeout, show } => {
            let mut config = config;
            let changed = set_store.is_some() || set_timeout.is_some();

            if let Some(dir) = set_store {
                config.store_dir = Some(dir);
            }
            if let Some(seconds) = set_timeout {
                config.save_timeout_seconds = seconds;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  保存先: {}", config.store_dir()?.display());
                println!("  保存タイムアウト: {}秒", config.save_timeout().as_secs());
            }
        }
    }

    Ok(())
}
