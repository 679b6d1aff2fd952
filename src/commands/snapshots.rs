//! Backup, list, restore and watch commands

use std::sync::Arc;

use colored::Colorize;
use prettytable::{format, Table};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::commands::build_manager;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{BackupScheduler, SnapshotMeta, SyncManager, SyncStage, SyncStatus};

/// Prints status updates until the manager is dropped.
fn spawn_status_printer(mut rx: watch::Receiver<SyncStatus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            print_status(&status);
        }
    })
}

fn print_status(status: &SyncStatus) {
    if status.message.is_empty() {
        return;
    }
    if status.is_error {
        println!("{} {}", "✗".red(), status.message.red());
    } else if status.stage == SyncStage::Idle {
        println!("{} {}", "✓".green(), status.message.green());
    } else {
        println!("{} {}", "…".cyan(), status.message);
    }
}

/// Runs `f` against a fresh session, printing its status unless `quiet`.
async fn with_session<T, F, Fut>(config: &Config, quiet: bool, f: F) -> Result<T>
where
    F: FnOnce(Arc<SyncManager>) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let manager = Arc::new(build_manager(config, CancellationToken::new())?);
    let printer = (!quiet).then(|| spawn_status_printer(manager.status()));
    let result = f(Arc::clone(&manager)).await;
    drop(manager);
    // The printer ends once the last sender is gone.
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    result
}

/// Writes one snapshot now.
pub async fn backup(config: &Config) -> Result<()> {
    tracing::info!("Starting manual backup");
    let outcome =
        with_session(config, false, |manager| async move { manager.backup_now().await }).await?;
    if !outcome.prune.failed.is_empty() {
        println!(
            "{}",
            format!(
                "{} old backup(s) could not be removed and will be retried next time",
                outcome.prune.failed.len()
            )
            .yellow()
        );
    }
    Ok(())
}

/// Lists snapshots, newest first.
pub async fn list(config: &Config, json: bool) -> Result<()> {
    let snapshots =
        with_session(config, json, |manager| async move { manager.list_snapshots().await }).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("{}", "No backups found.".yellow());
        return Ok(());
    }

    print_snapshot_table(&snapshots, &config.backup.folder_name);
    println!(
        "Use {} to restore one.",
        "chatvault restore --snapshot <ID|NAME>".cyan()
    );
    println!();
    Ok(())
}

fn print_snapshot_table(snapshots: &[SnapshotMeta], folder: &str) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "#".bold(),
        "Name".bold(),
        "ID".bold(),
        "Created".bold()
    ]);

    for (index, snapshot) in snapshots.iter().enumerate() {
        let created = snapshot
            .created_time
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let label = if index == 0 {
            format!("{} (latest)", index + 1)
        } else {
            (index + 1).to_string()
        };
        table.add_row(prettytable::row![label, snapshot.name, snapshot.id.cyan(), created]);
    }

    println!("\nBackups in \"{}\":", folder);
    table.printstd();
    println!();
}

/// Restores the newest snapshot, or the one named by `snapshot`.
pub async fn restore(config: &Config, snapshot: Option<String>) -> Result<()> {
    tracing::info!("Starting restore into {}", config.chats.path.display());
    with_session(config, false, |manager| async move {
        match snapshot.as_deref() {
            Some(wanted) => manager.restore_named(wanted).await,
            None => manager.restore_latest().await,
        }
    })
    .await?;
    Ok(())
}

/// Runs the scheduler until Ctrl-C.
pub async fn watch(config: &Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let manager = Arc::new(build_manager(config, cancel.child_token())?);
    let printer = spawn_status_printer(manager.status());

    let scheduler =
        BackupScheduler::from_config(Arc::clone(&manager), &config.backup).spawn(cancel.clone());
    println!(
        "{}",
        format!(
            "Watching: backup every {}h, keeping {} (Ctrl-C to stop)",
            config.backup.frequency_hours, config.backup.keep_backups
        )
        .cyan()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, stopping scheduler");
    cancel.cancel();
    if let Err(e) = scheduler.await {
        tracing::warn!("Scheduler task ended abnormally: {}", e);
    }

    drop(manager);
    let _ = printer.await;
    Ok(())
}
