use std::sync::Arc;

use clap::Subcommand;
use salonbook_core::platform::{AlwaysOnPower, NoPendingDispatch};
use salonbook_core::{AdaptiveScheduler, Event, SyncOrchestrator};

use crate::common::{self, CliError};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Run one dispatch pass now
    Run,
    /// Run the adaptive scheduler in the foreground until Ctrl-C
    Start,
    /// Show scheduler state and the last pass outcome
    Status,
    /// Show recent dispatch passes
    History {
        /// Number of passes to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print passes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-enable automatic dispatch
    Enable,
    /// Disable automatic dispatch
    Disable,
}

pub async fn run(action: SyncAction) -> Result<(), CliError> {
    match action {
        SyncAction::Run => run_once().await,
        SyncAction::Start => run_scheduler().await,
        SyncAction::Status => show_status(),
        SyncAction::History { limit, json } => show_history(limit, json),
        SyncAction::Enable => set_enabled(true),
        SyncAction::Disable => set_enabled(false),
    }
}

async fn run_once() -> Result<(), CliError> {
    let config = common::load_config();
    let db = common::open_db()?;
    let orchestrator =
        SyncOrchestrator::new(common::api(&config)?, common::gateway(&config), db.clone());

    let result = orchestrator
        .run_pass()
        .await
        .map_err(|e| format!("sync failed: {e}"))?;

    let summary = result.summary();
    db.lock().unwrap().set_last_status(&summary)?;
    println!("{summary}");
    for item in result.results.iter().filter(|r| !r.success) {
        println!(
            "  {} failed: {}",
            item.appointment_id,
            item.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn run_scheduler() -> Result<(), CliError> {
    let config = common::load_config();
    let db = common::open_db()?;
    let orchestrator = Arc::new(SyncOrchestrator::new(
        common::api(&config)?,
        common::gateway(&config),
        db.clone(),
    ));

    // Explicit user intent: starting from the CLI re-enables auto-sync.
    db.lock().unwrap().set_auto_sync_enabled(true)?;

    let (scheduler, mut events) = AdaptiveScheduler::new(
        orchestrator,
        db,
        Arc::new(AlwaysOnPower),
        Arc::new(NoPendingDispatch),
        config.quiet_window()?,
    );

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Event::SchedulerStarted { .. } => println!("scheduler started"),
                Event::SchedulerStopped { .. } => println!("scheduler stopped"),
                Event::CycleSkipped {
                    reason,
                    resume_in_minutes,
                    ..
                } => println!("skipped: {reason} (next check in {resume_in_minutes} min)"),
                Event::PassStarted { .. } => println!("pass started"),
                Event::PassCompleted { status, .. } => println!("{status}"),
                Event::PassFailed { error, .. } => println!("pass failed: {error}"),
                Event::CatchUpTriggered { .. } => println!("catch-up pass"),
            }
        }
    });

    scheduler.start();
    tokio::signal::ctrl_c().await?;
    scheduler.stop();
    // Dropping our handle lets the event stream close once the loop
    // exits, so the printer ends after the stopped event.
    drop(scheduler);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), printer).await;
    Ok(())
}

fn show_status() -> Result<(), CliError> {
    let db = common::open_db()?;
    let db = db.lock().unwrap();

    let enabled = db.auto_sync_enabled()?;
    println!("auto-sync:        {}", if enabled { "enabled" } else { "disabled" });
    println!("interval:         {} min", db.sync_interval_minutes()?);
    match db.last_sync_at()? {
        Some(at) => println!("last sync:        {}", at.to_rfc3339()),
        None => println!("last sync:        never"),
    }
    match db.last_reminder_found_at()? {
        Some(at) => println!("last reminder:    {}", at.to_rfc3339()),
        None => println!("last reminder:    never"),
    }
    if let Some(status) = db.last_status()? {
        println!("last status:      {status}");
    }
    Ok(())
}

fn show_history(limit: usize, json: bool) -> Result<(), CliError> {
    let db = common::open_db()?;
    let passes = db.lock().unwrap().recent_passes(limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&passes)?);
        return Ok(());
    }
    if passes.is_empty() {
        println!("no dispatch passes recorded");
        return Ok(());
    }
    for pass in passes {
        println!(
            "{}  total {}  sent {}  failed {}",
            pass.finished_at.to_rfc3339(),
            pass.total,
            pass.sent,
            pass.failed
        );
    }
    Ok(())
}

fn set_enabled(enabled: bool) -> Result<(), CliError> {
    let db = common::open_db()?;
    db.lock().unwrap().set_auto_sync_enabled(enabled)?;
    println!(
        "auto-sync {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
