//! `clickmon watch`: run one monitor in the foreground.

use std::sync::Arc;

use clickmon_clickup::ClickUpClient;
use clickmon_config::AppConfig;
use clickmon_core::task::TaskId;
use clickmon_monitor::{AnswerGenerator, CommentMonitor, CycleReport};
use tokio::sync::watch;
use tracing::info;

pub async fn run(task_id: String, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if !config.has_clickup_token() {
        return Err("No ClickUp token configured (set CLICKUP_API_TOKEN)".into());
    }

    let service = Arc::new(ClickUpClient::from_config(&config.clickup));
    let providers = clickmon_providers::router::build_from_config(&config);
    let provider = providers
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", config.default_provider))?;
    let model = clickmon_providers::router::default_model(&config);
    let answers = Arc::new(AnswerGenerator::from_config(provider, model, &config));

    let mut monitor = CommentMonitor::new(
        TaskId::new(task_id),
        service,
        answers,
        (&config.monitor).into(),
    );

    if once {
        let report = monitor.poll_once().await?;
        print_report(&report);
        return Ok(());
    }

    println!(
        "Watching task {} every {}s for '{}' (Ctrl-C to stop)",
        monitor.task_id(),
        config.monitor.poll_interval_secs,
        config.monitor.marker
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping monitor");
            let _ = shutdown_tx.send(true);
        }
    });

    monitor.run(shutdown_rx).await;
    println!(
        "Stopped after {} cycles, {} comments answered",
        monitor.cycles(),
        monitor.processed().len()
    );
    Ok(())
}

fn print_report(report: &CycleReport) {
    if !report.task_found {
        println!("Task not found or temporarily unavailable");
        return;
    }
    println!("Comments seen:       {}", report.comments_seen);
    println!("Answered:            {}", report.answered);
    println!("  of which fallback: {}", report.fallbacks);
    println!("Post failures:       {}", report.post_failures);
    println!("Already processed:   {}", report.skipped_processed);
    println!("Not addressed:       {}", report.skipped_unaddressed);
}
