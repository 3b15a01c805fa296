mod bootstrap;

use anyhow::{Context, Result};
use monitor_core::settings::{MonitorConfig, Settings};
use monitor_data::client::SessionClient;
use monitor_runtime::notifier::WebhookNotifier;
use monitor_runtime::orchestrator::{ClarificationMonitor, PollPolicy};
use monitor_runtime::source::BoardSource;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("clar-monitor v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&settings).await {
        tracing::error!("clar-monitor stopped: {e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run(settings: &Settings) -> Result<()> {
    let config_path = settings.config_path();
    let config = MonitorConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let timeout = config.request_timeout();
    let client = SessionClient::new(
        &config.base_url,
        &config.user_id,
        &config.password,
        timeout,
    )?;
    let source = BoardSource::from_client(client)?;
    let notifier = WebhookNotifier::new(&config.webhook_url, timeout)?;
    let policy = PollPolicy::from_config(&config);

    tracing::info!(
        url = %config.base_url,
        interval = ?policy.interval,
        "starting clarification monitoring"
    );

    let mut monitor = ClarificationMonitor::new(source, notifier, policy);

    tokio::select! {
        result = monitor.run() => {
            result.context("monitor failed to start")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }

    Ok(())
}
