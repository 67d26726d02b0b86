pub mod checkin;
pub mod config;
pub mod log_store;
pub mod models;
pub mod runner;
pub mod scheduling;
pub mod settings;
pub mod stats;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use log::info;

use checkin::CheckinService;
use config::AppConfig;
use log_store::LogStore;
use scheduling::ChannelEmitter;
use settings::SettingsStore;

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Focus check-in starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(run_headless(AppConfig::from_env()))
}

async fn run_headless(config: AppConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("failed to create data directory {}", config.data_dir.display())
    })?;

    let settings = Arc::new(SettingsStore::new(config.settings_path())?);
    let log_store = LogStore::new(config.logs_dir());
    let (emitter, signals) = ChannelEmitter::new();

    let service = CheckinService::new(settings, log_store, Arc::new(emitter))
        .with_watch_interval(config.watch_interval());

    let window = service.notification_window();
    info!(
        "Data in {}; notifications allowed {:02}:00-{:02}:00",
        config.data_dir.display(),
        window.start_hour(),
        window.end_hour()
    );

    service.start().await?;
    let result = runner::run_prompt_loop(&service, signals).await;
    service.shutdown().await;
    result
}
