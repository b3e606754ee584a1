use anyhow::Result;
use callgrade::{
    app::{self, AppStateBuilder},
    config::{Cli, Config},
    handler::middleware::request_log::AccessLogEventFormat,
    version,
};
use clap::Parser;
use std::path::Path;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.conf.as_deref() {
        Some(path) if Path::new(path).exists() => Config::load(path)?,
        Some(path) => {
            println!("Config file {} not found, using defaults", path);
            Config::default()
        }
        None => Config::default(),
    }
    .with_env();

    let mut log_fmt = tracing_subscriber::fmt();
    if let Some(ref level) = config.log_level {
        if let Ok(lv) = level.as_str().parse::<LevelFilter>() {
            log_fmt = log_fmt.with_max_level(lv);
        }
    }
    if config.log_file.is_some() {
        log_fmt = log_fmt.with_ansi(false);
    }
    let log_fmt = log_fmt.event_format(AccessLogEventFormat::<tracing_subscriber::fmt::time::SystemTime>::default());

    let _guard = if let Some(ref log_file) = config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        log_fmt
            .with_writer(non_blocking)
            .try_init()
            .ok();
        Some(guard)
    } else {
        log_fmt.try_init().ok();
        None
    };

    info!("callgrade {}", version::get_short_version());
    let token = CancellationToken::new();
    let state = AppStateBuilder::new()
        .with_config(config)
        .with_token(token.clone())
        .build()?;

    select! {
        result = app::run(state) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received CTRL+C, shutting down");
            token.cancel();
        }
    }
    Ok(())
}
