mod cli;
mod commands;

use crate::cli::{LogFormat, CLI};
use crate::commands::Flow;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use warren_shortener::{ShortenerService, ShortenerSettings};
use warren_store::{Database, MemoryStore, TransactSettings};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    init_tracing(config.log_format);

    info!(
        namespace = %config.namespace,
        base_url = %config.base_url,
        max_retries = config.max_retries,
        log_format = %config.log_format,
        "starting warren"
    );

    let settings = ShortenerSettings::builder()
        .namespace(config.namespace)
        .reserved(config.reserved)
        .base_url(config.base_url)
        .build();
    let transact = TransactSettings::builder()
        .max_retries(config.max_retries)
        .build();
    let db = Database::with_settings(MemoryStore::new(), transact);
    let service = ShortenerService::open(db, settings).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Flow::Quit = commands::run(&service, &line, config.json).await? {
            break;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
