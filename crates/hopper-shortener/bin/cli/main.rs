mod cli;
mod output;

use crate::cli::{Command, LogFormat, StorageBackendArg, CLI, DEFAULT_CODEC_SALT};
use crate::output::{CreateLinkResponse, ReadLinkResponse, VisitLinkResponse, VisitStatsResponse};
use anyhow::Context;
use clap::Parser;
use hopper_core::{Codec, CodecSettings, ShortenParams, Shortener};
use hopper_shortener::ShortenerService;
use hopper_storage::{InMemoryStore, LinkStore, RedbStore, SqliteStore};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    let codec = Codec::new(
        CodecSettings::builder()
            .salt(config.salt.clone())
            .min_length(config.min_length)
            .build(),
    )
    .context("invalid codec settings")?;

    if config.salt == DEFAULT_CODEC_SALT {
        warn!("using the built-in codec salt, public ids are predictable");
    }

    info!(
        storage_backend = %config.storage,
        min_length = config.min_length,
        "starting hopper"
    );

    match config.storage {
        StorageBackendArg::InMemory => run(InMemoryStore::new(codec), &config).await,
        StorageBackendArg::Sqlite => {
            let sqlite_dsn = config
                .sqlite_dsn
                .as_deref()
                .context("sqlite dsn is required when storage backend is sqlite")?;
            let store = SqliteStore::connect(sqlite_dsn, codec)
                .await
                .context("cannot open sqlite link store")?;
            run(store, &config).await
        }
        StorageBackendArg::Redb => {
            let store = RedbStore::open(&config.redb_path, codec).with_context(|| {
                format!("cannot open redb link store at {}", config.redb_path.display())
            })?;
            run(store, &config).await
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run<S: LinkStore>(store: S, config: &CLI) -> anyhow::Result<()> {
    let service = ShortenerService::new(store);

    match &config.command {
        Command::Create { target, redirect } => {
            let params = ShortenParams::new(target.clone()).with_redirect(*redirect);
            let link = service.create(params).await?;
            print_json(&CreateLinkResponse::new(&link, &config.base_url))
        }
        Command::Read { id, per } => {
            let link = service.read(id).await?;
            print_json(&ReadLinkResponse::new(&link, &config.base_url, *per))
        }
        Command::Visit { id } => {
            let link = service.visit(id).await?;
            print_json(&VisitLinkResponse::from(&link))
        }
        Command::Stats { id, per } => {
            let visits = service.visits_per(id, *per).await?;
            print_json(&VisitStatsResponse {
                id: id.clone(),
                per: per.to_string(),
                visits,
            })
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
