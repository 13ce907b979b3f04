pub mod cli;
pub mod config;
pub mod term;
mod upload;

use {
    anyhow::{Context as _, Result},
    cli::{Cli, Command},
    config::Config,
    ownproof_protocol::Seed,
    ownproof_sdk::pow::{prove_file, tag_reader},
    std::{path::PathBuf, process::ExitCode, sync::Mutex},
    term::TermLayer,
    tokio::task::block_in_place,
    tracing::info,
    tracing_subscriber::{
        EnvFilter, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
    },
};

/// Runs a command. `config` must be present for commands that talk to the
/// server.
pub async fn run(cli: Cli, config: Option<Config>) -> Result<ExitCode> {
    match cli.command {
        Command::Upload { path } => {
            let config = config.context("upload requires a config")?;
            upload::upload(&config, &path).await
        }
        Command::Tag { path } => {
            let tag = block_in_place(|| tag_reader(fs_err::File::open(&path)?))?;
            info!("{tag}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Prove {
            path,
            seed,
            block_size,
        } => {
            let seed = Seed::from(seed);
            let proof = block_in_place(|| -> Result<_> {
                let content = fs_err::read(&path)?;
                Ok(prove_file(&content, &seed, block_size)?)
            })?;
            info!("{proof}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

pub fn setup_logger(log_file: Option<PathBuf>, log_filter: String) -> Result<()> {
    let file_layer = log_file
        .map(|path| -> Result<_> {
            let file = fs_err::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Ok(tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)))
        })
        .transpose()?;
    tracing_subscriber::registry()
        .with(file_layer)
        .with(EnvFilter::try_new(log_filter)?)
        .with(TermLayer)
        .init();
    Ok(())
}
