use {
    anyhow::Result,
    clap::Parser,
    ownproof_server::{Config, default_config_dir},
    std::path::PathBuf,
    tracing_subscriber::EnvFilter,
};

/// Reference store for the proof-of-ownership deduplication protocol.
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    /// Path to the config file. Defaults to `ownproof-server.json5`
    /// in the system config directory.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_dir()?.join("ownproof-server.json5"),
    };
    let config: Config = json5::from_str(&fs_err::read_to_string(config_path)?)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();

    ownproof_server::run(config).await
}
