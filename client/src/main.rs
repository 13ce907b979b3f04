use {
    anyhow::Result,
    clap::Parser,
    ownproof::{
        cli::{Cli, default_config_path},
        config::{Config, default_log_filter},
        run, setup_logger,
    },
    std::process::ExitCode,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = if cli.command.needs_config() {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        Some(Config::load(&path)?)
    } else {
        None
    };
    let (log_file, log_filter) = match &config {
        Some(config) => (config.log_file.clone(), config.log_filter.clone()),
        None => (None, default_log_filter()),
    };
    setup_logger(log_file, log_filter)?;
    run(cli, config).await
}
