use {
    anyhow::{Result, anyhow},
    clap::{Parser, Subcommand},
    ownproof_sdk::pow::BlockSize,
    std::path::PathBuf,
};

/// Stores files on a deduplicating server, proving possession of content
/// the server already has instead of uploading it again.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// Config file. Defaults to `ownproof.json5` in the user config directory.
    #[clap(long)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Upload a file, or prove ownership if the server already stores it.
    Upload { path: PathBuf },
    /// Print the content tag of a file.
    Tag { path: PathBuf },
    /// Print the ownership proof of a file for a given seed.
    Prove {
        path: PathBuf,
        #[arg(long)]
        seed: String,
        #[arg(long, value_parser = parse_block_size, default_value = "4096")]
        block_size: BlockSize,
    },
}

impl Command {
    /// Offline commands run without a config file.
    #[must_use]
    pub fn needs_config(&self) -> bool {
        matches!(self, Self::Upload { .. })
    }
}

fn parse_block_size(value: &str) -> Result<BlockSize> {
    BlockSize::new(value.parse()?).ok_or_else(|| anyhow!("block size cannot be zero"))
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("cannot find config dir"))?;
    Ok(config_dir.join("ownproof.json5"))
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, reason = "test")]

    use super::*;

    #[test]
    fn commands() {
        let cli = Cli::try_parse_from(["ownproof", "upload", "a.bin"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(
            cli.command,
            Command::Upload {
                path: "a.bin".into()
            }
        );
        assert!(cli.command.needs_config());

        let cli =
            Cli::try_parse_from(["ownproof", "--config", "c.json5", "prove", "a.bin", "--seed", "s1"])
                .unwrap();
        assert_eq!(cli.config, Some("c.json5".into()));
        assert_eq!(
            cli.command,
            Command::Prove {
                path: "a.bin".into(),
                seed: "s1".into(),
                block_size: BlockSize::default(),
            }
        );
        assert!(!cli.command.needs_config());
    }

    #[test]
    fn invalid_commands() {
        assert!(Cli::try_parse_from(["ownproof", "prove", "a.bin"]).is_err());
        assert!(
            Cli::try_parse_from(["ownproof", "prove", "a.bin", "--seed", "s", "--block-size", "0"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["ownproof", "upload"]).is_err());
    }
}
